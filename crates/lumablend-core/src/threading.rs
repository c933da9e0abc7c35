use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};
use crate::geometry::Rect;

/// How a render window is cut into tiles for the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Tiling {
    /// Full-width row bands, a few per worker.
    Auto,
    /// Full-width bands of a fixed number of rows.
    Rows { rows_per_tile: u32 },
    /// Fixed-size rectangular tiles.
    Tiles { width: u32, height: u32 },
}

/// Bands handed to each worker under `Tiling::Auto`.
const AUTO_BANDS_PER_WORKER: u32 = 4;

impl Tiling {
    /// Tile width and height used for `window` on a pool of `workers` threads.
    pub fn tile_size(&self, window: Rect, workers: usize) -> (u32, u32) {
        let width = window.width().max(1);
        match *self {
            Self::Auto => {
                let bands = (workers.max(1) as u32).saturating_mul(AUTO_BANDS_PER_WORKER);
                (width, window.height().div_ceil(bands).max(1))
            }
            Self::Rows { rows_per_tile } => (width, rows_per_tile.max(1)),
            Self::Tiles { width, height } => (width.max(1), height.max(1)),
        }
    }
}

/// Threading policy for rendering. Deserializes from the host's JSON config;
/// omitted fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderThreading {
    /// Worker threads; `None` lets rayon pick one per core.
    pub threads: Option<usize>,
    pub tiling: Tiling,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            threads: None,
            tiling: Tiling::Auto,
        }
    }
}

impl RenderThreading {
    pub fn from_json(json: &str) -> Result<Self> {
        let threading: Self = serde_json::from_str(json)?;
        threading.validate()?;
        Ok(threading)
    }

    pub fn validate(&self) -> Result<()> {
        if self.threads == Some(0) {
            return Err(RenderError::invalid("threads", "must be >= 1 when set"));
        }
        match self.tiling {
            Tiling::Rows { rows_per_tile: 0 } => {
                Err(RenderError::invalid("rows_per_tile", "must be >= 1"))
            }
            Tiling::Tiles { width, height } if width == 0 || height == 0 => Err(
                RenderError::invalid("tiles", "width and height must be >= 1"),
            ),
            _ => Ok(()),
        }
    }

    pub fn build_pool(&self) -> Result<rayon::ThreadPool> {
        self.validate()?;
        let mut builder = rayon::ThreadPoolBuilder::new()
            .thread_name(|i| format!("lumablend-worker-{i}"));
        if let Some(n) = self.threads {
            builder = builder.num_threads(n);
        }
        Ok(builder.build()?)
    }
}
