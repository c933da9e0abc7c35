use rayon::prelude::*;
use uuid::Uuid;

use crate::average::{self, AverageColor};
use crate::cancel::CancelToken;
use crate::composite::{ColorReference, KernelInputs, TileStatus, composite_tile};
use crate::error::{LayerRole, RenderError, Result};
use crate::geometry::Rect;
use crate::identity::{self, IdentityDecision, TopLayer};
use crate::image::{FloatImage, PixelFormat, PixelSource};
use crate::params::BlendParameters;
use crate::threading::RenderThreading;

// =============================================================================
// Render arguments and results
// =============================================================================

/// Everything the host hands over for one output frame.
pub struct RenderArgs<'a> {
    pub time: f64,
    /// Region of the output to produce.
    pub window: Rect,
    /// `None` when the host could not fetch the source image.
    pub base: Option<&'a dyn PixelSource>,
    pub top: TopLayer<'a>,
    pub params: BlendParameters,
    pub cancel: CancelToken,
}

impl<'a> RenderArgs<'a> {
    /// Arguments for a render of `window` with default parameters.
    pub fn new(time: f64, window: Rect, base: &'a dyn PixelSource, top: TopLayer<'a>) -> Self {
        Self {
            time,
            window,
            base: Some(base),
            top,
            params: BlendParameters::default(),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_params(mut self, params: BlendParameters) -> Self {
        self.params = params;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    Complete,
    /// The abort flag fired. The destination may be partially written and
    /// should be discarded.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderReport {
    pub status: RenderStatus,
    pub tiles_total: usize,
    pub tiles_completed: usize,
    /// The published average color, when the render used one.
    pub average: Option<AverageColor>,
}

impl RenderReport {
    fn cancelled_before_tiles() -> Self {
        Self {
            status: RenderStatus::Cancelled,
            tiles_total: 0,
            tiles_completed: 0,
            average: None,
        }
    }
}

/// Result of [`BlendEffect::process`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderOutcome {
    /// The destination was not touched; the host should use the base image at `time`.
    PassThrough { time: f64 },
    Rendered(RenderReport),
}

// =============================================================================
// BlendEffect
// =============================================================================

/// A blend instance bound to its worker pool.
pub struct BlendEffect {
    pool: rayon::ThreadPool,
    threading: RenderThreading,
}

impl BlendEffect {
    pub fn new(threading: RenderThreading) -> Result<Self> {
        let pool = threading.build_pool()?;
        tracing::debug!(
            threads = pool.current_num_threads(),
            tiling = ?threading.tiling,
            "blend effect created"
        );
        Ok(Self { pool, threading })
    }

    /// Identity pre-check on the validated parameters, so an out-of-range
    /// blend that clamps to zero passes through like an exact zero.
    pub fn is_identity(&self, args: &RenderArgs<'_>) -> Result<IdentityDecision> {
        let params = args.params.validated()?;
        Ok(identity::decide(args.time, &params, &args.top))
    }

    /// Identity check, then a full render when it is needed.
    pub fn process(&self, args: &RenderArgs<'_>, dst: &mut FloatImage) -> Result<RenderOutcome> {
        match self.is_identity(args)? {
            IdentityDecision::PassThrough { time } => Ok(RenderOutcome::PassThrough { time }),
            IdentityDecision::Render => self.render(args, dst).map(RenderOutcome::Rendered),
        }
    }

    /// Composite `args.window` into `dst`.
    ///
    /// Formats are validated before any pixel is read. When the average color
    /// is enabled it is reduced in full before the first tile starts.
    #[tracing::instrument(
        skip(self, args, dst),
        fields(render_id = %Uuid::new_v4(), time = args.time, window = %args.window)
    )]
    pub fn render(&self, args: &RenderArgs<'_>, dst: &mut FloatImage) -> Result<RenderReport> {
        let output = dst.format();
        if !output.is_rgba_f32() {
            return Err(RenderError::UnsupportedFormat(output));
        }
        let params = args.params.validated()?;

        let mut top = args.top.resolve(args.base);
        let mut base = args.base;
        if let Some(image) = top {
            check_format(LayerRole::TopLayer, output, image.format())?;
        }
        if let Some(image) = base {
            check_format(LayerRole::Base, output, image.format())?;
        }
        if params.swap_layers {
            std::mem::swap(&mut base, &mut top);
            tracing::debug!("layers swapped");
        }

        let reference = if params.use_average_color {
            let average = match top {
                Some(image) => self
                    .pool
                    .install(|| average::reduce(image, args.window, &args.cancel)),
                None => Some(AverageColor::ZERO),
            };
            match average {
                Some(avg) => ColorReference::Average(avg),
                None => {
                    tracing::debug!("cancelled during average color reduction");
                    return Ok(RenderReport::cancelled_before_tiles());
                }
            }
        } else {
            ColorReference::TopPixel
        };
        let average = match reference {
            ColorReference::Average(avg) => Some(avg),
            ColorReference::TopPixel => None,
        };

        let Some(window) = args.window.intersect(&dst.bounds()) else {
            tracing::debug!(bounds = %dst.bounds(), "render window outside destination");
            return Ok(RenderReport {
                status: RenderStatus::Complete,
                tiles_total: 0,
                tiles_completed: 0,
                average,
            });
        };

        let workers = self.pool.current_num_threads();
        let (tile_width, tile_height) = self.threading.tiling.tile_size(window, workers);
        let inputs = KernelInputs {
            base,
            top,
            params,
            reference,
        };

        let mut tiles = dst.tiles_mut(window, tile_width, tile_height);
        let tiles_total = tiles.len();
        tracing::debug!(tiles_total, tile_width, tile_height, workers, "dispatching tiles");

        let tiles_completed = self.pool.install(|| {
            tiles
                .par_iter_mut()
                .map(|tile| {
                    let status = composite_tile(&inputs, tile, &args.cancel);
                    tracing::trace!(tile = %tile.rect(), ?status, "tile finished");
                    status
                })
                .filter(|status| *status == TileStatus::Complete)
                .count()
        });

        let status = if tiles_completed == tiles_total {
            RenderStatus::Complete
        } else {
            tracing::debug!(tiles_completed, tiles_total, "render cancelled");
            RenderStatus::Cancelled
        };
        Ok(RenderReport {
            status,
            tiles_total,
            tiles_completed,
            average,
        })
    }
}

fn check_format(role: LayerRole, expected: PixelFormat, found: PixelFormat) -> Result<()> {
    if found != expected {
        return Err(RenderError::FormatMismatch {
            role,
            expected,
            found,
        });
    }
    Ok(())
}
