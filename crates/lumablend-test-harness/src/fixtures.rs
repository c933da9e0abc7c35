use std::sync::Once;

use lumablend_core::geometry::Rect;
use lumablend_core::image::{FloatImage, PixelFormat, PixelSource};
use lumablend_core::pipeline::BlendEffect;
use lumablend_core::threading::{RenderThreading, Tiling};

/// Install a fmt subscriber writing through the test harness. Honors `RUST_LOG`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A blend effect on a small pool with the given tiling.
pub fn blend_effect(threads: usize, tiling: Tiling) -> BlendEffect {
    init_tracing();
    BlendEffect::new(RenderThreading {
        threads: Some(threads),
        tiling,
    })
    .expect("failed to build blend effect for test")
}

/// Opaque image whose red and green ramp across x and y, with a fixed blue.
pub fn gradient(bounds: Rect) -> FloatImage {
    let mut image = FloatImage::new(bounds);
    let (w, h) = (bounds.width().max(1) as f32, bounds.height().max(1) as f32);
    for y in bounds.y1..bounds.y2 {
        for x in bounds.x1..bounds.x2 {
            let r = (x - bounds.x1) as f32 / w;
            let g = (y - bounds.y1) as f32 / h;
            if let Some(px) = image.pixel_mut(x, y) {
                px.copy_from_slice(&[r, g, 0.25, 1.0]);
            }
        }
    }
    image
}

/// Two colors alternating in `cell`-sized squares.
pub fn checkerboard(bounds: Rect, a: [f32; 4], b: [f32; 4], cell: u32) -> FloatImage {
    let cell = cell.max(1) as i32;
    let mut image = FloatImage::new(bounds);
    for y in bounds.y1..bounds.y2 {
        for x in bounds.x1..bounds.x2 {
            let even = ((x - bounds.x1) / cell + (y - bounds.y1) / cell) % 2 == 0;
            if let Some(px) = image.pixel_mut(x, y) {
                px.copy_from_slice(if even { &a } else { &b });
            }
        }
    }
    image
}

/// Wraps an image and reports no data inside the given holes, like a host
/// buffer that only partially covers the frame.
pub struct SparseImage {
    inner: FloatImage,
    holes: Vec<Rect>,
}

impl SparseImage {
    pub fn new(inner: FloatImage) -> Self {
        Self {
            inner,
            holes: Vec::new(),
        }
    }

    pub fn with_hole(mut self, hole: Rect) -> Self {
        self.holes.push(hole);
        self
    }
}

impl PixelSource for SparseImage {
    fn bounds(&self) -> Rect {
        self.inner.bounds()
    }

    fn format(&self) -> PixelFormat {
        self.inner.format()
    }

    fn pixel(&self, x: i32, y: i32) -> Option<&[f32]> {
        if self.holes.iter().any(|h| h.contains(x, y)) {
            return None;
        }
        self.inner.pixel(x, y)
    }
}
