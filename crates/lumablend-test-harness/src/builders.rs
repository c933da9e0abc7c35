use lumablend_core::geometry::Rect;
use lumablend_core::image::{FloatImage, PixelFormat};
use lumablend_core::params::BlendParameters;

/// Builder for test images with sensible defaults: opaque black RGBA float at the origin.
pub struct ImageBuilder {
    bounds: Rect,
    format: PixelFormat,
    fill: [f32; 4],
    pixels: Vec<(i32, i32, [f32; 4])>,
}

impl ImageBuilder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            bounds: Rect::from_size(width, height),
            format: PixelFormat::RGBA_F32,
            fill: [0.0, 0.0, 0.0, 1.0],
            pixels: Vec::new(),
        }
    }

    /// Move the image so its top-left pixel is at `(x, y)`.
    pub fn origin(mut self, x: i32, y: i32) -> Self {
        let (w, h) = (self.bounds.width() as i32, self.bounds.height() as i32);
        self.bounds = Rect::new(x, y, x + w, y + h);
        self
    }

    pub fn fill(mut self, rgba: [f32; 4]) -> Self {
        self.fill = rgba;
        self
    }

    pub fn pixel(mut self, x: i32, y: i32, rgba: [f32; 4]) -> Self {
        self.pixels.push((x, y, rgba));
        self
    }

    pub fn format(mut self, format: PixelFormat) -> Self {
        self.format = format;
        self
    }

    pub fn build(self) -> FloatImage {
        let mut image = FloatImage::with_format(self.bounds, self.format);
        image.fill(self.fill);
        for (x, y, rgba) in self.pixels {
            let px = image
                .pixel_mut(x, y)
                .expect("pixel override outside image bounds in test builder");
            let n = px.len().min(4);
            px[..n].copy_from_slice(&rgba[..n]);
        }
        image
    }
}

/// Builder for parameter snapshots. Starts from the descriptor defaults.
pub struct ParamsBuilder {
    params: BlendParameters,
}

impl ParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: BlendParameters::default(),
        }
    }

    pub fn average(mut self, on: bool) -> Self {
        self.params.use_average_color = on;
        self
    }

    pub fn blend(mut self, amount: f32) -> Self {
        self.params.blend_amount = amount;
        self
    }

    pub fn clamp(mut self, on: bool) -> Self {
        self.params.clamp_output = on;
        self
    }

    pub fn swap(mut self, on: bool) -> Self {
        self.params.swap_layers = on;
        self
    }

    pub fn build(self) -> BlendParameters {
        self.params
    }
}

impl Default for ParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
