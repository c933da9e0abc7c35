use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

// =============================================================================
// Pixel formats
// =============================================================================

/// Storage depth the host reports for a clip. Samples always reach the core
/// as `f32`; the depth is only checked, never converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BitDepth {
    U8,
    U16,
    Half,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Components {
    Rgba,
    Rgb,
    Alpha,
}

impl Components {
    pub fn channels(&self) -> usize {
        match self {
            Self::Rgba => 4,
            Self::Rgb => 3,
            Self::Alpha => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelFormat {
    pub depth: BitDepth,
    pub components: Components,
}

impl PixelFormat {
    /// The only format the blend renders.
    pub const RGBA_F32: PixelFormat = PixelFormat {
        depth: BitDepth::Float,
        components: Components::Rgba,
    };

    pub fn new(depth: BitDepth, components: Components) -> Self {
        Self { depth, components }
    }

    pub fn is_rgba_f32(&self) -> bool {
        *self == Self::RGBA_F32
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} {:?}", self.depth, self.components)
    }
}

// =============================================================================
// PixelSource trait
// =============================================================================

/// Read access to a host-owned image. Implementations must bounds-check:
/// `pixel` returns `None` for any coordinate without data.
pub trait PixelSource: Sync {
    fn bounds(&self) -> Rect;

    fn format(&self) -> PixelFormat;

    /// Channel samples of the pixel at `(x, y)`.
    fn pixel(&self, x: i32, y: i32) -> Option<&[f32]>;
}

/// Read the first four channels at `(x, y)` as RGBA.
pub fn read_rgba(source: &dyn PixelSource, x: i32, y: i32) -> Option<[f32; 4]> {
    match source.pixel(x, y)? {
        [r, g, b, a, ..] => Some([*r, *g, *b, *a]),
        _ => None,
    }
}

// =============================================================================
// FloatImage
// =============================================================================

/// An owned float image, row-major, `channels` samples per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatImage {
    bounds: Rect,
    format: PixelFormat,
    data: Vec<f32>,
}

impl FloatImage {
    /// Transparent black RGBA float image covering `bounds`.
    pub fn new(bounds: Rect) -> Self {
        Self::with_format(bounds, PixelFormat::RGBA_F32)
    }

    /// Zeroed image that reports `format` to the core.
    pub fn with_format(bounds: Rect, format: PixelFormat) -> Self {
        let len = bounds.area() as usize * format.components.channels();
        Self {
            bounds,
            format,
            data: vec![0.0; len],
        }
    }

    /// RGBA float image where every pixel is `rgba`.
    pub fn filled(bounds: Rect, rgba: [f32; 4]) -> Self {
        let mut image = Self::new(bounds);
        image.fill(rgba);
        image
    }

    /// Create from existing RGBA samples. Panics if data length doesn't match bounds.
    pub fn from_rgba_vec(bounds: Rect, data: Vec<f32>) -> Self {
        assert_eq!(
            data.len(),
            bounds.area() as usize * 4,
            "RGBA data length {} doesn't match {}x{}x4",
            data.len(),
            bounds.width(),
            bounds.height()
        );
        Self {
            bounds,
            format: PixelFormat::RGBA_F32,
            data,
        }
    }

    pub fn channels(&self) -> usize {
        self.format.components.channels()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if !self.bounds.contains(x, y) {
            return None;
        }
        let col = (x - self.bounds.x1) as usize;
        let row = (y - self.bounds.y1) as usize;
        Some((row * self.bounds.width() as usize + col) * self.channels())
    }

    pub fn pixel_mut(&mut self, x: i32, y: i32) -> Option<&mut [f32]> {
        let idx = self.offset(x, y)?;
        let ch = self.channels();
        Some(&mut self.data[idx..idx + ch])
    }

    /// Overwrite every pixel's leading channels with `rgba`.
    pub fn fill(&mut self, rgba: [f32; 4]) {
        let ch = self.channels();
        for pixel in self.data.chunks_exact_mut(ch) {
            let n = ch.min(4);
            pixel[..n].copy_from_slice(&rgba[..n]);
        }
    }

    /// Split the part of `window` inside this image into a grid of disjoint
    /// mutable tiles, row-major. Edge tiles are truncated to the window.
    pub fn tiles_mut(
        &mut self,
        window: Rect,
        tile_width: u32,
        tile_height: u32,
    ) -> Vec<TileMut<'_>> {
        let Some(window) = window.intersect(&self.bounds) else {
            return Vec::new();
        };
        let tw = tile_width.clamp(1, window.width());
        let th = tile_height.clamp(1, window.height());
        let cols = window.width().div_ceil(tw) as usize;

        let mut tiles: Vec<TileMut<'_>> = window
            .grid(tw, th)
            .into_iter()
            .map(|rect| TileMut {
                rect,
                rows: Vec::with_capacity(rect.height() as usize),
            })
            .collect();

        let ch = self.channels();
        let stride = self.bounds.width() as usize * ch;
        let skip = (window.y1 - self.bounds.y1) as usize;
        let x_start = (window.x1 - self.bounds.x1) as usize * ch;
        let x_end = x_start + window.width() as usize * ch;

        for (i, row) in self
            .data
            .chunks_exact_mut(stride)
            .skip(skip)
            .take(window.height() as usize)
            .enumerate()
        {
            let ty = i / th as usize;
            for (tx, piece) in row[x_start..x_end].chunks_mut(tw as usize * ch).enumerate() {
                tiles[ty * cols + tx].rows.push(piece);
            }
        }
        tiles
    }
}

impl PixelSource for FloatImage {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn format(&self) -> PixelFormat {
        self.format
    }

    fn pixel(&self, x: i32, y: i32) -> Option<&[f32]> {
        let idx = self.offset(x, y)?;
        Some(&self.data[idx..idx + self.channels()])
    }
}

// =============================================================================
// TileMut
// =============================================================================

/// Exclusive write access to one sub-rectangle of a destination image.
#[derive(Debug)]
pub struct TileMut<'a> {
    rect: Rect,
    rows: Vec<&'a mut [f32]>,
}

impl<'a> TileMut<'a> {
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Scan rows top to bottom, paired with their `y` coordinate.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = (i32, &mut [f32])> + '_ {
        let y1 = self.rect.y1;
        self.rows
            .iter_mut()
            .enumerate()
            .map(move |(i, row)| (y1 + i as i32, &mut **row))
    }
}
