use crate::average::AverageColor;
use crate::cancel::CancelToken;
use crate::image::{PixelSource, TileMut, read_rgba};
use crate::params::BlendParameters;

/// ITU-R BT.709 luma weights.
pub const LUMA_WEIGHTS: [f32; 3] = [0.2126, 0.7152, 0.0722];

const TRANSPARENT_BLACK: [f32; 4] = [0.0; 4];

pub fn luminance(rgba: &[f32; 4]) -> f32 {
    LUMA_WEIGHTS[0] * rgba[0] + LUMA_WEIGHTS[1] * rgba[1] + LUMA_WEIGHTS[2] * rgba[2]
}

/// Color each base pixel is pulled away from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorReference {
    /// The top-layer pixel at the same coordinate.
    TopPixel,
    /// One color for the whole render.
    Average(AverageColor),
}

/// Composite one pixel.
///
/// Each color channel moves by `top.a * (luminance(base) - reference)`, the
/// result is mixed with the base by `blend_amount` and optionally clamped.
/// Alpha is always the base alpha.
pub fn blend_pixel(
    base: [f32; 4],
    top: [f32; 4],
    reference: ColorReference,
    params: &BlendParameters,
) -> [f32; 4] {
    let luma = luminance(&base);
    let blend = params.blend_amount;
    let mut out = [0.0, 0.0, 0.0, base[3]];
    for c in 0..3 {
        let reference = match reference {
            ColorReference::TopPixel => top[c],
            ColorReference::Average(avg) => avg.0[c],
        };
        let composite = base[c] + top[3] * (luma - reference);
        let mut result = composite * blend + base[c] * (1.0 - blend);
        if params.clamp_output {
            result = result.clamp(0.0, 1.0);
        }
        out[c] = result;
    }
    out
}

/// Read-only inputs shared by every tile of a render.
#[derive(Clone, Copy)]
pub struct KernelInputs<'a> {
    pub base: Option<&'a dyn PixelSource>,
    pub top: Option<&'a dyn PixelSource>,
    pub params: BlendParameters,
    pub reference: ColorReference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileStatus {
    Complete,
    /// Abandoned part-way; rows after the cancellation point are untouched.
    Cancelled,
}

fn rgba_at(image: Option<&dyn PixelSource>, x: i32, y: i32) -> Option<[f32; 4]> {
    read_rgba(image?, x, y)
}

/// Composite every pixel of `tile`. Pixels missing from either input are
/// written as transparent black.
pub fn composite_tile(
    inputs: &KernelInputs<'_>,
    tile: &mut TileMut<'_>,
    cancel: &CancelToken,
) -> TileStatus {
    let x1 = tile.rect().x1;
    for (y, row) in tile.rows_mut() {
        if cancel.is_cancelled() {
            return TileStatus::Cancelled;
        }
        for (i, dst) in row.chunks_exact_mut(4).enumerate() {
            let x = x1 + i as i32;
            let out = match (rgba_at(inputs.base, x, y), rgba_at(inputs.top, x, y)) {
                (Some(base), Some(top)) => blend_pixel(base, top, inputs.reference, &inputs.params),
                _ => TRANSPARENT_BLACK,
            };
            dst.copy_from_slice(&out);
        }
    }
    TileStatus::Complete
}
