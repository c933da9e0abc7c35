use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::geometry::Rect;
use crate::image::{PixelSource, read_rgba};

/// Mean RGB of the top layer over the render window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AverageColor(pub [f32; 3]);

impl AverageColor {
    /// Stand-in when no top-layer pixel was found.
    pub const ZERO: AverageColor = AverageColor([0.0; 3]);
}

/// Running per-channel sums and the number of pixels that contributed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorAccumulator {
    pub sum: [f64; 3],
    pub count: u64,
}

impl ColorAccumulator {
    pub fn add(&mut self, rgba: [f32; 4]) {
        for c in 0..3 {
            self.sum[c] += f64::from(rgba[c]);
        }
        self.count += 1;
    }

    /// Add every pixel of row `y` between `x1` and `x2` that has data.
    pub fn add_row(&mut self, image: &dyn PixelSource, y: i32, x1: i32, x2: i32) {
        for x in x1..x2 {
            if let Some(px) = read_rgba(image, x, y) {
                self.add(px);
            }
        }
    }

    pub fn merge(self, other: ColorAccumulator) -> ColorAccumulator {
        ColorAccumulator {
            sum: [
                self.sum[0] + other.sum[0],
                self.sum[1] + other.sum[1],
                self.sum[2] + other.sum[2],
            ],
            count: self.count + other.count,
        }
    }

    /// Per-channel mean, or [`AverageColor::ZERO`] when nothing was added.
    pub fn mean(&self) -> AverageColor {
        if self.count == 0 {
            return AverageColor::ZERO;
        }
        let n = self.count as f64;
        AverageColor([
            (self.sum[0] / n) as f32,
            (self.sum[1] / n) as f32,
            (self.sum[2] / n) as f32,
        ])
    }
}

/// Sequentially accumulate every pixel of `image` inside `region`.
pub fn accumulate(image: &dyn PixelSource, region: Rect) -> ColorAccumulator {
    let mut acc = ColorAccumulator::default();
    for y in region.y1..region.y2 {
        acc.add_row(image, y, region.x1, region.x2);
    }
    acc
}

/// Mean color of `image` over `region`, reduced row-parallel on the current
/// rayon pool.
///
/// Returns `None` when `cancel` fires before every row has been summed; a
/// partial mean is never produced.
pub fn reduce(image: &dyn PixelSource, region: Rect, cancel: &CancelToken) -> Option<AverageColor> {
    // Pixels outside the image never contribute.
    let Some(scan) = region.intersect(&image.bounds()) else {
        if cancel.is_cancelled() {
            return None;
        }
        tracing::warn!(%region, "no top-layer pixels in region, using zero average");
        return Some(AverageColor::ZERO);
    };
    let acc = (scan.y1..scan.y2)
        .into_par_iter()
        .try_fold(ColorAccumulator::default, |mut acc, y| {
            if cancel.is_cancelled() {
                return None;
            }
            acc.add_row(image, y, scan.x1, scan.x2);
            Some(acc)
        })
        .try_reduce(ColorAccumulator::default, |a, b| Some(a.merge(b)))?;

    if cancel.is_cancelled() {
        return None;
    }
    if acc.count == 0 {
        tracing::warn!(%region, "no top-layer pixels in region, using zero average");
    }
    let average = acc.mean();
    tracing::debug!(pixels = acc.count, ?average, "average color reduced");
    Some(average)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::FloatImage;

    #[test]
    fn test_uniform_image_mean_is_its_color() {
        let image = FloatImage::filled(Rect::from_size(7, 5), [0.3, 0.6, 0.9, 0.5]);
        let avg = reduce(&image, Rect::from_size(7, 5), &CancelToken::new()).unwrap();
        for (got, want) in avg.0.iter().zip([0.3f32, 0.6, 0.9]) {
            assert!((got - want).abs() < 1e-6, "{got} != {want}");
        }
    }

    #[test]
    fn test_mean_of_two_colors() {
        let mut image = FloatImage::filled(Rect::from_size(2, 1), [0.0, 0.0, 0.0, 1.0]);
        image
            .pixel_mut(1, 0)
            .unwrap()
            .copy_from_slice(&[1.0, 0.5, 0.25, 1.0]);
        let acc = accumulate(&image, Rect::from_size(2, 1));
        assert_eq!(acc.count, 2);
        assert_eq!(acc.mean(), AverageColor([0.5, 0.25, 0.125]));
    }

    #[test]
    fn test_region_outside_image_counts_only_valid_pixels() {
        let image = FloatImage::filled(Rect::from_size(2, 2), [0.4, 0.4, 0.4, 1.0]);
        let acc = accumulate(&image, Rect::new(-2, -2, 4, 4));
        assert_eq!(acc.count, 4);
    }

    #[test]
    fn test_no_valid_pixels_yields_zero() {
        let image = FloatImage::filled(Rect::from_size(2, 2), [0.4, 0.4, 0.4, 1.0]);
        let avg = reduce(&image, Rect::new(10, 10, 20, 20), &CancelToken::new()).unwrap();
        assert_eq!(avg, AverageColor::ZERO);
        assert!(avg.0.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_infinite_region_scans_only_image() {
        let image = FloatImage::filled(Rect::new(-1, -1, 2, 1), [0.2, 0.4, 0.6, 1.0]);
        let region = Rect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        let avg = reduce(&image, region, &CancelToken::new()).unwrap();
        for (got, want) in avg.0.iter().zip([0.2f32, 0.4, 0.6]) {
            assert!((got - want).abs() < 1e-6, "{got} != {want}");
        }
    }

    #[test]
    fn test_empty_region_yields_zero() {
        let image = FloatImage::filled(Rect::from_size(2, 2), [0.4, 0.4, 0.4, 1.0]);
        let avg = reduce(&image, Rect::EMPTY, &CancelToken::new()).unwrap();
        assert_eq!(avg, AverageColor::ZERO);
    }

    #[test]
    fn test_cancelled_reduction_publishes_nothing() {
        let image = FloatImage::filled(Rect::from_size(4, 4), [0.4, 0.4, 0.4, 1.0]);
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(reduce(&image, Rect::from_size(4, 4), &cancel), None);
    }

    #[test]
    fn test_merge_adds_sums_and_counts() {
        let mut a = ColorAccumulator::default();
        a.add([1.0, 2.0, 3.0, 1.0]);
        let mut b = ColorAccumulator::default();
        b.add([3.0, 2.0, 1.0, 0.0]);
        b.add([2.0, 2.0, 2.0, 0.0]);
        let merged = a.merge(b);
        assert_eq!(merged.count, 3);
        assert_eq!(merged.sum, [6.0, 6.0, 6.0]);
        assert_eq!(merged.mean(), AverageColor([2.0, 2.0, 2.0]));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut image = FloatImage::new(Rect::from_size(16, 9));
        for y in 0..9 {
            for x in 0..16 {
                let px = image.pixel_mut(x, y).unwrap();
                px.copy_from_slice(&[x as f32 / 16.0, y as f32 / 9.0, 0.5, 1.0]);
            }
        }
        let region = Rect::new(2, 1, 14, 8);
        let parallel = reduce(&image, region, &CancelToken::new()).unwrap();
        let sequential = accumulate(&image, region).mean();
        for c in 0..3 {
            assert!((parallel.0[c] - sequential.0[c]).abs() < 1e-6);
        }
    }
}
