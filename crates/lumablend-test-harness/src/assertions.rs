use lumablend_core::geometry::Rect;
use lumablend_core::image::PixelSource;

/// Default tolerance for float comparisons.
pub const EPSILON: f32 = 1e-5;

/// Assert that the pixel at `(x, y)` matches `expected` channel by channel.
pub fn assert_pixel_approx(image: &dyn PixelSource, x: i32, y: i32, expected: [f32; 4]) {
    let px = image
        .pixel(x, y)
        .unwrap_or_else(|| panic!("no pixel at ({x}, {y})"));
    for c in 0..4 {
        assert!(
            (px[c] - expected[c]).abs() < EPSILON,
            "pixel ({x}, {y}) channel {c}: got {:?}, expected {expected:?}",
            px
        );
    }
}

/// Assert that two images agree on every pixel of `region`.
pub fn assert_images_approx(a: &dyn PixelSource, b: &dyn PixelSource, region: Rect) {
    for y in region.y1..region.y2 {
        for x in region.x1..region.x2 {
            let pa = a.pixel(x, y);
            let pb = b.pixel(x, y);
            match (pa, pb) {
                (Some(pa), Some(pb)) => {
                    for c in 0..pa.len().min(pb.len()) {
                        assert!(
                            (pa[c] - pb[c]).abs() < EPSILON,
                            "images differ at ({x}, {y}): {pa:?} vs {pb:?}"
                        );
                    }
                }
                _ => panic!("pixel presence differs at ({x}, {y}): {pa:?} vs {pb:?}"),
            }
        }
    }
}

/// Assert that every pixel of `region` is exactly transparent black.
pub fn assert_region_transparent(image: &dyn PixelSource, region: Rect) {
    for y in region.y1..region.y2 {
        for x in region.x1..region.x2 {
            let px = image.pixel(x, y).unwrap_or_else(|| panic!("no pixel at ({x}, {y})"));
            assert_eq!(px, &[0.0; 4][..], "pixel ({x}, {y}) is not transparent black");
        }
    }
}

/// Assert that `output` carries the alpha of `base` over `region`.
pub fn assert_alpha_preserved(output: &dyn PixelSource, base: &dyn PixelSource, region: Rect) {
    for y in region.y1..region.y2 {
        for x in region.x1..region.x2 {
            let (Some(out), Some(src)) = (output.pixel(x, y), base.pixel(x, y)) else {
                continue;
            };
            assert_eq!(out[3], src[3], "alpha changed at ({x}, {y})");
        }
    }
}

/// Assert that every RGB sample of `region` lies in `[0, 1]`.
pub fn assert_rgb_in_unit_range(image: &dyn PixelSource, region: Rect) {
    for y in region.y1..region.y2 {
        for x in region.x1..region.x2 {
            let px = image.pixel(x, y).unwrap_or_else(|| panic!("no pixel at ({x}, {y})"));
            for c in 0..3 {
                assert!(
                    (0.0..=1.0).contains(&px[c]),
                    "pixel ({x}, {y}) channel {c} = {} outside [0, 1]",
                    px[c]
                );
            }
        }
    }
}
