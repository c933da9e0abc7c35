use crate::image::PixelSource;
use crate::params::BlendParameters;

/// The top-layer input as the host presents it.
#[derive(Clone, Copy)]
pub enum TopLayer<'a> {
    /// No top-layer clip is wired up (filter context, or an unconnected
    /// optional clip). The base image is blended with itself.
    Unconnected,
    /// A connected clip. `None` when the host had no image data for it.
    Connected(Option<&'a dyn PixelSource>),
}

impl<'a> TopLayer<'a> {
    /// The image to read top-layer pixels from.
    pub fn resolve(&self, base: Option<&'a dyn PixelSource>) -> Option<&'a dyn PixelSource> {
        match *self {
            Self::Unconnected => base,
            Self::Connected(image) => image,
        }
    }

    /// Connected, but nothing could be fetched.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Connected(None))
    }
}

impl std::fmt::Debug for TopLayer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unconnected => f.write_str("Unconnected"),
            Self::Connected(Some(image)) => write!(f, "Connected({})", image.bounds()),
            Self::Connected(None) => f.write_str("Connected(None)"),
        }
    }
}

/// Outcome of the identity pre-check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IdentityDecision {
    /// Run the reducer and kernel.
    Render,
    /// Output is the base image at `time`, untouched.
    PassThrough { time: f64 },
}

impl IdentityDecision {
    pub fn is_identity(&self) -> bool {
        matches!(self, Self::PassThrough { .. })
    }
}

/// Decide whether a render at `time` can be replaced by the base image.
///
/// A zero blend amount reproduces the base exactly. A connected top layer
/// without data passes through as well, so no render ever touches an absent
/// buffer.
#[tracing::instrument(level = "debug", skip(params, top))]
pub fn decide(time: f64, params: &BlendParameters, top: &TopLayer<'_>) -> IdentityDecision {
    if params.blend_amount == 0.0 {
        tracing::debug!(time, "blend amount is zero, passing base through");
        return IdentityDecision::PassThrough { time };
    }
    if top.is_missing() {
        tracing::debug!(time, "top layer connected without image data, passing base through");
        return IdentityDecision::PassThrough { time };
    }
    IdentityDecision::Render
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::image::FloatImage;

    fn params(blend: f32) -> BlendParameters {
        BlendParameters {
            blend_amount: blend,
            ..Default::default()
        }
    }

    #[test]
    fn test_zero_blend_is_identity() {
        let top = FloatImage::new(Rect::from_size(2, 2));
        let decision = decide(4.0, &params(0.0), &TopLayer::Connected(Some(&top)));
        assert_eq!(decision, IdentityDecision::PassThrough { time: 4.0 });
    }

    #[test]
    fn test_missing_top_layer_is_identity() {
        let decision = decide(1.5, &params(1.0), &TopLayer::Connected(None));
        assert_eq!(decision, IdentityDecision::PassThrough { time: 1.5 });
        assert!(decision.is_identity());
    }

    #[test]
    fn test_unconnected_top_layer_renders() {
        assert_eq!(
            decide(0.0, &params(0.5), &TopLayer::Unconnected),
            IdentityDecision::Render
        );
    }

    #[test]
    fn test_connected_top_layer_renders() {
        let top = FloatImage::new(Rect::from_size(2, 2));
        let decision = decide(0.0, &params(0.001), &TopLayer::Connected(Some(&top)));
        assert_eq!(decision, IdentityDecision::Render);
        assert!(!decision.is_identity());
    }

    #[test]
    fn test_resolve_unconnected_uses_base() {
        let base = FloatImage::filled(Rect::from_size(1, 1), [0.2, 0.4, 0.6, 1.0]);
        let resolved = TopLayer::Unconnected.resolve(Some(&base)).unwrap();
        assert_eq!(resolved.pixel(0, 0), Some(&[0.2, 0.4, 0.6, 1.0][..]));
        assert!(TopLayer::Connected(None).resolve(Some(&base)).is_none());
    }

    #[test]
    fn test_debug_format() {
        let top = FloatImage::new(Rect::from_size(2, 3));
        assert_eq!(
            format!("{:?}", TopLayer::Connected(Some(&top))),
            "Connected((0, 0)..(2, 3))"
        );
        assert_eq!(format!("{:?}", TopLayer::Unconnected), "Unconnected");
    }
}
