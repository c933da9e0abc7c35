use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};
use crate::image::{BitDepth, Components};

pub const USE_AVERAGE_COLOR: &str = "use_average_color";
pub const SWAP_LAYERS: &str = "swap_layers";
pub const CLAMP: &str = "clamp";
pub const BLEND: &str = "blend";

/// Host context the effect is instantiated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostContext {
    /// Single source clip; the source doubles as the top layer.
    Filter,
    /// Source plus an optional top-layer clip.
    General,
}

/// The type of a parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterType {
    Bool {
        default: bool,
    },
    Float {
        default: f64,
        min: f64,
        max: f64,
        increment: f64,
    },
}

/// Definition of a parameter on the effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    pub name: String,
    pub label: String,
    pub hint: String,
    pub param_type: ParameterType,
}

impl ParameterDefinition {
    pub fn default_value(&self) -> ParameterValue {
        match self.param_type {
            ParameterType::Bool { default } => ParameterValue::Bool(default),
            ParameterType::Float { default, .. } => ParameterValue::Float(default),
        }
    }
}

/// A concrete parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    Bool(bool),
    Float(f64),
}

// Manual Eq impl: f64 doesn't impl Eq. Parameter values coming from the host are finite.
impl Eq for ParameterValue {}

/// An image input or output the effect declares to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipDefinition {
    pub name: String,
    pub optional: bool,
    pub components: Components,
    pub contexts: Vec<HostContext>,
}

/// Everything the host needs to register the effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectDescriptor {
    pub identifier: String,
    pub label: String,
    pub grouping: String,
    pub description: String,
    pub version: Version,
    pub contexts: Vec<HostContext>,
    pub bit_depths: Vec<BitDepth>,
    pub supports_tiles: bool,
    pub clips: Vec<ClipDefinition>,
    pub parameters: Vec<ParameterDefinition>,
}

impl EffectDescriptor {
    /// Descriptor of the luminance blend.
    pub fn blend() -> Self {
        let both = vec![HostContext::Filter, HostContext::General];
        Self {
            identifier: "org.lumablend.BlendMode".to_string(),
            label: "Luma Blend".to_string(),
            grouping: "Blend".to_string(),
            description: "Composite mode that shifts the base toward its own luminance, \
                          weighted by the top layer"
                .to_string(),
            version: Version::new(1, 0, 0),
            contexts: both.clone(),
            bit_depths: vec![BitDepth::Float],
            supports_tiles: true,
            clips: vec![
                ClipDefinition {
                    name: "Source".to_string(),
                    optional: false,
                    components: Components::Rgba,
                    contexts: both.clone(),
                },
                ClipDefinition {
                    name: "TopLayer".to_string(),
                    optional: true,
                    components: Components::Rgba,
                    contexts: vec![HostContext::General],
                },
                ClipDefinition {
                    name: "Output".to_string(),
                    optional: false,
                    components: Components::Rgba,
                    contexts: both,
                },
            ],
            parameters: vec![
                ParameterDefinition {
                    name: USE_AVERAGE_COLOR.to_string(),
                    label: "Top Color Average".to_string(),
                    hint: "Use average color of the top layer".to_string(),
                    param_type: ParameterType::Bool { default: true },
                },
                ParameterDefinition {
                    name: SWAP_LAYERS.to_string(),
                    label: "Swap Layers".to_string(),
                    hint: "Swap Layers".to_string(),
                    param_type: ParameterType::Bool { default: false },
                },
                ParameterDefinition {
                    name: CLAMP.to_string(),
                    label: "Clamp".to_string(),
                    hint: "Clamp RGB values to be between 0.0 and 1.0 included".to_string(),
                    param_type: ParameterType::Bool { default: false },
                },
                ParameterDefinition {
                    name: BLEND.to_string(),
                    label: "Blend".to_string(),
                    hint: "Blend result with a bottom layer".to_string(),
                    param_type: ParameterType::Float {
                        default: 1.0,
                        min: 0.0,
                        max: 1.0,
                        increment: 0.001,
                    },
                },
            ],
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDefinition> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Clips registered in `context`.
    pub fn clips_for(&self, context: HostContext) -> impl Iterator<Item = &ClipDefinition> {
        self.clips
            .iter()
            .filter(move |c| c.contexts.contains(&context))
    }
}

// =============================================================================
// ParameterSet
// =============================================================================

/// Parameter values of one effect instance, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub values: Vec<(String, ParameterValue)>,
}

impl ParameterSet {
    /// Every parameter of `descriptor` at its default.
    pub fn from_descriptor(descriptor: &EffectDescriptor) -> Self {
        let values = descriptor
            .parameters
            .iter()
            .map(|def| (def.name.clone(), def.default_value()))
            .collect();
        Self { values }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn get(&self, name: &str) -> Option<ParameterValue> {
        self.values
            .iter()
            .find_map(|(n, v)| if n == name { Some(*v) } else { None })
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            ParameterValue::Bool(b) => Some(b),
            ParameterValue::Float(_) => None,
        }
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            ParameterValue::Float(f) => Some(f),
            ParameterValue::Bool(_) => None,
        }
    }

    /// Set a parameter value by name. Returns true if found and the type matched.
    pub fn set(&mut self, name: &str, value: ParameterValue) -> bool {
        for (n, v) in &mut self.values {
            if n == name {
                if std::mem::discriminant(v) != std::mem::discriminant(&value) {
                    return false;
                }
                *v = value;
                return true;
            }
        }
        false
    }

    pub fn set_bool(&mut self, name: &str, value: bool) -> bool {
        self.set(name, ParameterValue::Bool(value))
    }

    pub fn set_float(&mut self, name: &str, value: f64) -> bool {
        self.set(name, ParameterValue::Float(value))
    }

    fn require_bool(&self, name: &str) -> Result<bool> {
        match self.get(name) {
            Some(ParameterValue::Bool(b)) => Ok(b),
            Some(_) => Err(RenderError::ParameterType(name.to_string())),
            None => Err(RenderError::UnknownParameter(name.to_string())),
        }
    }

    fn require_float(&self, name: &str) -> Result<f64> {
        match self.get(name) {
            Some(ParameterValue::Float(f)) => Ok(f),
            Some(_) => Err(RenderError::ParameterType(name.to_string())),
            None => Err(RenderError::UnknownParameter(name.to_string())),
        }
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::from_descriptor(&EffectDescriptor::blend())
    }
}

// =============================================================================
// BlendParameters
// =============================================================================

/// Frozen settings for one render call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendParameters {
    pub use_average_color: bool,
    /// Mix between the composite (1.0) and the untouched base (0.0).
    pub blend_amount: f32,
    pub clamp_output: bool,
    pub swap_layers: bool,
}

impl Default for BlendParameters {
    fn default() -> Self {
        Self {
            use_average_color: true,
            blend_amount: 1.0,
            clamp_output: false,
            swap_layers: false,
        }
    }
}

impl BlendParameters {
    /// Snapshot the values of `set`, validated against the blend range.
    pub fn from_set(set: &ParameterSet) -> Result<Self> {
        Self {
            use_average_color: set.require_bool(USE_AVERAGE_COLOR)?,
            blend_amount: set.require_float(BLEND)? as f32,
            clamp_output: set.require_bool(CLAMP)?,
            swap_layers: set.require_bool(SWAP_LAYERS)?,
        }
        .validated()
    }

    /// Reject a non-finite blend amount and pull finite ones into `[0, 1]`.
    pub fn validated(mut self) -> Result<Self> {
        if !self.blend_amount.is_finite() {
            return Err(RenderError::invalid(
                BLEND,
                format!("{} is not a finite number", self.blend_amount),
            ));
        }
        let clamped = self.blend_amount.clamp(0.0, 1.0);
        if clamped != self.blend_amount {
            tracing::warn!(
                blend = self.blend_amount,
                clamped,
                "blend amount outside [0, 1], clamping"
            );
            self.blend_amount = clamped;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_parameter_defaults() {
        let desc = EffectDescriptor::blend();
        assert_eq!(desc.parameters.len(), 4);
        assert_eq!(
            desc.parameter(USE_AVERAGE_COLOR).unwrap().default_value(),
            ParameterValue::Bool(true)
        );
        assert_eq!(
            desc.parameter(BLEND).unwrap().param_type,
            ParameterType::Float {
                default: 1.0,
                min: 0.0,
                max: 1.0,
                increment: 0.001,
            }
        );
        assert!(desc.parameter("nonexistent").is_none());
    }

    #[test]
    fn test_top_layer_clip_only_in_general_context() {
        let desc = EffectDescriptor::blend();
        let filter: Vec<&str> = desc
            .clips_for(HostContext::Filter)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(filter, vec!["Source", "Output"]);

        let general: Vec<&ClipDefinition> = desc.clips_for(HostContext::General).collect();
        assert_eq!(general.len(), 3);
        assert!(general.iter().any(|c| c.name == "TopLayer" && c.optional));
    }

    #[test]
    fn test_descriptor_version_and_depth() {
        let desc = EffectDescriptor::blend();
        assert_eq!(desc.version, Version::new(1, 0, 0));
        assert_eq!(desc.bit_depths, vec![BitDepth::Float]);
        assert!(desc.supports_tiles);
    }

    #[test]
    fn test_set_defaults_match_blend_parameters_default() {
        let params = BlendParameters::from_set(&ParameterSet::default()).unwrap();
        assert_eq!(params, BlendParameters::default());
    }

    #[test]
    fn test_get_set_roundtrip() {
        let mut set = ParameterSet::default();
        assert!(set.set_float(BLEND, 0.25));
        assert!(set.set_bool(CLAMP, true));
        assert_eq!(set.get_float(BLEND), Some(0.25));
        assert_eq!(set.get_bool(CLAMP), Some(true));
    }

    #[test]
    fn test_set_rejects_wrong_type_and_unknown_name() {
        let mut set = ParameterSet::default();
        assert!(!set.set_bool(BLEND, true));
        assert!(!set.set_float("nonexistent", 1.0));
        assert_eq!(set.get_float(BLEND), Some(1.0));
        assert_eq!(set.get_bool(BLEND), None);
    }

    #[test]
    fn test_from_set_missing_parameter() {
        let set = ParameterSet { values: Vec::new() };
        let err = BlendParameters::from_set(&set).unwrap_err();
        assert!(matches!(err, RenderError::UnknownParameter(name) if name == USE_AVERAGE_COLOR));
    }

    #[test]
    fn test_from_set_wrong_type() {
        let mut set = ParameterSet::default();
        set.values.retain(|(n, _)| n != CLAMP);
        set.values.push((CLAMP.to_string(), ParameterValue::Float(1.0)));
        let err = BlendParameters::from_set(&set).unwrap_err();
        assert!(matches!(err, RenderError::ParameterType(name) if name == CLAMP));
    }

    #[test]
    fn test_validated_clamps_out_of_range_blend() {
        let params = BlendParameters {
            blend_amount: 1.5,
            ..Default::default()
        };
        assert_eq!(params.validated().unwrap().blend_amount, 1.0);

        let params = BlendParameters {
            blend_amount: -0.5,
            ..Default::default()
        };
        assert_eq!(params.validated().unwrap().blend_amount, 0.0);
    }

    #[test]
    fn test_validated_rejects_nan_blend() {
        let params = BlendParameters {
            blend_amount: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            params.validated(),
            Err(RenderError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_parameter_set_json() {
        let json = r#"{"values":[["use_average_color",{"Bool":false}],["swap_layers",{"Bool":true}],["clamp",{"Bool":false}],["blend",{"Float":0.5}]]}"#;
        let set = ParameterSet::from_json(json).unwrap();
        let params = BlendParameters::from_set(&set).unwrap();
        assert!(!params.use_average_color);
        assert!(params.swap_layers);
        assert_eq!(params.blend_amount, 0.5);
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut set = ParameterSet::default();
        set.set_float(BLEND, 0.125);
        let json = serde_json::to_string(&set).unwrap();
        let deserialized: ParameterSet = serde_json::from_str(&json).unwrap();
        assert_eq!(set, deserialized);
    }
}
