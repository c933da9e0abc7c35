use thiserror::Error;

use crate::image::PixelFormat;

/// Which input image a format check failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerRole {
    Base,
    TopLayer,
}

impl std::fmt::Display for LayerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base => f.write_str("base"),
            Self::TopLayer => f.write_str("top layer"),
        }
    }
}

/// Status code reported back to the host for a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStatus {
    ErrUnsupported,
    ErrValue,
    ErrFatal,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unsupported output format {0}: only Float Rgba can be rendered")]
    UnsupportedFormat(PixelFormat),

    #[error("{role} format {found} does not match output format {expected}")]
    FormatMismatch {
        role: LayerRole,
        expected: PixelFormat,
        found: PixelFormat,
    },

    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("parameter {0} has the wrong value type")]
    ParameterType(String),

    #[error("invalid value for {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("failed to build render thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RenderError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// The host status this error is reported as.
    pub fn status(&self) -> HostStatus {
        match self {
            Self::UnsupportedFormat(_) => HostStatus::ErrUnsupported,
            Self::FormatMismatch { .. }
            | Self::UnknownParameter(_)
            | Self::ParameterType(_)
            | Self::InvalidParameter { .. }
            | Self::Serialization(_) => HostStatus::ErrValue,
            Self::ThreadPool(_) => HostStatus::ErrFatal,
        }
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
