//! Luminance blend of a base and a top-layer RGBA float image.
//!
//! A render runs the identity pre-check, then (optionally) the average color
//! reduction, then the per-pixel composite across tiles on a rayon pool.

pub mod average;
pub mod cancel;
pub mod composite;
pub mod error;
pub mod geometry;
pub mod identity;
pub mod image;
pub mod params;
pub mod pipeline;
pub mod threading;

pub use error::{RenderError, Result};
pub use geometry::Rect;
pub use image::{FloatImage, PixelFormat, PixelSource};
pub use pipeline::{BlendEffect, RenderArgs, RenderOutcome, RenderReport, RenderStatus};
