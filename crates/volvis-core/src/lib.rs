//! Core volume types for volvis-rs.
//!
//! This crate provides the data side of the volume renderer:
//! - [`Volume`] - a dense scalar grid with nearest, trilinear and tricubic sampling
//! - [`GradientVolume`] - central-difference gradients derived from a volume
//! - [`InterpolationMode`] and the [`InterpolationSetting`] shared between the two

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Voxel indices are u32 and routinely widened to usize or converted to f32
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::many_single_char_names)]

pub mod error;
pub mod gradient_volume;
pub mod interpolation;
pub mod volume;

pub use error::{Result, VolumeError};
pub use gradient_volume::{GradientVolume, GradientVoxel};
pub use interpolation::{InterpolationMode, InterpolationSetting};
pub use volume::{cubic_interpolate, linear_interpolate, weight, Volume, MAX_HISTOGRAM_BINS};

// Re-export glam types for convenience
pub use glam::{UVec3, Vec2, Vec3, Vec4};
