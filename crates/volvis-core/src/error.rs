//! Error types for volvis-rs volume operations.

use thiserror::Error;

/// The main error type for volume construction and sampling.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VolumeError {
    /// A volume with zero voxels was requested.
    #[error("volume has no voxels (dimensions {0}x{1}x{2})")]
    EmptyVolume(u32, u32, u32),

    /// Data size does not match the voxel count implied by the dimensions.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// An interpolation mode discriminant outside the known set.
    #[error("unknown interpolation mode {0}")]
    UnknownInterpolationMode(u8),

    /// An interpolation mode name that does not parse.
    #[error("unknown interpolation mode '{0}'")]
    UnknownInterpolationName(String),
}

/// A specialized Result type for volume operations.
pub type Result<T> = std::result::Result<T, VolumeError>;
