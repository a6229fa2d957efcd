//! Rendering error types.

use thiserror::Error;
use volvis_core::VolumeError;

/// Errors that can occur during configuration and ray casting.
#[derive(Error, Debug)]
pub enum RenderError {
    /// A configuration value is outside its valid range.
    #[error("invalid render configuration: {0}")]
    InvalidConfig(String),

    /// The gradient volume does not belong to the volume being rendered.
    #[error("gradient volume dimensions {gradient:?} do not match volume dimensions {volume:?}")]
    DimensionMismatch {
        volume: [u32; 3],
        gradient: [u32; 3],
    },

    /// Sampling the volume failed.
    #[error("volume error: {0}")]
    Volume(#[from] VolumeError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
