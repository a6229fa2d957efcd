//! Error types for volvis-rs.

use thiserror::Error;
use volvis_core::VolumeError;
use volvis_render::RenderError;

/// The main error type for volvis-rs operations.
#[derive(Error, Debug)]
pub enum VolvisError {
    /// Building or sampling a volume failed.
    #[error("volume error: {0}")]
    Volume(#[from] VolumeError),

    /// Configuring or running the renderer failed.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for volvis-rs operations.
pub type Result<T> = std::result::Result<T, VolvisError>;
