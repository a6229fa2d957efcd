//! volvis-rs: a Rust-native CPU volume renderer for dense 3D scalar fields.
//!
//! A [`Volume`] is a regular grid of scalar samples. From it a
//! [`GradientVolume`] is derived for shading, and a [`Renderer`] casts one ray
//! per pixel through both to produce an RGBA image.
//!
//! # Quick Start
//!
//! ```no_run
//! use volvis::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!
//!     // A sphere of radius 20 in a 64^3 grid
//!     let dataset = Dataset::from_fn(UVec3::splat(64), |x, y, z| {
//!         let p = Vec3::new(x as f32, y as f32, z as f32) - Vec3::splat(32.0);
//!         if p.length() < 20.0 { 200.0 } else { 0.0 }
//!     })?;
//!     dataset.set_interpolation_mode(InterpolationMode::Linear);
//!
//!     let config = dataset
//!         .default_config()
//!         .with_render_mode(RenderMode::Iso)
//!         .with_iso_value(100.0)
//!         .with_shading(true);
//!     let mut renderer = dataset.renderer(config)?;
//!     renderer.render()?;
//!
//!     let pixels: &[f32] = renderer.frame_buffer_floats();
//!     println!("{} floats", pixels.len());
//!     Ok(())
//! }
//! ```
//!
//! # Render modes
//!
//! - [`RenderMode::Slicer`] - a single plane through the volume center
//! - [`RenderMode::Mip`] - maximum intensity projection
//! - [`RenderMode::Iso`] - first-hit isosurface with optional bisection
//! - [`RenderMode::Composite`] - front-to-back compositing with a 1D transfer function
//! - [`RenderMode::Tf2d`] - compositing with a gradient-aware 2D transfer function

mod dataset;
pub mod error;

use std::path::Path;

pub use dataset::Dataset;
pub use error::{Result, VolvisError};

// Re-export core types
pub use volvis_core::{
    GradientVolume, GradientVoxel, InterpolationMode, InterpolationSetting, UVec3, Vec2, Vec3,
    Vec4, Volume, VolumeError,
};

// Re-export render types
pub use volvis_render::{
    Bounds, Compositor, PhongParams, Plane, Ray, RayTraceCamera, RenderConfig, RenderError,
    RenderMode, RenderStatus, Renderer, Tf2dParams, TfPoint, TrackballCamera, TransferFunction,
    MAX_SAMPLES_PER_RAY, MIN_STEP_SIZE,
};

/// Initializes logging from the `RUST_LOG` environment variable.
///
/// Calling this more than once is harmless.
pub fn init_logging() {
    let _ = env_logger::try_init();
}

/// Loads a render configuration from a JSON file.
///
/// Fields missing from the file take their default values.
pub fn load_render_config(path: impl AsRef<Path>) -> Result<RenderConfig> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)?;
    let config = RenderConfig::from_json(&json)?;
    log::info!("loaded render config from {}", path.display());
    Ok(config)
}

/// Saves a render configuration as pretty-printed JSON.
pub fn save_render_config(config: &RenderConfig, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, config.to_json()?)?;
    log::info!("saved render config to {}", path.display());
    Ok(())
}
