//! Ray casting backend for volvis-rs.
//!
//! This crate turns a [`volvis_core::Volume`] into pixels on the CPU:
//! - [`Renderer`] - per-pixel ray casting in slicer, MIP, isosurface,
//!   compositing and 2D transfer function modes, parallel over scanlines
//! - [`RayTraceCamera`] and the orbiting [`TrackballCamera`]
//! - [`TransferFunction`] - editable control points resolved into a color map
//! - [`RenderConfig`] - serializable render settings

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Pixel and sample indices are converted to f32 and back throughout
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
// Builder methods return Self; must_use on each adds noise
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

pub mod camera;
pub mod compositing;
pub mod config;
pub mod error;
pub mod ray;
pub mod renderer;
pub mod shading;
pub mod transfer_function;

pub use camera::{RayTraceCamera, TrackballCamera};
pub use compositing::Compositor;
pub use config::{PhongParams, RenderConfig, RenderMode, Tf2dParams, MIN_STEP_SIZE};
pub use error::{RenderError, RenderResult};
pub use ray::{Bounds, Plane, Ray};
pub use renderer::{RenderStatus, Renderer, MAX_SAMPLES_PER_RAY};
pub use shading::phong;
pub use transfer_function::{lookup_color_map, TfPoint, TransferFunction, COLOR_MAP_SIZE};
