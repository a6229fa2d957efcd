//! A volume bundled with its gradient field.

use std::sync::Arc;
use std::time::Instant;

use glam::UVec3;
use volvis_core::{GradientVolume, InterpolationMode, Volume};
use volvis_render::{RayTraceCamera, RenderConfig, Renderer, TrackballCamera, TransferFunction};

use crate::error::Result;

/// Default vertical field of view of fitted cameras, in degrees.
const DEFAULT_FOVY_DEGREES: f32 = 60.0;

/// A volume together with the gradient volume derived from it.
///
/// Both halves share one interpolation setting, so
/// [`set_interpolation_mode`](Self::set_interpolation_mode) affects sampling
/// of values and gradients alike.
#[derive(Debug, Clone)]
pub struct Dataset {
    volume: Arc<Volume>,
    gradient: Arc<GradientVolume>,
}

impl Dataset {
    /// Derives the gradient volume and wraps both.
    pub fn new(volume: Volume) -> Self {
        let start = Instant::now();
        let gradient = GradientVolume::new(&volume);
        log::info!(
            "computed gradients for {}x{}x{} volume in {:.1} ms (max magnitude {})",
            volume.dims().x,
            volume.dims().y,
            volume.dims().z,
            start.elapsed().as_secs_f64() * 1000.0,
            gradient.max_magnitude()
        );
        Self {
            volume: Arc::new(volume),
            gradient: Arc::new(gradient),
        }
    }

    /// Builds a dataset from x-fastest voxel data.
    pub fn from_data(data: Vec<f32>, dim: UVec3) -> Result<Self> {
        Ok(Self::new(Volume::new(data, dim)?))
    }

    /// Builds a dataset by evaluating `f` at every voxel.
    pub fn from_fn(dim: UVec3, f: impl FnMut(u32, u32, u32) -> f32) -> Result<Self> {
        Ok(Self::new(Volume::from_fn(dim, f)?))
    }

    /// Returns the scalar volume.
    pub fn volume(&self) -> &Arc<Volume> {
        &self.volume
    }

    /// Returns the gradient volume.
    pub fn gradient_volume(&self) -> &Arc<GradientVolume> {
        &self.gradient
    }

    /// Returns the grid dimensions.
    pub fn dims(&self) -> UVec3 {
        self.volume.dims()
    }

    /// Returns the interpolation mode shared by the volume and its gradients.
    pub fn interpolation_mode(&self) -> Result<InterpolationMode> {
        Ok(self.volume.interpolation_mode()?)
    }

    /// Sets the interpolation mode of the volume and its gradients.
    pub fn set_interpolation_mode(&self, mode: InterpolationMode) {
        self.volume.set_interpolation_mode(mode);
    }

    /// Returns a camera framing the whole volume.
    pub fn fitted_camera(&self) -> TrackballCamera {
        TrackballCamera::fitted_to(self.dims(), DEFAULT_FOVY_DEGREES.to_radians())
    }

    /// Returns the default transfer function spanning the volume's values.
    pub fn transfer_function(&self) -> TransferFunction {
        TransferFunction::from_volume(&self.volume)
    }

    /// Returns the default configuration with the transfer function fitted to
    /// this volume.
    pub fn default_config(&self) -> RenderConfig {
        let mut config = RenderConfig::default();
        self.transfer_function().update_render_config(&mut config);
        config
    }

    /// Creates a renderer looking at the volume through a fitted camera.
    pub fn renderer(&self, config: RenderConfig) -> Result<Renderer> {
        self.renderer_with_camera(config, Arc::new(self.fitted_camera()))
    }

    /// Creates a renderer using the given camera.
    pub fn renderer_with_camera(
        &self,
        config: RenderConfig,
        camera: Arc<dyn RayTraceCamera>,
    ) -> Result<Renderer> {
        Ok(Renderer::new(
            Arc::clone(&self.volume),
            Arc::clone(&self.gradient),
            camera,
            config,
        )?)
    }
}
