//! The CPU ray casting renderer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use glam::{UVec2, Vec2, Vec3, Vec4};
use rayon::prelude::*;
use volvis_core::{GradientVolume, InterpolationMode, Volume};

use crate::camera::RayTraceCamera;
use crate::compositing::Compositor;
use crate::config::{RenderConfig, RenderMode};
use crate::error::{RenderError, RenderResult};
use crate::ray::{Bounds, Plane, Ray};
use crate::shading::{facing, phong};
use crate::transfer_function::lookup_color_map;

/// Upper bound on the samples taken along one ray.
///
/// Rays longer than `MAX_SAMPLES_PER_RAY` steps are marched only up to that
/// many samples.
pub const MAX_SAMPLES_PER_RAY: usize = 1 << 20;

/// Outcome of a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// Every pixel was traced.
    Completed,
    /// The pass was cancelled; rows that were not traced are transparent.
    Cancelled,
}

/// Casts one ray per pixel through a volume into an RGBA framebuffer.
///
/// The framebuffer is row-major with row 0 at the bottom of the image.
pub struct Renderer {
    volume: Arc<Volume>,
    gradient: Arc<GradientVolume>,
    camera: Arc<dyn RayTraceCamera>,
    config: RenderConfig,
    frame_buffer: Vec<Vec4>,
}

impl Renderer {
    /// Creates a renderer.
    ///
    /// # Errors
    /// Returns [`RenderError::InvalidConfig`] if the configuration does not
    /// validate, or [`RenderError::DimensionMismatch`] if the gradient volume
    /// was built from a volume of different size.
    pub fn new(
        volume: Arc<Volume>,
        gradient: Arc<GradientVolume>,
        camera: Arc<dyn RayTraceCamera>,
        config: RenderConfig,
    ) -> RenderResult<Self> {
        config.validate()?;
        if volume.dims() != gradient.dims() {
            return Err(RenderError::DimensionMismatch {
                volume: volume.dims().to_array(),
                gradient: gradient.dims().to_array(),
            });
        }

        let mut renderer = Self {
            volume,
            gradient,
            camera,
            config,
            frame_buffer: Vec::new(),
        };
        renderer.resize_image(renderer.config.render_resolution);
        log::debug!(
            "created renderer for {:?} volume at {}x{}",
            renderer.volume.dims(),
            renderer.config.render_resolution.x,
            renderer.config.render_resolution.y
        );
        Ok(renderer)
    }

    /// Returns the current configuration.
    #[must_use]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Replaces the configuration, resizing the framebuffer if the
    /// resolution changed. Does nothing if the configuration is unchanged.
    ///
    /// # Errors
    /// Returns [`RenderError::InvalidConfig`] and keeps the old configuration
    /// if the new one does not validate.
    pub fn set_config(&mut self, config: RenderConfig) -> RenderResult<()> {
        if config == self.config {
            return Ok(());
        }
        config.validate()?;
        let resized = config.render_resolution != self.config.render_resolution;
        self.config = config;
        if resized {
            self.resize_image(self.config.render_resolution);
        }
        Ok(())
    }

    /// Returns the camera rays are generated from.
    #[must_use]
    pub fn camera(&self) -> &Arc<dyn RayTraceCamera> {
        &self.camera
    }

    /// Replaces the camera.
    pub fn set_camera(&mut self, camera: Arc<dyn RayTraceCamera>) {
        self.camera = camera;
    }

    /// Returns the rendered volume.
    #[must_use]
    pub fn volume(&self) -> &Arc<Volume> {
        &self.volume
    }

    /// Returns the gradient volume used for shading and the 2D transfer
    /// function.
    #[must_use]
    pub fn gradient_volume(&self) -> &Arc<GradientVolume> {
        &self.gradient
    }

    /// Returns the framebuffer resolution.
    #[must_use]
    pub fn resolution(&self) -> UVec2 {
        self.config.render_resolution
    }

    /// Returns the framebuffer, row-major with row 0 at the bottom.
    #[must_use]
    pub fn frame_buffer(&self) -> &[Vec4] {
        &self.frame_buffer
    }

    /// Returns the framebuffer as tightly packed RGBA floats.
    #[must_use]
    pub fn frame_buffer_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.frame_buffer)
    }

    /// Renders a full frame.
    ///
    /// # Errors
    /// Returns [`RenderError::Volume`] if the shared interpolation mode is
    /// invalid.
    pub fn render(&mut self) -> RenderResult<()> {
        let never = AtomicBool::new(false);
        self.render_cancellable(&never).map(|_| ())
    }

    /// Renders a frame, checking `cancel` before each scanline.
    ///
    /// Scanlines are traced in parallel. Once `cancel` is set the remaining
    /// rows are cleared instead of traced, so the whole framebuffer is
    /// written either way.
    ///
    /// # Errors
    /// Returns [`RenderError::Volume`] if the shared interpolation mode is
    /// invalid.
    pub fn render_cancellable(&mut self, cancel: &AtomicBool) -> RenderResult<RenderStatus> {
        let start = Instant::now();
        let tracer = Tracer::new(
            &self.volume,
            &self.gradient,
            self.camera.as_ref(),
            &self.config,
        )?;

        let UVec2 {
            x: width,
            y: height,
        } = self.config.render_resolution;
        let pixel_size = Vec2::new(2.0 / width as f32, 2.0 / height as f32);
        let aspect = width as f32 / height as f32;
        let skipped = AtomicBool::new(false);

        self.frame_buffer
            .par_chunks_mut(width as usize)
            .enumerate()
            .for_each(|(y, row)| {
                if cancel.load(Ordering::Relaxed) {
                    skipped.store(true, Ordering::Relaxed);
                    row.fill(Vec4::ZERO);
                    return;
                }
                let ndc_y = (y as f32 + 0.5) * pixel_size.y - 1.0;
                for (x, pixel) in row.iter_mut().enumerate() {
                    let ndc_x = ((x as f32 + 0.5) * pixel_size.x - 1.0) * aspect;
                    let ray = tracer.camera.generate_ray(Vec2::new(ndc_x, ndc_y));
                    *pixel = tracer.trace(&ray);
                }
            });

        let status = if skipped.into_inner() {
            RenderStatus::Cancelled
        } else {
            RenderStatus::Completed
        };
        log::info!(
            "{} pass at {}x{} ({} interpolation) {:?} in {:.1} ms",
            self.config.render_mode.name(),
            width,
            height,
            tracer.mode,
            status,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(status)
    }

    /// Traces a single ray with the current configuration.
    ///
    /// # Errors
    /// Returns [`RenderError::Volume`] if the shared interpolation mode is
    /// invalid.
    pub fn trace_ray(&self, ray: &Ray) -> RenderResult<Vec4> {
        let tracer = Tracer::new(
            &self.volume,
            &self.gradient,
            self.camera.as_ref(),
            &self.config,
        )?;
        Ok(tracer.trace(ray))
    }

    fn resize_image(&mut self, resolution: UVec2) {
        let len = resolution.x as usize * resolution.y as usize;
        self.frame_buffer.clear();
        self.frame_buffer.resize(len, Vec4::ZERO);
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("volume", &self.volume)
            .field("config", &self.config)
            .field("frame_buffer_len", &self.frame_buffer.len())
            .finish_non_exhaustive()
    }
}

/// Read-only state of one render pass, shared by all worker threads.
struct Tracer<'a> {
    volume: &'a Volume,
    gradient: &'a GradientVolume,
    camera: &'a dyn RayTraceCamera,
    config: &'a RenderConfig,
    mode: InterpolationMode,
    bounds: Bounds,
    slice_plane: Plane,
}

impl<'a> Tracer<'a> {
    fn new(
        volume: &'a Volume,
        gradient: &'a GradientVolume,
        camera: &'a dyn RayTraceCamera,
        config: &'a RenderConfig,
    ) -> RenderResult<Self> {
        let mode = volume.interpolation_mode()?;
        let bounds = Bounds::from_dims(volume.dims());
        let normal = config.slice_normal.unwrap_or_else(|| camera.forward());
        Ok(Self {
            volume,
            gradient,
            camera,
            config,
            mode,
            bounds,
            slice_plane: Plane::new(bounds.center(), normal),
        })
    }

    fn trace(&self, ray: &Ray) -> Vec4 {
        let Some(ray) = ray.normalized() else {
            return Vec4::ZERO;
        };
        let Some(ray) = self.bounds.clip(&ray) else {
            return Vec4::ZERO;
        };

        let step = self.config.step_size;
        match self.config.render_mode {
            RenderMode::Slicer => self.trace_ray_slice(&ray, &self.slice_plane),
            RenderMode::Mip => self.trace_ray_mip(&ray, step),
            RenderMode::Iso => self.trace_ray_iso(&ray, step),
            RenderMode::Composite => self.trace_ray_composite(&ray, step),
            RenderMode::Tf2d => self.trace_ray_tf2d(&ray, step),
        }
    }

    fn sample(&self, position: Vec3) -> f32 {
        self.volume.sample(position, self.mode)
    }

    /// Maps a value to `[0, 1]` relative to the volume maximum.
    fn grayscale(&self, value: f32) -> Vec4 {
        let maximum = self.volume.maximum();
        let level = if maximum > 0.0 {
            (value / maximum).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Vec3::splat(level).extend(1.0)
    }

    fn trace_ray_slice(&self, ray: &Ray, plane: &Plane) -> Vec4 {
        match plane.intersect(ray) {
            Some(t) if t >= ray.tmin && t <= ray.tmax => self.grayscale(self.sample(ray.at(t))),
            _ => Vec4::ZERO,
        }
    }

    fn trace_ray_mip(&self, ray: &Ray, step: f32) -> Vec4 {
        let max_value = sample_params(ray, step)
            .map(|t| self.sample(ray.at(t)))
            .fold(f32::MIN, f32::max);
        self.grayscale(max_value)
    }

    fn trace_ray_iso(&self, ray: &Ray, step: f32) -> Vec4 {
        let iso_value = self.config.iso_value;
        let mut samples = sample_params(ray, step);
        let Some(first) = samples.next() else {
            return Vec4::ZERO;
        };

        let mut previous_t = first;
        let mut previous_below = self.sample(ray.at(first)) < iso_value;
        for t in samples {
            let below = self.sample(ray.at(t)) < iso_value;
            if below != previous_below {
                let hit = if self.config.bisection {
                    self.bisection_accuracy(ray, previous_t, t, iso_value)
                } else {
                    t
                };
                let color = self.shade(self.config.iso_color, ray.at(hit), ray);
                return color.extend(1.0);
            }
            previous_t = t;
            previous_below = below;
        }
        Vec4::ZERO
    }

    /// Narrows the crossing of `iso_value` bracketed by `[t0, t1]`.
    fn bisection_accuracy(&self, ray: &Ray, t0: f32, t1: f32, iso_value: f32) -> f32 {
        let (mut lo, mut hi) = (t0, t1);
        let lo_below = self.sample(ray.at(lo)) < iso_value;
        for _ in 0..self.config.bisection_iterations {
            if hi - lo <= self.config.bisection_tolerance {
                break;
            }
            let mid = 0.5 * (lo + hi);
            if (self.sample(ray.at(mid)) < iso_value) == lo_below {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        0.5 * (lo + hi)
    }

    fn trace_ray_composite(&self, ray: &Ray, step: f32) -> Vec4 {
        let mut compositor = Compositor::new();
        for t in sample_params(ray, step) {
            let position = ray.at(t);
            let tf = self.tf_value(self.sample(position));
            if tf.w <= 0.0 {
                continue;
            }
            compositor.push(self.shade(tf.truncate(), position, ray), tf.w);
            if compositor.is_saturated(self.config.early_termination_alpha) {
                break;
            }
        }
        compositor.result()
    }

    fn trace_ray_tf2d(&self, ray: &Ray, step: f32) -> Vec4 {
        let base = self.config.tf2d.color.truncate();
        let mut compositor = Compositor::new();
        for t in sample_params(ray, step) {
            let position = ray.at(t);
            let opacity = self.tf2d_opacity(position);
            if opacity <= 0.0 {
                continue;
            }
            compositor.push(self.shade(base, position, ray), opacity);
            if compositor.is_saturated(self.config.early_termination_alpha) {
                break;
            }
        }
        compositor.result()
    }

    fn tf_value(&self, value: f32) -> Vec4 {
        lookup_color_map(
            &self.config.tf_color_map,
            self.config.tf_color_map_index_start,
            self.config.tf_color_map_index_range,
            value,
        )
    }

    fn tf2d_opacity(&self, position: Vec3) -> f32 {
        let max_magnitude = self.gradient.max_magnitude();
        let normalized = if max_magnitude > 0.0 {
            self.gradient.sample(position, self.mode).magnitude / max_magnitude
        } else {
            0.0
        };
        self.config
            .tf2d
            .opacity(self.sample(position), normalized, self.volume.maximum())
    }

    /// Applies headlight Phong shading when enabled.
    fn shade(&self, base: Vec3, position: Vec3, ray: &Ray) -> Vec3 {
        if !self.config.volume_shading {
            return base;
        }
        let view = -ray.direction;
        let gradient = facing(self.gradient.sample(position, self.mode), view);
        phong(base, &gradient, view, view, &self.config.phong)
    }
}

/// Returns the parameters `tmin, tmin + step, ...` up to `tmax`.
///
/// The count is fixed before iterating and capped at [`MAX_SAMPLES_PER_RAY`].
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn sample_params(ray: &Ray, step: f32) -> impl Iterator<Item = f32> {
    let count = if step > 0.0 && ray.span().is_finite() {
        let steps = (ray.span() / step)
            .floor()
            .min((MAX_SAMPLES_PER_RAY - 1) as f32);
        (steps as usize).saturating_add(1)
    } else {
        0
    };
    let tmin = ray.tmin;
    (0..count).map(move |i| tmin + i as f32 * step)
}
