//! Render configuration.

use glam::{UVec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};
use crate::transfer_function::TransferFunction;

/// Smallest march step accepted by [`RenderConfig::validate`], in world units.
pub const MIN_STEP_SIZE: f32 = 1e-3;

/// Which ray casting algorithm to run per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RenderMode {
    /// Single plane through the volume center, no transfer function.
    #[default]
    Slicer,
    /// Maximum intensity projection.
    Mip,
    /// First-hit isosurface.
    Iso,
    /// Front-to-back compositing with the 1D transfer function.
    Composite,
    /// Compositing with the gradient-aware 2D transfer function.
    Tf2d,
}

impl RenderMode {
    /// All modes, in UI order.
    pub const ALL: [RenderMode; 5] = [
        RenderMode::Slicer,
        RenderMode::Mip,
        RenderMode::Iso,
        RenderMode::Composite,
        RenderMode::Tf2d,
    ];

    /// Returns display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            RenderMode::Slicer => "Slicer",
            RenderMode::Mip => "MIP",
            RenderMode::Iso => "IsoSurface Rendering",
            RenderMode::Composite => "Compositing",
            RenderMode::Tf2d => "2D Transfer Function",
        }
    }
}

/// Phong illumination coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhongParams {
    /// Ambient reflection coefficient.
    pub ambient: f32,
    /// Diffuse reflection coefficient.
    pub diffuse: f32,
    /// Specular reflection coefficient.
    pub specular: f32,
    /// Specular exponent.
    pub shininess: f32,
}

impl Default for PhongParams {
    fn default() -> Self {
        Self {
            ambient: 0.1,
            diffuse: 0.7,
            specular: 0.2,
            shininess: 25.0,
        }
    }
}

/// Parameters of the 2D transfer function over (scalar value, gradient magnitude).
///
/// The gradient magnitude axis is normalized to `[0, 1]` and stretched to the
/// volume's value extent, so `radius` is measured in scalar value units along
/// both axes. Samples within `radius` of the center get the full `color.w`;
/// beyond it the opacity falls linearly to zero at twice the radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tf2dParams {
    /// RGB color and opacity.
    pub color: Vec4,
    /// Radius of the fully opaque region, in scalar value units.
    pub radius: f32,
    /// Scalar value of the center.
    pub intensity: f32,
    /// Normalized gradient magnitude of the center.
    pub magnitude: f32,
}

impl Tf2dParams {
    /// Returns the opacity of a sample with scalar `value` and gradient
    /// magnitude normalized to `[0, 1]`.
    ///
    /// `value_extent` is the length of the scalar value axis that the
    /// magnitude axis is stretched to, usually the volume maximum.
    #[must_use]
    pub fn opacity(&self, value: f32, normalized_magnitude: f32, value_extent: f32) -> f32 {
        let distance = (value - self.intensity)
            .hypot((normalized_magnitude - self.magnitude) * value_extent.max(0.0));
        if distance <= self.radius {
            return self.color.w;
        }
        if !(self.radius > 0.0) {
            return 0.0;
        }
        // NaN distances land here and `max` maps them to zero.
        self.color.w * (1.0 - (distance - self.radius) / self.radius).max(0.0)
    }
}

impl Default for Tf2dParams {
    fn default() -> Self {
        Self {
            color: Vec4::new(0.0, 0.8, 0.6, 0.3),
            radius: 40.0,
            intensity: 150.0,
            magnitude: 0.5,
        }
    }
}

/// Configuration of a [`Renderer`](crate::Renderer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Ray casting algorithm.
    pub render_mode: RenderMode,

    /// Whether to apply Phong shading in the iso, composite and 2D modes.
    pub volume_shading: bool,

    /// Threshold of the isosurface.
    pub iso_value: f32,

    /// Flat color of the isosurface.
    pub iso_color: Vec3,

    /// Whether to refine isosurface hits by bisection.
    pub bisection: bool,

    /// Maximum number of bisection steps.
    ///
    /// Each step halves the bracket, so 10 steps resolve a hit to about a
    /// thousandth of the march step.
    pub bisection_iterations: u32,

    /// Bisection stops early once the bracket is narrower than this.
    pub bisection_tolerance: f32,

    /// Distance between samples along a ray, in voxels.
    ///
    /// Smaller steps miss fewer features but cost proportionally more samples.
    pub step_size: f32,

    /// Size of the framebuffer in pixels.
    pub render_resolution: UVec2,

    /// RGBA table of the 1D transfer function.
    pub tf_color_map: Vec<Vec4>,

    /// Scalar value mapped to the first table entry.
    pub tf_color_map_index_start: f32,

    /// Range of scalar values spanned by the table.
    pub tf_color_map_index_range: f32,

    /// 2D transfer function parameters.
    pub tf2d: Tf2dParams,

    /// Shading coefficients.
    pub phong: PhongParams,

    /// Accumulated opacity above which compositing stops.
    pub early_termination_alpha: f32,

    /// Normal of the slicing plane; the camera forward vector when `None`.
    pub slice_normal: Option<Vec3>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let transfer_function = TransferFunction::new(0.0, 255.0);
        Self {
            render_mode: RenderMode::Slicer,
            volume_shading: false,
            iso_value: 95.0,
            iso_color: Vec3::new(0.8, 0.8, 0.2),
            bisection: false,
            bisection_iterations: 10,
            bisection_tolerance: 1e-3,
            step_size: 1.0,
            render_resolution: UVec2::new(720, 720),
            tf_color_map: transfer_function.color_map().to_vec(),
            tf_color_map_index_start: transfer_function.min_value(),
            tf_color_map_index_range: transfer_function.value_range(),
            tf2d: Tf2dParams::default(),
            phong: PhongParams::default(),
            early_termination_alpha: 0.99,
            slice_normal: None,
        }
    }
}

impl RenderConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the render mode.
    pub fn with_render_mode(mut self, mode: RenderMode) -> Self {
        self.render_mode = mode;
        self
    }

    /// Sets whether shading is applied.
    pub fn with_shading(mut self, enabled: bool) -> Self {
        self.volume_shading = enabled;
        self
    }

    /// Sets the isosurface threshold.
    pub fn with_iso_value(mut self, iso_value: f32) -> Self {
        self.iso_value = iso_value;
        self
    }

    /// Enables or disables bisection refinement.
    pub fn with_bisection(mut self, enabled: bool) -> Self {
        self.bisection = enabled;
        self
    }

    /// Sets the march step size.
    pub fn with_step_size(mut self, step_size: f32) -> Self {
        self.step_size = step_size;
        self
    }

    /// Sets the framebuffer resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.render_resolution = UVec2::new(width, height);
        self
    }

    /// Sets the 2D transfer function parameters.
    pub fn with_tf2d(mut self, tf2d: Tf2dParams) -> Self {
        self.tf2d = tf2d;
        self
    }

    /// Parses a configuration from JSON. Missing fields take default values.
    pub fn from_json(json: &str) -> RenderResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to pretty-printed JSON.
    pub fn to_json(&self) -> RenderResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks that every value is usable by the renderer.
    ///
    /// # Errors
    /// Returns [`RenderError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> RenderResult<()> {
        fn invalid(message: String) -> RenderResult<()> {
            Err(RenderError::InvalidConfig(message))
        }

        if !(self.step_size.is_finite() && self.step_size >= MIN_STEP_SIZE) {
            return invalid(format!(
                "step_size must be at least {MIN_STEP_SIZE}, got {}",
                self.step_size
            ));
        }
        if self.render_resolution.x == 0 || self.render_resolution.y == 0 {
            return invalid(format!(
                "render_resolution must be non-zero, got {}x{}",
                self.render_resolution.x, self.render_resolution.y
            ));
        }
        if self.tf_color_map.is_empty() {
            return invalid("tf_color_map is empty".to_string());
        }
        if !(self.tf_color_map_index_range.is_finite() && self.tf_color_map_index_range > 0.0) {
            return invalid(format!(
                "tf_color_map_index_range must be positive, got {}",
                self.tf_color_map_index_range
            ));
        }
        if !self.tf_color_map_index_start.is_finite() {
            return invalid("tf_color_map_index_start must be finite".to_string());
        }
        if self.bisection_iterations == 0 {
            return invalid("bisection_iterations must be at least 1".to_string());
        }
        if !(self.bisection_tolerance.is_finite() && self.bisection_tolerance >= 0.0) {
            return invalid(format!(
                "bisection_tolerance must be non-negative, got {}",
                self.bisection_tolerance
            ));
        }
        if !(self.early_termination_alpha > 0.0 && self.early_termination_alpha <= 1.0) {
            return invalid(format!(
                "early_termination_alpha must be in (0, 1], got {}",
                self.early_termination_alpha
            ));
        }
        if !(self.tf2d.radius.is_finite() && self.tf2d.radius >= 0.0) {
            return invalid(format!("tf2d.radius must be non-negative, got {}", self.tf2d.radius));
        }
        if let Some(normal) = self.slice_normal {
            if normal.try_normalize().is_none() {
                return invalid(format!("slice_normal must be a non-zero vector, got {normal}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_config_default() {
        let config = RenderConfig::default();
        assert_eq!(config.render_mode, RenderMode::Slicer);
        assert_eq!(config.step_size, 1.0);
        assert_eq!(config.tf_color_map.len(), 256);
        assert_eq!(config.tf_color_map_index_range, 255.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_render_config_builder() {
        let config = RenderConfig::new()
            .with_render_mode(RenderMode::Iso)
            .with_iso_value(12.5)
            .with_bisection(true)
            .with_resolution(64, 32);
        assert_eq!(config.render_mode, RenderMode::Iso);
        assert_eq!(config.iso_value, 12.5);
        assert!(config.bisection);
        assert_eq!(config.render_resolution, UVec2::new(64, 32));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        for step in [0.0, -1.0, 1e-30, MIN_STEP_SIZE / 2.0, f32::NAN, f32::INFINITY] {
            let config = RenderConfig::new().with_step_size(step);
            assert!(matches!(config.validate(), Err(RenderError::InvalidConfig(_))));
        }
        assert!(RenderConfig::new().with_step_size(MIN_STEP_SIZE).validate().is_ok());
        assert!(RenderConfig::new().with_resolution(0, 10).validate().is_err());

        let mut config = RenderConfig::new();
        config.tf_color_map_index_range = 0.0;
        assert!(config.validate().is_err());

        let mut config = RenderConfig::new();
        config.bisection_iterations = 0;
        assert!(config.validate().is_err());

        let mut config = RenderConfig::new();
        config.slice_normal = Some(Vec3::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tf2d_plateau_and_taper() {
        let tf2d = Tf2dParams {
            color: Vec4::new(1.0, 0.0, 0.0, 1.0),
            radius: 40.0,
            intensity: 100.0,
            magnitude: 0.5,
        };
        // Everything within the radius is fully opaque.
        assert_eq!(tf2d.opacity(100.0, 0.5, 40.0), 1.0);
        assert_eq!(tf2d.opacity(100.0, 0.0, 40.0), 1.0);
        assert_eq!(tf2d.opacity(110.0, 0.5, 40.0), 1.0);
        assert_eq!(tf2d.opacity(120.0, 1.0, 40.0), 1.0);
        assert_eq!(tf2d.opacity(140.0, 0.5, 40.0), 1.0);
        // Outside it the opacity falls off linearly over one more radius.
        assert_eq!(tf2d.opacity(160.0, 0.5, 40.0), 0.5);
        assert_eq!(tf2d.opacity(40.0, 0.5, 40.0), 0.5);
        assert_eq!(tf2d.opacity(180.0, 0.5, 40.0), 0.0);
        assert_eq!(tf2d.opacity(250.0, 0.5, 40.0), 0.0);
        // The magnitude axis is measured in value units.
        assert_eq!(tf2d.opacity(100.0, 1.0, 120.0), 0.5);
        assert_eq!(tf2d.opacity(100.0, f32::NAN, 40.0), 0.0);
    }

    #[test]
    fn test_tf2d_zero_radius() {
        let tf2d = Tf2dParams {
            color: Vec4::new(1.0, 1.0, 1.0, 0.3),
            radius: 0.0,
            intensity: 10.0,
            magnitude: 0.0,
        };
        assert_eq!(tf2d.opacity(10.0, 0.0, 100.0), 0.3);
        assert_eq!(tf2d.opacity(10.5, 0.0, 100.0), 0.0);
    }

    #[test]
    fn test_tf2d_missing_magnitude_uses_default() {
        let json = r#"{ "color": [1.0, 0.0, 0.0, 1.0], "radius": 10.0, "intensity": 5.0 }"#;
        let tf2d: Tf2dParams = serde_json::from_str(json).unwrap();
        assert_eq!(tf2d.magnitude, Tf2dParams::default().magnitude);
        assert_eq!(tf2d.radius, 10.0);
    }

    #[test]
    fn test_json_round_trip() {
        let config = RenderConfig::new()
            .with_render_mode(RenderMode::Tf2d)
            .with_shading(true)
            .with_step_size(0.5);
        let json = config.to_json().unwrap();
        let parsed = RenderConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_json_partial_and_invalid() {
        let parsed = RenderConfig::from_json(r#"{ "render_mode": "Mip", "step_size": 0.25 }"#)
            .unwrap();
        assert_eq!(parsed.render_mode, RenderMode::Mip);
        assert_eq!(parsed.step_size, 0.25);
        assert_eq!(parsed.iso_value, RenderConfig::default().iso_value);

        assert!(matches!(
            RenderConfig::from_json(r#"{ "render_mode": "Hologram" }"#),
            Err(RenderError::Json(_))
        ));
        assert!(matches!(
            RenderConfig::from_json(r#"{ "step_size": -2.0 }"#),
            Err(RenderError::InvalidConfig(_))
        ));
    }
}
