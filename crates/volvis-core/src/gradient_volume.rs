//! Gradient fields derived from a [`Volume`] by central differences.

use std::fmt;

use glam::{UVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::interpolation::{InterpolationMode, InterpolationSetting};
use crate::volume::{flatten_index, linear_bounds, nearest_voxel, voxel_count, Volume};

/// A gradient sample: direction plus magnitude.
///
/// Stored voxels satisfy `magnitude == direction.length()`. Interpolated
/// samples interpolate both fields independently, so the two may disagree.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GradientVoxel {
    /// Gradient vector, pointing towards increasing values.
    pub direction: Vec3,
    /// Gradient magnitude.
    pub magnitude: f32,
}

impl GradientVoxel {
    /// The zero gradient.
    pub const ZERO: GradientVoxel = GradientVoxel {
        direction: Vec3::ZERO,
        magnitude: 0.0,
    };

    /// Creates a gradient voxel whose magnitude is the length of `direction`.
    #[must_use]
    pub fn from_direction(direction: Vec3) -> Self {
        Self {
            direction,
            magnitude: direction.length(),
        }
    }

    /// Linearly interpolates direction and magnitude separately.
    ///
    /// `factor = 0` returns `self` and `factor = 1` returns `other` exactly.
    #[must_use]
    pub fn lerp(self, other: GradientVoxel, factor: f32) -> GradientVoxel {
        GradientVoxel {
            direction: self.direction * (1.0 - factor) + other.direction * factor,
            magnitude: self.magnitude * (1.0 - factor) + other.magnitude * factor,
        }
    }
}

/// Per-voxel gradients of a scalar volume.
///
/// Built once from a snapshot of the source volume; later changes to the
/// source are not observed.
#[derive(Clone)]
pub struct GradientVolume {
    dim: UVec3,
    data: Vec<GradientVoxel>,
    min_magnitude: f32,
    max_magnitude: f32,
    interpolation: InterpolationSetting,
}

impl GradientVolume {
    /// Computes the gradient field of `volume`.
    ///
    /// The returned field shares the volume's interpolation setting.
    #[must_use]
    pub fn new(volume: &Volume) -> Self {
        Self::with_interpolation(volume, volume.interpolation_setting().clone())
    }

    /// Computes the gradient field of `volume` with its own interpolation
    /// setting.
    #[must_use]
    pub fn with_interpolation(volume: &Volume, interpolation: InterpolationSetting) -> Self {
        let dim = volume.dims();
        let data = compute_gradients(volume);
        let (min_magnitude, max_magnitude) = data.iter().fold(
            (f32::MAX, f32::MIN),
            |(lo, hi), g| (lo.min(g.magnitude), hi.max(g.magnitude)),
        );
        log::debug!(
            "gradient volume {}x{}x{} computed, magnitude range [{min_magnitude}, {max_magnitude}]",
            dim.x,
            dim.y,
            dim.z
        );
        Self {
            dim,
            data,
            min_magnitude,
            max_magnitude,
            interpolation,
        }
    }

    /// Returns the number of voxels along each axis.
    #[must_use]
    pub fn dims(&self) -> UVec3 {
        self.dim
    }

    /// Returns the smallest gradient magnitude, border voxels included.
    #[must_use]
    pub fn min_magnitude(&self) -> f32 {
        self.min_magnitude
    }

    /// Returns the largest gradient magnitude.
    #[must_use]
    pub fn max_magnitude(&self) -> f32 {
        self.max_magnitude
    }

    /// Returns the interpolation setting handle.
    #[must_use]
    pub fn interpolation_setting(&self) -> &InterpolationSetting {
        &self.interpolation
    }

    /// Returns the current interpolation mode.
    pub fn interpolation_mode(&self) -> Result<InterpolationMode> {
        self.interpolation.get()
    }

    /// Sets the interpolation mode.
    pub fn set_interpolation_mode(&self, mode: InterpolationMode) {
        self.interpolation.set(mode);
    }

    /// Returns the stored gradient of a voxel.
    #[must_use]
    pub fn get_gradient(&self, x: u32, y: u32, z: u32) -> GradientVoxel {
        self.data[flatten_index(self.dim, x, y, z)]
    }

    /// Samples the gradient at a continuous coordinate using the current
    /// interpolation mode.
    pub fn get_gradient_interpolate(&self, coord: Vec3) -> Result<GradientVoxel> {
        Ok(self.sample(coord, self.interpolation.get()?))
    }

    /// Samples the gradient with an explicitly chosen interpolation mode.
    ///
    /// Cubic reconstruction is not offered for gradients; it uses linear.
    #[must_use]
    pub fn sample(&self, coord: Vec3, mode: InterpolationMode) -> GradientVoxel {
        match mode {
            InterpolationMode::NearestNeighbour => self.sample_nearest_neighbour(coord),
            InterpolationMode::Linear | InterpolationMode::Cubic => self.sample_trilinear(coord),
        }
    }

    /// Returns the gradient of the closest voxel, or zero outside.
    #[must_use]
    pub fn sample_nearest_neighbour(&self, coord: Vec3) -> GradientVoxel {
        nearest_voxel(coord, self.dim).map_or(GradientVoxel::ZERO, |v| {
            self.get_gradient(v.x, v.y, v.z)
        })
    }

    /// Trilinearly interpolates direction and magnitude, clamping to the edge.
    #[must_use]
    pub fn sample_trilinear(&self, coord: Vec3) -> GradientVoxel {
        let (x0, x1, xd) = linear_bounds(coord.x, self.dim.x);
        let (y0, y1, yd) = linear_bounds(coord.y, self.dim.y);
        let (z0, z1, zd) = linear_bounds(coord.z, self.dim.z);

        let c00 = self.get_gradient(x0, y0, z0).lerp(self.get_gradient(x1, y0, z0), xd);
        let c10 = self.get_gradient(x0, y1, z0).lerp(self.get_gradient(x1, y1, z0), xd);
        let c01 = self.get_gradient(x0, y0, z1).lerp(self.get_gradient(x1, y0, z1), xd);
        let c11 = self.get_gradient(x0, y1, z1).lerp(self.get_gradient(x1, y1, z1), xd);

        let c0 = c00.lerp(c10, yd);
        let c1 = c01.lerp(c11, yd);
        c0.lerp(c1, zd)
    }
}

impl fmt::Debug for GradientVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GradientVolume")
            .field("dim", &self.dim)
            .field("min_magnitude", &self.min_magnitude)
            .field("max_magnitude", &self.max_magnitude)
            .finish_non_exhaustive()
    }
}

fn compute_gradients(volume: &Volume) -> Vec<GradientVoxel> {
    let dim = volume.dims();
    let mut out = vec![GradientVoxel::ZERO; voxel_count(dim)];
    // Face voxels keep the zero gradient.
    for z in 1..dim.z.saturating_sub(1) {
        for y in 1..dim.y.saturating_sub(1) {
            for x in 1..dim.x.saturating_sub(1) {
                let g = Vec3::new(
                    (volume.get_voxel(x + 1, y, z) - volume.get_voxel(x - 1, y, z)) / 2.0,
                    (volume.get_voxel(x, y + 1, z) - volume.get_voxel(x, y - 1, z)) / 2.0,
                    (volume.get_voxel(x, y, z + 1) - volume.get_voxel(x, y, z - 1)) / 2.0,
                );
                out[flatten_index(dim, x, y, z)] = GradientVoxel::from_direction(g);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn impulse_volume() -> Volume {
        Volume::from_fn(UVec3::splat(5), |x, y, z| {
            if (x, y, z) == (2, 2, 2) {
                1.0
            } else {
                0.0
            }
        })
        .unwrap()
    }

    #[test]
    fn test_impulse_gradient_stencil() {
        let volume = impulse_volume();
        let gradient = GradientVolume::new(&volume);

        let neighbours = [
            ((1, 2, 2), Vec3::new(0.5, 0.0, 0.0)),
            ((3, 2, 2), Vec3::new(-0.5, 0.0, 0.0)),
            ((2, 1, 2), Vec3::new(0.0, 0.5, 0.0)),
            ((2, 3, 2), Vec3::new(0.0, -0.5, 0.0)),
            ((2, 2, 1), Vec3::new(0.0, 0.0, 0.5)),
            ((2, 2, 3), Vec3::new(0.0, 0.0, -0.5)),
        ];
        for ((x, y, z), expected) in neighbours {
            let g = gradient.get_gradient(x, y, z);
            assert_eq!(g.direction, expected, "at ({x}, {y}, {z})");
            assert_eq!(g.magnitude, 0.5);
        }

        let mut non_zero = 0;
        for z in 0..5 {
            for y in 0..5 {
                for x in 0..5 {
                    let g = gradient.get_gradient(x, y, z);
                    if g != GradientVoxel::ZERO {
                        non_zero += 1;
                    }
                    let on_border = [x, y, z].iter().any(|&c| c == 0 || c == 4);
                    if on_border {
                        assert_eq!(g, GradientVoxel::ZERO);
                    }
                }
            }
        }
        assert_eq!(non_zero, 6);
        assert_eq!(gradient.min_magnitude(), 0.0);
        assert_eq!(gradient.max_magnitude(), 0.5);
    }

    #[test]
    fn test_single_voxel_volume() {
        let volume = Volume::new(vec![1.0], UVec3::ONE).unwrap();
        let gradient = GradientVolume::new(&volume);
        assert_eq!(gradient.get_gradient(0, 0, 0), GradientVoxel::ZERO);
        assert_eq!(gradient.sample_trilinear(Vec3::splat(100.0)), GradientVoxel::ZERO);
        assert_eq!(gradient.max_magnitude(), 0.0);
    }

    #[test]
    fn test_lattice_point_returns_stored_gradient() {
        let volume = Volume::from_fn(UVec3::splat(6), |x, y, z| (x * x + 2 * y + z * y) as f32)
            .unwrap();
        let gradient = GradientVolume::new(&volume);
        for (x, y, z) in [(1, 1, 1), (2, 3, 4), (4, 2, 1)] {
            let stored = gradient.get_gradient(x, y, z);
            let sampled = gradient.sample_trilinear(UVec3::new(x, y, z).as_vec3());
            assert_eq!(sampled, stored);
        }
        // Central difference of x^2 at x = 2.
        assert_eq!(gradient.get_gradient(2, 3, 4).direction.x, 4.0);
    }

    #[test]
    fn test_interpolated_magnitude_is_not_renormalized() {
        let a = GradientVoxel::from_direction(Vec3::X);
        let b = GradientVoxel::from_direction(Vec3::NEG_X);
        let mid = a.lerp(b, 0.5);
        assert_eq!(mid.direction, Vec3::ZERO);
        assert_eq!(mid.magnitude, 1.0);
    }

    #[test]
    fn test_cubic_falls_back_to_linear() {
        let volume = impulse_volume();
        let gradient = GradientVolume::new(&volume);
        let coord = Vec3::new(1.5, 2.0, 2.25);
        assert_eq!(
            gradient.sample(coord, InterpolationMode::Cubic),
            gradient.sample(coord, InterpolationMode::Linear)
        );
    }

    #[test]
    fn test_nearest_neighbour_outside_is_zero() {
        let gradient = GradientVolume::new(&impulse_volume());
        assert_eq!(
            gradient.sample_nearest_neighbour(Vec3::new(1.2, 2.4, 2.0)),
            gradient.get_gradient(1, 2, 2)
        );
        assert_eq!(
            gradient.sample_nearest_neighbour(Vec3::new(-1.0, 2.0, 2.0)),
            GradientVoxel::ZERO
        );
    }

    #[test]
    fn test_interpolation_setting_is_shared() {
        let volume = impulse_volume();
        let gradient = GradientVolume::new(&volume);
        volume.set_interpolation_mode(InterpolationMode::Linear);
        assert_eq!(gradient.interpolation_mode(), Ok(InterpolationMode::Linear));

        let detached = GradientVolume::with_interpolation(&volume, InterpolationSetting::default());
        volume.set_interpolation_mode(InterpolationMode::Cubic);
        assert_eq!(
            detached.interpolation_mode(),
            Ok(InterpolationMode::NearestNeighbour)
        );
    }

    proptest! {
        #[test]
        fn prop_lerp_endpoints(
            ax in -1e3f32..1e3, ay in -1e3f32..1e3, am in 0f32..1e3,
            bx in -1e3f32..1e3, by in -1e3f32..1e3, bm in 0f32..1e3,
        ) {
            let g0 = GradientVoxel { direction: Vec3::new(ax, ay, 0.0), magnitude: am };
            let g1 = GradientVoxel { direction: Vec3::new(bx, by, 1.0), magnitude: bm };
            prop_assert_eq!(g0.lerp(g1, 0.0), g0);
            prop_assert_eq!(g0.lerp(g1, 1.0), g1);
        }
    }
}
