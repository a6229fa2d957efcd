//! Dense scalar volumes and continuous-coordinate sampling.
//!
//! A [`Volume`] stores one `f32` per voxel in x-fastest order. Continuous
//! coordinates use unit spacing, so the integer coordinate `(i, j, k)` is the
//! center of voxel `(i, j, k)` and the grid covers `[0, dim - 1]` on each axis.

use std::fmt;

use glam::{UVec3, Vec2, Vec3};

use crate::error::{Result, VolumeError};
use crate::interpolation::{InterpolationMode, InterpolationSetting};

/// Upper bound on the number of histogram bins.
pub const MAX_HISTOGRAM_BINS: usize = 1 << 16;

/// Parameter of the Keys cubic convolution kernel.
const CUBIC_KERNEL_A: f32 = -0.5;

/// A dense, axis-aligned 3D scalar field.
#[derive(Clone)]
pub struct Volume {
    dim: UVec3,
    data: Vec<f32>,
    minimum: f32,
    maximum: f32,
    histogram: Vec<u32>,
    interpolation: InterpolationSetting,
}

impl Volume {
    /// Creates a volume from raw voxel data.
    ///
    /// # Arguments
    /// * `data` - Voxel values, indexed as `x + dim.x * (y + dim.y * z)`
    /// * `dim` - Number of voxels along X, Y and Z
    ///
    /// # Errors
    /// Returns [`VolumeError::EmptyVolume`] if any dimension is zero and
    /// [`VolumeError::SizeMismatch`] if `data` does not hold exactly one value
    /// per voxel. A voxel count that overflows `usize` is reported as a
    /// mismatch against `usize::MAX`.
    pub fn new(data: Vec<f32>, dim: UVec3) -> Result<Self> {
        let expected = checked_voxel_count(dim, data.len())?;
        if data.len() != expected {
            return Err(VolumeError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        let (minimum, maximum) = compute_range(&data);
        let histogram = compute_histogram(&data, maximum);
        log::debug!(
            "volume {}x{}x{} loaded, range [{minimum}, {maximum}], {} histogram bins",
            dim.x,
            dim.y,
            dim.z,
            histogram.len()
        );

        Ok(Self {
            dim,
            data,
            minimum,
            maximum,
            histogram,
            interpolation: InterpolationSetting::default(),
        })
    }

    /// Creates a volume by evaluating `f(x, y, z)` at every voxel.
    ///
    /// # Errors
    /// Returns [`VolumeError::EmptyVolume`] if any dimension is zero and
    /// [`VolumeError::SizeMismatch`] if the voxel count overflows `usize`.
    pub fn from_fn(dim: UVec3, mut f: impl FnMut(u32, u32, u32) -> f32) -> Result<Self> {
        let mut data = Vec::with_capacity(checked_voxel_count(dim, 0)?);
        for z in 0..dim.z {
            for y in 0..dim.y {
                for x in 0..dim.x {
                    data.push(f(x, y, z));
                }
            }
        }
        Self::new(data, dim)
    }

    /// Returns the number of voxels along each axis.
    #[must_use]
    pub fn dims(&self) -> UVec3 {
        self.dim
    }

    /// Returns the total number of voxels.
    #[must_use]
    pub fn voxel_count(&self) -> usize {
        self.data.len()
    }

    /// Returns the raw voxel data.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the smallest voxel value.
    #[must_use]
    pub fn minimum(&self) -> f32 {
        self.minimum
    }

    /// Returns the largest voxel value.
    #[must_use]
    pub fn maximum(&self) -> f32 {
        self.maximum
    }

    /// Returns the voxel count per truncated integer value in `[0, maximum]`.
    ///
    /// Negative and NaN values are counted in bin 0. Values beyond
    /// [`MAX_HISTOGRAM_BINS`] are counted in the last bin.
    #[must_use]
    pub fn histogram(&self) -> &[u32] {
        &self.histogram
    }

    /// Returns the interpolation setting handle.
    ///
    /// Clones of the handle observe and change the same mode.
    #[must_use]
    pub fn interpolation_setting(&self) -> &InterpolationSetting {
        &self.interpolation
    }

    /// Returns the current interpolation mode.
    pub fn interpolation_mode(&self) -> Result<InterpolationMode> {
        self.interpolation.get()
    }

    /// Sets the interpolation mode (also seen by linked gradient volumes).
    pub fn set_interpolation_mode(&self, mode: InterpolationMode) {
        self.interpolation.set(mode);
    }

    /// Flattens a voxel coordinate to a linear index.
    #[must_use]
    pub fn flatten_index(&self, x: u32, y: u32, z: u32) -> usize {
        flatten_index(self.dim, x, y, z)
    }

    /// Returns the value stored at a voxel.
    ///
    /// The coordinate must lie inside the grid; this is not checked beyond
    /// the slice bounds check.
    #[must_use]
    pub fn get_voxel(&self, x: u32, y: u32, z: u32) -> f32 {
        self.data[self.flatten_index(x, y, z)]
    }

    /// Samples the volume at a continuous coordinate using the current
    /// interpolation mode.
    ///
    /// # Errors
    /// Returns [`VolumeError::UnknownInterpolationMode`] if the shared mode
    /// holds an unknown value.
    pub fn get_sample_interpolate(&self, coord: Vec3) -> Result<f32> {
        Ok(self.sample(coord, self.interpolation.get()?))
    }

    /// Samples the volume with an explicitly chosen interpolation mode.
    #[must_use]
    pub fn sample(&self, coord: Vec3, mode: InterpolationMode) -> f32 {
        match mode {
            InterpolationMode::NearestNeighbour => self.sample_nearest_neighbour(coord),
            InterpolationMode::Linear => self.sample_trilinear(coord),
            InterpolationMode::Cubic => self.sample_tricubic(coord),
        }
    }

    /// Returns the value of the closest voxel, or 0 outside the voxel extent.
    #[must_use]
    pub fn sample_nearest_neighbour(&self, coord: Vec3) -> f32 {
        match nearest_voxel(coord, self.dim) {
            Some(v) => self.get_voxel(v.x, v.y, v.z),
            None => 0.0,
        }
    }

    /// Returns the trilinearly interpolated value, clamping to the edge
    /// voxels outside the grid.
    #[must_use]
    pub fn sample_trilinear(&self, coord: Vec3) -> f32 {
        let (z0, z1, zd) = linear_bounds(coord.z, self.dim.z);
        let xy = Vec2::new(coord.x, coord.y);
        let c0 = self.bilinear_interpolate(xy, z0);
        let c1 = self.bilinear_interpolate(xy, z1);
        linear_interpolate(c0, c1, zd)
    }

    /// Bilinearly interpolates within the voxel slice at integer `z`.
    #[must_use]
    pub fn bilinear_interpolate(&self, xy: Vec2, z: u32) -> f32 {
        let (x0, x1, xd) = linear_bounds(xy.x, self.dim.x);
        let (y0, y1, yd) = linear_bounds(xy.y, self.dim.y);

        let c0 = linear_interpolate(self.get_voxel(x0, y0, z), self.get_voxel(x1, y0, z), xd);
        let c1 = linear_interpolate(self.get_voxel(x0, y1, z), self.get_voxel(x1, y1, z), xd);
        linear_interpolate(c0, c1, yd)
    }

    /// Returns the tricubically interpolated value, or 0 outside the voxel
    /// extent.
    #[must_use]
    pub fn sample_tricubic(&self, coord: Vec3) -> f32 {
        if nearest_voxel(coord, self.dim).is_none() {
            return 0.0;
        }
        let (zs, zf) = cubic_taps(coord.z, self.dim.z);
        let xy = Vec2::new(coord.x, coord.y);
        cubic_interpolate(
            self.bicubic_interpolate(xy, zs[0]),
            self.bicubic_interpolate(xy, zs[1]),
            self.bicubic_interpolate(xy, zs[2]),
            self.bicubic_interpolate(xy, zs[3]),
            zf,
        )
    }

    /// Bicubically interpolates within the voxel slice at integer `z`.
    #[must_use]
    pub fn bicubic_interpolate(&self, xy: Vec2, z: u32) -> f32 {
        let (xs, xf) = cubic_taps(xy.x, self.dim.x);
        let (ys, yf) = cubic_taps(xy.y, self.dim.y);

        let rows = ys.map(|y| {
            cubic_interpolate(
                self.get_voxel(xs[0], y, z),
                self.get_voxel(xs[1], y, z),
                self.get_voxel(xs[2], y, z),
                self.get_voxel(xs[3], y, z),
                xf,
            )
        });
        cubic_interpolate(rows[0], rows[1], rows[2], rows[3], yf)
    }
}

impl fmt::Debug for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Volume")
            .field("dim", &self.dim)
            .field("minimum", &self.minimum)
            .field("maximum", &self.maximum)
            .field("interpolation", &self.interpolation.get())
            .finish_non_exhaustive()
    }
}

/// Linearly interpolates between `g0` (at `factor = 0`) and `g1` (at `factor = 1`).
///
/// Both endpoints are reproduced exactly.
#[must_use]
pub fn linear_interpolate(g0: f32, g1: f32, factor: f32) -> f32 {
    (1.0 - factor) * g0 + factor * g1
}

/// The cubic convolution kernel `h(x)` (Keys, `a = -0.5`).
///
/// `h(0) = 1` and `h` vanishes at every other integer, so cubic
/// interpolation reproduces lattice values exactly.
#[must_use]
pub fn weight(x: f32) -> f32 {
    let a = CUBIC_KERNEL_A;
    let x = x.abs();
    if x < 1.0 {
        (a + 2.0) * x * x * x - (a + 3.0) * x * x + 1.0
    } else if x < 2.0 {
        a * x * x * x - 5.0 * a * x * x + 8.0 * a * x - 4.0 * a
    } else {
        0.0
    }
}

/// Cubic interpolation between `g1` and `g2` using the neighbours `g0`, `g3`.
///
/// `factor` is the fractional position between `g1` and `g2`.
#[must_use]
pub fn cubic_interpolate(g0: f32, g1: f32, g2: f32, g3: f32, factor: f32) -> f32 {
    g0 * weight(-1.0 - factor)
        + g1 * weight(-factor)
        + g2 * weight(1.0 - factor)
        + g3 * weight(2.0 - factor)
}

/// Voxel count of `dim`, which must belong to a constructed volume.
pub(crate) fn voxel_count(dim: UVec3) -> usize {
    dim.x as usize * dim.y as usize * dim.z as usize
}

fn checked_voxel_count(dim: UVec3, actual: usize) -> Result<usize> {
    if dim.cmpeq(UVec3::ZERO).any() {
        return Err(VolumeError::EmptyVolume(dim.x, dim.y, dim.z));
    }
    (dim.x as usize)
        .checked_mul(dim.y as usize)
        .and_then(|count| count.checked_mul(dim.z as usize))
        .ok_or(VolumeError::SizeMismatch {
            expected: usize::MAX,
            actual,
        })
}

pub(crate) fn flatten_index(dim: UVec3, x: u32, y: u32, z: u32) -> usize {
    x as usize + dim.x as usize * (y as usize + dim.y as usize * z as usize)
}

/// Rounds half-up to the closest voxel, or `None` outside `[-0.5, dim - 0.5)`.
pub(crate) fn nearest_voxel(coord: Vec3, dim: UVec3) -> Option<UVec3> {
    let shifted = coord + Vec3::splat(0.5);
    if shifted.cmplt(Vec3::ZERO).any() || shifted.cmpge(dim.as_vec3()).any() {
        return None;
    }
    // Non-negative, so truncation is floor.
    Some(shifted.as_uvec3())
}

/// Returns the clamped lower/upper voxel indices around `c` and the
/// fractional weight of the upper one (0 when clamping collapsed them).
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub(crate) fn linear_bounds(c: f32, size: u32) -> (u32, u32, f32) {
    let max = size as i32 - 1;
    let lower = c.floor() as i32;
    let i0 = lower.clamp(0, max);
    let i1 = lower.saturating_add(1).clamp(0, max);
    let d = if i1 == i0 {
        0.0
    } else {
        (c - i0 as f32) / (i1 - i0) as f32
    };
    (i0 as u32, i1 as u32, d)
}

/// Returns the four clamped voxel indices `floor(c) - 1 ..= floor(c) + 2`
/// and the fractional part of `c`.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn cubic_taps(c: f32, size: u32) -> ([u32; 4], f32) {
    let max = size as i32 - 1;
    let floor = c.floor();
    let base = floor as i32;
    let taps = [-1, 0, 1, 2].map(|o: i32| base.saturating_add(o).clamp(0, max) as u32);
    (taps, c - floor)
}

fn compute_range(data: &[f32]) -> (f32, f32) {
    let mut min = f32::MAX;
    let mut max = f32::MIN;
    for &v in data {
        if !v.is_nan() {
            min = min.min(v);
            max = max.max(v);
        }
    }
    if min > max {
        (0.0, 0.0)
    } else {
        (min, max)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn compute_histogram(data: &[f32], maximum: f32) -> Vec<u32> {
    let top = if maximum > 0.0 { maximum as usize } else { 0 };
    let bins = top.saturating_add(1).min(MAX_HISTOGRAM_BINS);

    let mut histogram = vec![0u32; bins];
    let mut clamped = 0usize;
    for &v in data {
        // NaN and negatives fall through to bin 0.
        let bin = if v > 0.0 { v as usize } else { 0 };
        let bin = if bin >= bins {
            clamped += 1;
            bins - 1
        } else {
            bin
        };
        histogram[bin] = histogram[bin].saturating_add(1);
    }
    if clamped > 0 {
        log::warn!("{clamped} voxel values exceed {bins} histogram bins and were clamped");
    }
    histogram
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ramp_volume(dim: UVec3) -> Volume {
        Volume::from_fn(dim, |x, y, z| (x + 10 * y + 100 * z) as f32).unwrap()
    }

    #[test]
    fn test_volume_creation() {
        let volume = ramp_volume(UVec3::new(3, 4, 5));
        assert_eq!(volume.dims(), UVec3::new(3, 4, 5));
        assert_eq!(volume.voxel_count(), 60);
        assert_eq!(volume.minimum(), 0.0);
        assert_eq!(volume.maximum(), 432.0);
        assert_eq!(volume.get_voxel(2, 3, 4), 432.0);
        assert_eq!(volume.get_voxel(1, 2, 3), 321.0);
        assert_eq!(volume.flatten_index(1, 2, 3), 1 + 3 * (2 + 4 * 3));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(
            Volume::new(vec![], UVec3::new(0, 2, 2)).unwrap_err(),
            VolumeError::EmptyVolume(0, 2, 2)
        );
        assert_eq!(
            Volume::new(vec![0.0; 7], UVec3::splat(2)).unwrap_err(),
            VolumeError::SizeMismatch {
                expected: 8,
                actual: 7
            }
        );
    }

    #[test]
    fn test_rejects_overflowing_dims() {
        assert_eq!(
            Volume::new(vec![0.0; 8], UVec3::splat(u32::MAX)).unwrap_err(),
            VolumeError::SizeMismatch {
                expected: usize::MAX,
                actual: 8
            }
        );
        let mut calls = 0;
        let result = Volume::from_fn(UVec3::splat(u32::MAX), |_, _, _| {
            calls += 1;
            0.0
        });
        assert!(matches!(result, Err(VolumeError::SizeMismatch { .. })));
        assert_eq!(calls, 0);
        assert_eq!(
            Volume::from_fn(UVec3::new(3, 0, u32::MAX), |_, _, _| 0.0).unwrap_err(),
            VolumeError::EmptyVolume(3, 0, u32::MAX)
        );
    }

    #[test]
    fn test_histogram() {
        let volume = Volume::new(vec![0.0, 1.0, 1.5, 3.0, 3.9, 3.0, 0.2, 1.0], UVec3::splat(2))
            .unwrap();
        assert_eq!(volume.histogram(), &[2, 3, 0, 3]);
        assert_eq!(volume.histogram().iter().sum::<u32>(), 8);
    }

    #[test]
    fn test_histogram_negative_and_nan_values() {
        let volume = Volume::new(vec![-4.0, f32::NAN, 2.0, 0.5], UVec3::new(4, 1, 1)).unwrap();
        assert_eq!(volume.minimum(), -4.0);
        assert_eq!(volume.maximum(), 2.0);
        assert_eq!(volume.histogram(), &[3, 0, 1]);
    }

    #[test]
    fn test_histogram_is_capped() {
        let volume = Volume::new(vec![0.0, 1.0e9], UVec3::new(2, 1, 1)).unwrap();
        assert_eq!(volume.histogram().len(), MAX_HISTOGRAM_BINS);
        assert_eq!(volume.histogram()[MAX_HISTOGRAM_BINS - 1], 1);
    }

    #[test]
    fn test_linear_interpolate_endpoints() {
        assert_eq!(linear_interpolate(0.1, 1.0e8, 0.0), 0.1);
        assert_eq!(linear_interpolate(0.1, 1.0e8, 1.0), 1.0e8);
        assert!((linear_interpolate(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_cubic_kernel() {
        assert_eq!(weight(0.0), 1.0);
        assert_eq!(weight(1.0), 0.0);
        assert_eq!(weight(-1.0), 0.0);
        assert_eq!(weight(2.0), 0.0);
        assert_eq!(weight(-2.5), 0.0);
        // Weights form a partition of unity.
        for f in [0.0_f32, 0.25, 0.5, 0.9] {
            let sum = weight(-1.0 - f) + weight(-f) + weight(1.0 - f) + weight(2.0 - f);
            assert!((sum - 1.0).abs() < 1e-5, "sum {sum} at {f}");
        }
        assert!((cubic_interpolate(1.0, 1.0, 1.0, 1.0, 0.3) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_nearest_neighbour() {
        let volume = ramp_volume(UVec3::new(3, 4, 5));
        assert_eq!(volume.sample_nearest_neighbour(Vec3::new(1.4, 2.5, 3.0)), 331.0);
        assert_eq!(volume.sample_nearest_neighbour(Vec3::new(-0.4, 0.0, 0.0)), 0.0);
        assert_eq!(volume.sample_nearest_neighbour(Vec3::new(2.4, 0.0, 0.0)), 2.0);
        // Outside the half-voxel extension.
        assert_eq!(volume.sample_nearest_neighbour(Vec3::new(2.5, 1.0, 1.0)), 0.0);
        assert_eq!(volume.sample_nearest_neighbour(Vec3::new(1.0, -0.6, 1.0)), 0.0);
    }

    #[test]
    fn test_trilinear_on_linear_field() {
        let volume = ramp_volume(UVec3::new(4, 4, 4));
        let value = volume.sample_trilinear(Vec3::new(1.25, 2.5, 0.75));
        assert!((value - (1.25 + 25.0 + 75.0)).abs() < 1e-3);
    }

    #[test]
    fn test_trilinear_clamps_to_edge() {
        let volume = ramp_volume(UVec3::new(4, 4, 4));
        assert_eq!(volume.sample_trilinear(Vec3::new(-0.4, 0.0, 0.0)), 0.0);
        assert_eq!(volume.sample_trilinear(Vec3::new(3.4, 3.0, 3.0)), 333.0);
        assert_eq!(volume.sample_trilinear(Vec3::new(10.0, -10.0, 1.0)), 103.0);
    }

    #[test]
    fn test_all_zero_volume() {
        let volume = Volume::new(vec![0.0; 125], UVec3::splat(5)).unwrap();
        assert_eq!(volume.sample_trilinear(Vec3::splat(2.5)), 0.0);
        assert_eq!(volume.sample_tricubic(Vec3::splat(2.5)), 0.0);
        assert_eq!(volume.bicubic_interpolate(Vec2::splat(2.5), 2), 0.0);
        assert_eq!(volume.histogram(), &[125]);
    }

    #[test]
    fn test_tricubic_reproduces_linear_field() {
        let volume = ramp_volume(UVec3::new(6, 6, 6));
        let coord = Vec3::new(2.3, 2.6, 2.5);
        let value = volume.sample_tricubic(coord);
        let expected = coord.x + 10.0 * coord.y + 100.0 * coord.z;
        assert!((value - expected).abs() < 1e-2, "{value} vs {expected}");
        assert_eq!(volume.sample_tricubic(Vec3::new(-1.0, 2.0, 2.0)), 0.0);
    }

    #[test]
    fn test_sample_interpolate_dispatch() {
        let volume = ramp_volume(UVec3::new(4, 4, 4));
        let coord = Vec3::new(1.5, 1.0, 1.0);
        assert_eq!(volume.get_sample_interpolate(coord), Ok(112.0));
        volume.set_interpolation_mode(InterpolationMode::Linear);
        assert_eq!(volume.get_sample_interpolate(coord), Ok(111.5));
        volume.set_interpolation_mode(InterpolationMode::Cubic);
        let cubic = volume.get_sample_interpolate(coord).unwrap();
        assert!((cubic - 111.5).abs() < 1e-3);
    }

    proptest! {
        #[test]
        fn prop_lattice_points_are_exact(
            x in 0u32..5, y in 0u32..5, z in 0u32..5,
            seed in 0u32..1000,
        ) {
            let volume = Volume::from_fn(UVec3::splat(5), |i, j, k| {
                ((i * 7 + j * 13 + k * 29 + seed) % 97) as f32
            }).unwrap();
            let coord = UVec3::new(x, y, z).as_vec3();
            let stored = volume.get_voxel(x, y, z);
            prop_assert_eq!(volume.sample_trilinear(coord), stored);
            prop_assert_eq!(volume.sample_tricubic(coord), stored);
            prop_assert_eq!(volume.sample_nearest_neighbour(coord), stored);
        }

        #[test]
        fn prop_trilinear_is_bounded(
            cx in -2.0f32..7.0, cy in -2.0f32..7.0, cz in -2.0f32..7.0,
        ) {
            let volume = Volume::from_fn(UVec3::splat(5), |i, j, k| ((i ^ j ^ k) % 4) as f32).unwrap();
            let v = volume.sample_trilinear(Vec3::new(cx, cy, cz));
            prop_assert!(v >= volume.minimum() - 1e-4 && v <= volume.maximum() + 1e-4);
        }
    }
}
