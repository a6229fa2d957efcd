//! Integration tests for volume and gradient sampling.

use proptest::prelude::*;
use volvis::*;

fn ramp_volume(dim: UVec3) -> Volume {
    Volume::from_fn(dim, |x, y, z| (x + 3 * y + 7 * z) as f32).unwrap()
}

#[test]
fn test_all_zero_volume_samples_zero() {
    let volume = Volume::new(vec![0.0; 125], UVec3::splat(5)).unwrap();
    let center = Vec3::splat(2.5);
    assert_eq!(volume.sample(center, InterpolationMode::Linear), 0.0);
    assert_eq!(volume.sample(center, InterpolationMode::Cubic), 0.0);
    assert_eq!(volume.sample(center, InterpolationMode::NearestNeighbour), 0.0);
}

#[test]
fn test_interpolation_mode_follows_shared_setting() {
    let dataset = Dataset::new(ramp_volume(UVec3::splat(4)));
    let coord = Vec3::new(1.25, 1.0, 1.0);

    dataset.set_interpolation_mode(InterpolationMode::NearestNeighbour);
    assert_eq!(dataset.volume().get_sample_interpolate(coord).unwrap(), 11.0);

    dataset.set_interpolation_mode(InterpolationMode::Linear);
    let value = dataset.volume().get_sample_interpolate(coord).unwrap();
    assert!((value - 11.25).abs() < 1e-5);

    // Interior gradients of a linear ramp are constant.
    let gradient = dataset
        .gradient_volume()
        .get_gradient_interpolate(Vec3::new(1.5, 1.5, 1.5))
        .unwrap();
    assert!((gradient.direction - Vec3::new(1.0, 3.0, 7.0)).length() < 1e-5);
}

#[test]
fn test_single_voxel_gradient_stencil() {
    let volume = Volume::from_fn(UVec3::splat(5), |x, y, z| {
        if (x, y, z) == (2, 2, 2) {
            1.0
        } else {
            0.0
        }
    })
    .unwrap();
    let gradients = GradientVolume::new(&volume);

    let mut non_zero = Vec::new();
    for z in 0..5 {
        for y in 0..5 {
            for x in 0..5 {
                if gradients.get_gradient(x, y, z).magnitude > 0.0 {
                    non_zero.push((x, y, z));
                }
            }
        }
    }
    non_zero.sort_unstable();
    assert_eq!(
        non_zero,
        vec![
            (1, 2, 2),
            (2, 1, 2),
            (2, 2, 1),
            (2, 2, 3),
            (2, 3, 2),
            (3, 2, 2)
        ]
    );
    assert_eq!(gradients.max_magnitude(), 0.5);
}

#[test]
fn test_histogram_counts_every_voxel() {
    let volume = Volume::new(vec![-3.0, 0.5, 1.9, 2.0, 2.0, 7.0], UVec3::new(3, 2, 1)).unwrap();
    let histogram = volume.histogram();
    assert_eq!(histogram.len(), 8);
    assert_eq!(histogram.iter().sum::<u32>(), 6);
    assert_eq!(histogram[0], 2);
    assert_eq!(histogram[1], 1);
    assert_eq!(histogram[2], 2);
    assert_eq!(histogram[7], 1);
}

proptest! {
    #[test]
    fn lattice_points_are_exact(x in 1u32..5, y in 1u32..5, z in 1u32..5) {
        let volume = ramp_volume(UVec3::splat(6));
        let coord = UVec3::new(x, y, z).as_vec3();
        let stored = volume.get_voxel(x, y, z);
        prop_assert_eq!(volume.sample(coord, InterpolationMode::Linear), stored);
        prop_assert!((volume.sample(coord, InterpolationMode::Cubic) - stored).abs() < 1e-4);

        let gradients = GradientVolume::new(&volume);
        prop_assert_eq!(
            gradients.sample(coord, InterpolationMode::Linear),
            gradients.get_gradient(x, y, z)
        );
    }

    #[test]
    fn gradient_lerp_endpoints(
        a in prop::array::uniform4(-100.0f32..100.0),
        b in prop::array::uniform4(-100.0f32..100.0),
    ) {
        let g0 = GradientVoxel { direction: Vec3::new(a[0], a[1], a[2]), magnitude: a[3] };
        let g1 = GradientVoxel { direction: Vec3::new(b[0], b[1], b[2]), magnitude: b[3] };
        prop_assert_eq!(g0.lerp(g1, 0.0), g0);
        prop_assert_eq!(g0.lerp(g1, 1.0), g1);
    }
}
