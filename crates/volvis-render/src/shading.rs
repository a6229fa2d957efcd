//! Phong illumination.

use glam::Vec3;
use volvis_core::GradientVoxel;

use crate::config::PhongParams;

/// Applies the Phong illumination model to `base`.
///
/// `light` and `view` point from the surface towards the light and the eye.
/// The normal is the normalized gradient direction; a zero gradient only
/// receives the ambient term. The result is not clamped.
#[must_use]
pub fn phong(
    base: Vec3,
    gradient: &GradientVoxel,
    light: Vec3,
    view: Vec3,
    params: &PhongParams,
) -> Vec3 {
    let ambient = params.ambient * base;
    if gradient.magnitude == 0.0 {
        return ambient;
    }
    let Some(normal) = gradient.direction.try_normalize() else {
        return ambient;
    };

    let diffuse = params.diffuse * base * normal.dot(light).max(0.0);
    let reflected = reflect(-light, normal);
    let specular = params.specular * reflected.dot(view).max(0.0).powf(params.shininess);

    ambient + diffuse + Vec3::splat(specular)
}

/// Reflects `incident` about the unit `normal`.
fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * normal.dot(incident) * normal
}

/// Returns a gradient whose direction faces `view`, for two-sided lighting.
#[must_use]
pub(crate) fn facing(gradient: GradientVoxel, view: Vec3) -> GradientVoxel {
    if gradient.direction.dot(view) < 0.0 {
        GradientVoxel {
            direction: -gradient.direction,
            magnitude: gradient.magnitude,
        }
    } else {
        gradient
    }
}
