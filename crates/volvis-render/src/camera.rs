//! Ray generation cameras.

use glam::{Mat4, Quat, UVec3, Vec2, Vec3};

use crate::ray::Ray;

/// Rotation in degrees per pixel of cursor motion.
const ROTATION_SPEED: f32 = 0.3;
/// Translation per pixel of cursor motion, relative to the world scale.
const TRANSLATION_SPEED: f32 = 0.002;
/// Zoom per scroll step, relative to the world scale.
const ZOOM_SPEED: f32 = 0.1;

/// The capability the renderer needs from a camera.
///
/// `pixel` is in normalized device coordinates: `y` runs from -1 (bottom) to
/// +1 (top), and `x` is already scaled by the aspect ratio of the image.
pub trait RayTraceCamera: Send + Sync {
    /// Returns the camera position in volume coordinates.
    fn position(&self) -> Vec3;

    /// Returns the viewing direction (unit length).
    fn forward(&self) -> Vec3;

    /// Generates the primary ray through `pixel`.
    fn generate_ray(&self, pixel: Vec2) -> Ray;
}

/// An orbiting perspective camera looking at a point.
///
/// The camera sits at `look_at + rotation * (0, 0, -distance)` and looks along
/// `rotation * +Z`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackballCamera {
    /// Vertical field of view in radians.
    fovy: f32,
    look_at: Vec3,
    distance: f32,
    rotation: Quat,
    /// Indication of world size, used to scale translation and zoom.
    world_scale: f32,
}

impl TrackballCamera {
    /// Creates a camera with the given vertical field of view (radians) at
    /// `distance` from the origin.
    #[must_use]
    pub fn new(fovy: f32, distance: f32) -> Self {
        Self {
            fovy,
            look_at: Vec3::ZERO,
            distance,
            rotation: Quat::IDENTITY,
            world_scale: 1.0,
        }
    }

    /// Creates a camera framing a volume of the given dimensions.
    #[must_use]
    pub fn fitted_to(dims: UVec3, fovy: f32) -> Self {
        let mut camera = Self::new(fovy, 1.0);
        camera.fit_volume(dims);
        camera
    }

    /// Centers the camera on a volume and backs off to see all of it.
    pub fn fit_volume(&mut self, dims: UVec3) {
        let size = dims.as_vec3();
        let max_dimension = size.max_element();
        self.look_at = size / 2.0;
        self.distance = max_dimension * 1.5;
        self.world_scale = max_dimension;
    }

    /// Returns the vertical field of view in radians.
    #[must_use]
    pub fn fovy(&self) -> f32 {
        self.fovy
    }

    /// Returns the point the camera orbits.
    #[must_use]
    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }

    /// Sets the point the camera orbits.
    pub fn set_look_at(&mut self, look_at: Vec3) {
        self.look_at = look_at;
    }

    /// Returns the distance from the look-at point.
    #[must_use]
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Sets the distance from the look-at point (clamped to be non-negative).
    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.max(0.0);
    }

    /// Sets the world scale used by [`translate`](Self::translate) and
    /// [`zoom`](Self::zoom).
    pub fn set_world_scale(&mut self, scale: f32) {
        self.world_scale = scale;
    }

    /// Returns the camera orientation.
    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Sets the camera orientation.
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
    }

    /// Returns the camera up vector.
    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Returns the camera left vector.
    #[must_use]
    pub fn left(&self) -> Vec3 {
        self.rotation * Vec3::NEG_X
    }

    /// Rotates around the look-at point by a cursor motion in pixels
    /// (`delta.y` positive is upwards).
    pub fn rotate(&mut self, delta: Vec2) {
        let yaw = Quat::from_axis_angle(self.up(), (-delta.x * ROTATION_SPEED).to_radians());
        self.rotation = yaw * self.rotation;
        let pitch = Quat::from_axis_angle(self.left(), (delta.y * ROTATION_SPEED).to_radians());
        self.rotation = (pitch * self.rotation).normalize();
    }

    /// Pans the look-at point by a cursor motion in pixels.
    pub fn translate(&mut self, delta: Vec2) {
        let scale = self.world_scale * TRANSLATION_SPEED;
        self.look_at -= delta.x * scale * self.left();
        self.look_at -= delta.y * scale * self.up();
    }

    /// Zooms by a number of scroll steps (positive moves closer).
    pub fn zoom(&mut self, steps: f32) {
        self.set_distance(self.distance - steps * self.world_scale * ZOOM_SPEED);
    }

    /// Returns the view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.look_at, self.up())
    }
}

impl Default for TrackballCamera {
    fn default() -> Self {
        Self::new(60.0_f32.to_radians(), 4.0)
    }
}

impl RayTraceCamera for TrackballCamera {
    fn position(&self) -> Vec3 {
        self.look_at + self.rotation * Vec3::new(0.0, 0.0, -self.distance)
    }

    fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    fn generate_ray(&self, pixel: Vec2) -> Ray {
        let half_height = (self.fovy / 2.0).tan();
        let camera_space = Vec3::new(pixel.x * half_height, pixel.y * half_height, 1.0).normalize();
        Ray::new(self.position(), self.rotation * camera_space)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_creation() {
        let camera = TrackballCamera::default();
        assert_eq!(camera.position(), Vec3::new(0.0, 0.0, -4.0));
        assert_eq!(camera.forward(), Vec3::Z);
        assert!((camera.fovy() - 60.0_f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn test_center_ray_hits_look_at() {
        let camera = TrackballCamera::fitted_to(UVec3::new(10, 20, 10), 1.0);
        assert_eq!(camera.look_at(), Vec3::new(5.0, 10.0, 5.0));
        let ray = camera.generate_ray(Vec2::ZERO);
        let t = camera.distance();
        assert!((ray.at(t) - camera.look_at()).length() < 1e-4);
        assert!((ray.direction.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ndc_corners_spread_by_fov() {
        let camera = TrackballCamera::new(90.0_f32.to_radians(), 1.0);
        let ray = camera.generate_ray(Vec2::new(1.0, 1.0));
        let expected = Vec3::new(1.0, 1.0, 1.0).normalize();
        assert!((ray.direction - expected).length() < 1e-5);
    }

    #[test]
    fn test_rotate_keeps_distance() {
        let mut camera = TrackballCamera::fitted_to(UVec3::splat(8), 1.0);
        camera.rotate(Vec2::new(120.0, -45.0));
        let offset = camera.position() - camera.look_at();
        assert!((offset.length() - camera.distance()).abs() < 1e-3);
        // The camera keeps looking at the orbit center.
        assert!((offset.normalize() + camera.forward()).length() < 1e-4);
    }

    #[test]
    fn test_zoom_and_translate() {
        let mut camera = TrackballCamera::fitted_to(UVec3::splat(10), 1.0);
        let start = camera.distance();
        camera.zoom(1.0);
        assert!((camera.distance() - (start - 1.0)).abs() < 1e-5);
        camera.zoom(1000.0);
        assert_eq!(camera.distance(), 0.0);

        let before = camera.look_at();
        camera.translate(Vec2::new(0.0, 50.0));
        assert!((camera.look_at() - before).dot(camera.up()) < 0.0);
    }
}
