//! Rays, axis-aligned bounds and planes.

use glam::{UVec3, Vec3};

/// Direction components smaller than this are treated as parallel to a slab.
const PARALLEL_EPSILON: f32 = 1e-9;

/// A parametric ray `origin + t * direction` restricted to `[tmin, tmax]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin in volume coordinates.
    pub origin: Vec3,
    /// Ray direction (unit length when produced by a camera).
    pub direction: Vec3,
    /// Start of the parametric interval.
    pub tmin: f32,
    /// End of the parametric interval.
    pub tmax: f32,
}

impl Ray {
    /// Creates a ray with an unbounded parametric interval.
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            tmin: f32::MIN,
            tmax: f32::MAX,
        }
    }

    /// Returns the point at parameter `t`.
    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + t * self.direction
    }

    /// Returns the length of the parametric interval (0 when empty).
    #[must_use]
    pub fn span(&self) -> f32 {
        (self.tmax - self.tmin).max(0.0)
    }

    /// Returns a copy with a unit direction, or `None` for a zero or
    /// non-finite direction or origin.
    #[must_use]
    pub fn normalized(&self) -> Option<Ray> {
        if !self.origin.is_finite() {
            return None;
        }
        let direction = self.direction.try_normalize()?;
        Some(Ray { direction, ..*self })
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum corner.
    pub lower: Vec3,
    /// Maximum corner.
    pub upper: Vec3,
}

impl Bounds {
    /// Creates bounds from two corners.
    #[must_use]
    pub fn new(lower: Vec3, upper: Vec3) -> Self {
        Self { lower, upper }
    }

    /// Returns the bounds `[0, dim]` of a volume.
    #[must_use]
    pub fn from_dims(dim: UVec3) -> Self {
        Self::new(Vec3::ZERO, dim.as_vec3())
    }

    /// Computes the center of the box.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.lower + self.upper) * 0.5
    }

    /// Clips a ray against the box using the slab method.
    ///
    /// The interval is also clipped to `t >= 0`, so parts of the ray behind
    /// its origin are discarded. Returns `None` when nothing remains.
    #[must_use]
    pub fn clip(&self, ray: &Ray) -> Option<Ray> {
        let mut tmin = ray.tmin.max(0.0);
        let mut tmax = ray.tmax;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];
            let (lower, upper) = (self.lower[axis], self.upper[axis]);

            if direction.abs() < PARALLEL_EPSILON {
                if origin < lower || origin > upper {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / direction;
            let t0 = (lower - origin) * inv;
            let t1 = (upper - origin) * inv;
            tmin = tmin.max(t0.min(t1));
            tmax = tmax.min(t0.max(t1));
            if tmin > tmax {
                return None;
            }
        }

        Some(Ray { tmin, tmax, ..*ray })
    }
}

/// An infinite plane through `origin` with unit `normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    origin: Vec3,
    normal: Vec3,
}

impl Plane {
    /// Creates a plane; the normal is normalized.
    #[must_use]
    pub fn new(origin: Vec3, normal: Vec3) -> Self {
        Self {
            origin,
            normal: normal.normalize_or_zero(),
        }
    }

    /// Returns the origin point of the plane.
    #[must_use]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Returns the normal direction of the plane.
    #[must_use]
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Returns the signed distance from a point to the plane.
    #[must_use]
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        (point - self.origin).dot(self.normal)
    }

    /// Returns the ray parameter where the ray meets the plane, or `None`
    /// when the ray is parallel to it.
    #[must_use]
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        let denom = ray.direction.dot(self.normal);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }
        let t = (self.origin - ray.origin).dot(self.normal) / denom;
        t.is_finite().then_some(t)
    }
}
