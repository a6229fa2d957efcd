//! Front-to-back alpha compositing.

use glam::{Vec3, Vec4};

/// Accumulates color and opacity along a ray, front to back.
///
/// Each sample contributes `(1 - A) * a * c` to the color and `(1 - A) * a`
/// to the opacity `A`, so `A` never decreases and never exceeds 1.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Compositor {
    color: Vec3,
    alpha: f32,
}

impl Compositor {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sample behind everything accumulated so far.
    ///
    /// `opacity` is clamped to `[0, 1]`; NaN counts as fully transparent.
    pub fn push(&mut self, color: Vec3, opacity: f32) {
        let opacity = if opacity.is_nan() {
            0.0
        } else {
            opacity.clamp(0.0, 1.0)
        };
        let weight = (1.0 - self.alpha) * opacity;
        self.color += weight * color;
        self.alpha = (self.alpha + weight).min(1.0);
    }

    /// Returns the accumulated opacity.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Returns the accumulated (premultiplied) color.
    #[must_use]
    pub fn color(&self) -> Vec3 {
        self.color
    }

    /// Returns `true` once the accumulated opacity exceeds `threshold`.
    #[must_use]
    pub fn is_saturated(&self, threshold: f32) -> bool {
        self.alpha > threshold
    }

    /// Returns the accumulated color and opacity as RGBA.
    #[must_use]
    pub fn result(&self) -> Vec4 {
        self.color.extend(self.alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_single_sample() {
        let mut compositor = Compositor::new();
        compositor.push(Vec3::new(1.0, 0.0, 0.0), 0.5);
        assert_eq!(compositor.result(), Vec4::new(0.5, 0.0, 0.0, 0.5));
    }

    #[test]
    fn test_opaque_sample_hides_the_rest() {
        let mut compositor = Compositor::new();
        compositor.push(Vec3::X, 1.0);
        assert!(compositor.is_saturated(0.99));
        compositor.push(Vec3::Y, 1.0);
        assert_eq!(compositor.result(), Vec4::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_opacity_is_clamped() {
        let mut compositor = Compositor::new();
        compositor.push(Vec3::ONE, -2.0);
        compositor.push(Vec3::ONE, f32::NAN);
        assert_eq!(compositor.alpha(), 0.0);
        compositor.push(Vec3::ONE, 7.0);
        assert_eq!(compositor.alpha(), 1.0);
    }

    proptest! {
        #[test]
        fn alpha_is_monotonic_and_bounded(
            samples in proptest::collection::vec((0.0f32..1.0, -0.5f32..1.5), 0..64)
        ) {
            let mut compositor = Compositor::new();
            let mut previous = 0.0;
            for (value, opacity) in samples {
                compositor.push(Vec3::splat(value), opacity);
                prop_assert!(compositor.alpha() >= previous);
                prop_assert!(compositor.alpha() <= 1.0);
                previous = compositor.alpha();
            }
        }
    }
}
