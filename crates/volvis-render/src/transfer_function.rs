//! 1D transfer functions: control points resolved into an RGBA lookup table.

use glam::Vec4;
use serde::{Deserialize, Serialize};
use volvis_core::Volume;

use crate::config::RenderConfig;

/// Number of entries in the generated color map.
pub const COLOR_MAP_SIZE: usize = 256;

/// A transfer function control point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TfPoint {
    /// Normalized scalar value in `[0, 1]`.
    pub position: f32,
    /// RGB color and opacity.
    pub color: Vec4,
}

impl TfPoint {
    const fn new(position: f32, color: Vec4) -> Self {
        Self { position, color }
    }
}

/// Piecewise-linear transfer function over a scalar value range.
///
/// The first and last control points are pinned to positions 0 and 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferFunction {
    points: Vec<TfPoint>,
    color_map: Vec<Vec4>,
    min_value: f32,
    max_value: f32,
}

impl TransferFunction {
    /// Creates the default transfer function over `[min_value, max_value]`.
    #[must_use]
    pub fn new(min_value: f32, max_value: f32) -> Self {
        let points = vec![
            TfPoint::new(0.0, Vec4::ZERO),
            TfPoint::new(0.06, Vec4::ZERO),
            TfPoint::new(0.15, Vec4::new(0.25, 0.75, 1.0, 0.15)),
            TfPoint::new(0.2, Vec4::new(0.1, 0.3, 0.5, 0.0)),
            TfPoint::new(0.3, Vec4::new(0.8, 0.8, 0.2, 0.0)),
            TfPoint::new(0.4, Vec4::new(1.0, 1.0, 0.25, 0.4)),
            TfPoint::new(0.5, Vec4::new(0.8, 0.8, 0.2, 0.0)),
            TfPoint::new(0.7, Vec4::new(0.7, 0.7, 0.7, 0.0)),
            TfPoint::new(0.8, Vec4::new(0.8, 0.8, 0.8, 1.0)),
            TfPoint::new(1.0, Vec4::ONE),
        ];
        let mut tf = Self {
            points,
            color_map: vec![Vec4::ZERO; COLOR_MAP_SIZE],
            min_value,
            max_value,
        };
        tf.update_color_map();
        tf
    }

    /// Creates the default transfer function spanning `[0, volume.maximum()]`,
    /// the same range as the volume histogram.
    #[must_use]
    pub fn from_volume(volume: &Volume) -> Self {
        Self::new(0.0, volume.maximum())
    }

    /// Returns the control points, sorted by position.
    #[must_use]
    pub fn points(&self) -> &[TfPoint] {
        &self.points
    }

    /// Returns the resolved RGBA table.
    #[must_use]
    pub fn color_map(&self) -> &[Vec4] {
        &self.color_map
    }

    /// Returns the scalar value mapped to position 0.
    #[must_use]
    pub fn min_value(&self) -> f32 {
        self.min_value
    }

    /// Returns the scalar range covered by the table (at least 1).
    #[must_use]
    pub fn value_range(&self) -> f32 {
        let range = self.max_value - self.min_value;
        if range > 0.0 {
            range
        } else {
            1.0
        }
    }

    /// Inserts a point at `position` with the given opacity; its color is
    /// interpolated from the neighbours. Returns the index of the new point.
    pub fn insert_point(&mut self, position: f32, opacity: f32) -> usize {
        let position = position.clamp(0.0, 1.0);
        let index = self
            .points
            .partition_point(|p| p.position <= position)
            .clamp(1, self.points.len() - 1);

        let left = self.points[index - 1];
        let right = self.points[index];
        let width = right.position - left.position;
        let t = if width > 0.0 {
            (position - left.position) / width
        } else {
            0.0
        };
        let mut color = left.color.lerp(right.color, t);
        color.w = opacity.clamp(0.0, 1.0);

        self.points.insert(index, TfPoint::new(position, color));
        self.update_color_map();
        index
    }

    /// Removes an interior point. Returns `false` for endpoints and invalid
    /// indices.
    pub fn remove_point(&mut self, index: usize) -> bool {
        if index == 0 || index + 1 >= self.points.len() {
            return false;
        }
        self.points.remove(index);
        self.update_color_map();
        true
    }

    /// Moves a point. Endpoints keep their position; interior points cannot
    /// pass their neighbours. The opacity is stored in the color's alpha.
    pub fn move_point(&mut self, index: usize, position: f32, opacity: f32) {
        let last = self.points.len() - 1;
        if index > last {
            return;
        }
        let position = match index {
            0 => 0.0,
            i if i == last => 1.0,
            i => position.clamp(self.points[i - 1].position, self.points[i + 1].position),
        };
        let point = &mut self.points[index];
        point.position = position;
        point.color.w = opacity.clamp(0.0, 1.0);
        self.update_color_map();
    }

    /// Sets the color (including opacity) of a point.
    pub fn set_point_color(&mut self, index: usize, color: Vec4) {
        if let Some(point) = self.points.get_mut(index) {
            point.color = color;
            self.update_color_map();
        }
    }

    /// Copies the table and its value range into a render configuration.
    pub fn update_render_config(&self, config: &mut RenderConfig) {
        config.tf_color_map.clone_from(&self.color_map);
        config.tf_color_map_index_start = self.min_value;
        config.tf_color_map_index_range = self.value_range();
    }

    #[allow(clippy::cast_precision_loss)]
    fn update_color_map(&mut self) {
        let denom = (self.color_map.len() - 1).max(1) as f32;
        let mut segment = 0;
        for (i, entry) in self.color_map.iter_mut().enumerate() {
            let t = i as f32 / denom;
            while segment + 2 < self.points.len() && t > self.points[segment + 1].position {
                segment += 1;
            }
            let left = self.points[segment];
            let right = self.points[segment + 1];
            let width = right.position - left.position;
            let f = if width > 0.0 {
                ((t - left.position) / width).clamp(0.0, 1.0)
            } else {
                1.0
            };
            *entry = left.color * (1.0 - f) + right.color * f;
        }
    }
}

impl Default for TransferFunction {
    fn default() -> Self {
        Self::new(0.0, 255.0)
    }
}

/// Looks up a scalar value in an RGBA table spanning
/// `[index_start, index_start + index_range]`.
///
/// Values outside the range map to the first or last entry.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn lookup_color_map(table: &[Vec4], index_start: f32, index_range: f32, value: f32) -> Vec4 {
    if table.is_empty() {
        return Vec4::ZERO;
    }
    let t = (value - index_start) / index_range;
    // Float to int casts saturate, and NaN maps to 0.
    let i = (t * table.len() as f32) as usize;
    table[i.min(table.len() - 1)]
}
