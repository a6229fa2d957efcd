//! Interpolation modes and the setting shared between a volume and its gradient field.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VolumeError};

/// Reconstruction filter used when sampling at continuous coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum InterpolationMode {
    /// Round to the closest voxel.
    #[default]
    NearestNeighbour = 0,
    /// Trilinear interpolation over the 8 surrounding voxels.
    Linear = 1,
    /// Tricubic convolution over the 4x4x4 neighbourhood.
    Cubic = 2,
}

impl InterpolationMode {
    /// All modes, in index order.
    pub const ALL: [InterpolationMode; 3] = [
        InterpolationMode::NearestNeighbour,
        InterpolationMode::Linear,
        InterpolationMode::Cubic,
    ];

    /// Returns display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            InterpolationMode::NearestNeighbour => "Nearest Neighbour",
            InterpolationMode::Linear => "Linear",
            InterpolationMode::Cubic => "TriCubic",
        }
    }

    /// Converts to a u8 index (used by UI radio buttons).
    #[must_use]
    pub fn to_index(self) -> u8 {
        self as u8
    }
}

/// Unknown indices are rejected rather than mapped to a default.
impl TryFrom<u8> for InterpolationMode {
    type Error = VolumeError;

    fn try_from(index: u8) -> Result<Self> {
        match index {
            0 => Ok(InterpolationMode::NearestNeighbour),
            1 => Ok(InterpolationMode::Linear),
            2 => Ok(InterpolationMode::Cubic),
            other => Err(VolumeError::UnknownInterpolationMode(other)),
        }
    }
}

impl FromStr for InterpolationMode {
    type Err = VolumeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" | "nearestneighbour" | "nearest_neighbour" | "nearest-neighbour" => {
                Ok(InterpolationMode::NearestNeighbour)
            }
            "linear" | "trilinear" => Ok(InterpolationMode::Linear),
            "cubic" | "tricubic" => Ok(InterpolationMode::Cubic),
            _ => Err(VolumeError::UnknownInterpolationName(s.to_string())),
        }
    }
}

impl fmt::Display for InterpolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A mutable interpolation mode that can be shared between several samplers.
///
/// Cloning the setting produces another handle to the same value, so a
/// [`Volume`](crate::Volume) and the [`GradientVolume`](crate::GradientVolume)
/// derived from it always agree on the filter they use.
#[derive(Debug, Clone)]
pub struct InterpolationSetting {
    mode: Arc<AtomicU8>,
}

impl InterpolationSetting {
    /// Creates a new, unshared setting.
    #[must_use]
    pub fn new(mode: InterpolationMode) -> Self {
        Self {
            mode: Arc::new(AtomicU8::new(mode.to_index())),
        }
    }

    /// Returns the current mode.
    ///
    /// # Errors
    /// Returns [`VolumeError::UnknownInterpolationMode`] if the stored
    /// discriminant does not name a mode.
    pub fn get(&self) -> Result<InterpolationMode> {
        InterpolationMode::try_from(self.mode.load(Ordering::Acquire))
    }

    /// Sets the mode for every handle sharing this setting.
    pub fn set(&self, mode: InterpolationMode) {
        self.mode.store(mode.to_index(), Ordering::Release);
    }

    /// Returns whether two handles refer to the same underlying value.
    #[must_use]
    pub fn is_shared_with(&self, other: &InterpolationSetting) -> bool {
        Arc::ptr_eq(&self.mode, &other.mode)
    }
}

impl Default for InterpolationSetting {
    fn default() -> Self {
        Self::new(InterpolationMode::default())
    }
}
