//! Particle and streamline advection through a vector field.
//!
//! - particles: fixed-size aging particle pool stepped once per frame
//! - streamlines: precomputed polylines traced through the field
pub mod particles;
pub mod streamlines;

use rand::RngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use particles::{Particle, ParticlePool};
pub use streamlines::{LatticeSpec, StartPositions, StreamlineConfig, StreamlineSet};

use crate::geo::clamp_lat;

/// A lon/lat rectangle used to constrain particle spawning, typically the
/// currently visible part of the globe.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpawnBounds {
    pub lon_min: f32,
    pub lon_max: f32,
    pub lat_min: f32,
    pub lat_max: f32,
}

impl SpawnBounds {
    /// The full globe.
    pub fn whole_globe() -> Self {
        Self {
            lon_min: -180.0,
            lon_max: 180.0,
            lat_min: -90.0,
            lat_max: 90.0,
        }
    }

    /// Create bounds, clamping latitudes to the poles.
    pub fn new(lon_min: f32, lon_max: f32, lat_min: f32, lat_max: f32) -> Self {
        Self {
            lon_min,
            lon_max,
            lat_min: clamp_lat(lat_min),
            lat_max: clamp_lat(lat_max),
        }
    }

    pub fn lon_span(&self) -> f32 {
        self.lon_max - self.lon_min
    }

    pub fn lat_span(&self) -> f32 {
        self.lat_max - self.lat_min
    }
}

impl Default for SpawnBounds {
    fn default() -> Self {
        Self::whole_globe()
    }
}

pub(crate) fn rand01(rng: &mut dyn RngCore) -> f32 {
    (rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0)
}
