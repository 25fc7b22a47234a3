//! Lambertian shading and hillshading over the globe.
//!
//! - illumination: directional shade from the light rig and relief hillshade
//! - brightness: per-view brightness frames with view-relative contrast
pub mod brightness;
pub mod illumination;

use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use brightness::{shade_view, ShadedSample, ViewSample};
pub use illumination::{directional_shade, hillshade, relief_from_elevation};

use crate::error::{Error, Result};

/// A directional light.
///
/// `direction` is used as given: its length acts as the relative strength of
/// the light. `azimuth_deg` is measured clockwise from north, `altitude_deg`
/// up from the horizon; both drive the hillshade term only.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Light {
    pub direction: Vec3,
    pub azimuth_deg: f32,
    pub altitude_deg: f32,
}

impl Light {
    pub fn new(direction: Vec3, azimuth_deg: f32, altitude_deg: f32) -> Self {
        Self {
            direction,
            azimuth_deg,
            altitude_deg,
        }
    }
}

/// The default two-light rig: a full-strength light through the north pole
/// and a weaker counter-light through the south pole.
pub fn default_lights() -> Vec<Light> {
    vec![
        Light::new(Vec3::new(0.0, 0.0, 1.0), 10.0, 45.0),
        Light::new(Vec3::new(0.0, 0.0, -0.3), 180.0, 45.0),
    ]
}

/// Tunables for the shading pipeline.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShadingConfig {
    /// Scale applied to elevation before it displaces the surface radius.
    pub bump_factor: f32,
    /// Slope exaggeration for the hillshade term.
    pub z_factor: f32,
    /// Overall hillshade contribution.
    pub hillshade_strength: f32,
    /// Overall surface brightness after contrast shaping.
    pub surface_strength: f32,
    /// Power applied to view-normalized brightness.
    pub contrast_power: f32,
}

impl Default for ShadingConfig {
    fn default() -> Self {
        Self {
            bump_factor: 1.5,
            z_factor: 200.0,
            hillshade_strength: 0.2,
            surface_strength: 0.7,
            contrast_power: 3.0,
        }
    }
}

impl ShadingConfig {
    /// Sets the elevation displacement scale.
    pub fn with_bump_factor(mut self, bump_factor: f32) -> Self {
        self.bump_factor = bump_factor;
        self
    }

    /// Sets the hillshade slope exaggeration.
    pub fn with_z_factor(mut self, z_factor: f32) -> Self {
        self.z_factor = z_factor;
        self
    }

    /// Sets the hillshade contribution strength.
    pub fn with_hillshade_strength(mut self, hillshade_strength: f32) -> Self {
        self.hillshade_strength = hillshade_strength;
        self
    }

    /// Sets the overall surface brightness strength.
    pub fn with_surface_strength(mut self, surface_strength: f32) -> Self {
        self.surface_strength = surface_strength;
        self
    }

    /// Sets the contrast power.
    pub fn with_contrast_power(mut self, contrast_power: f32) -> Self {
        self.contrast_power = contrast_power;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.bump_factor < 0.0 {
            return Err(Error::InvalidConfig("bump_factor must be >= 0".into()));
        }
        if self.z_factor < 0.0 {
            return Err(Error::InvalidConfig("z_factor must be >= 0".into()));
        }
        if self.hillshade_strength < 0.0 {
            return Err(Error::InvalidConfig(
                "hillshade_strength must be >= 0".into(),
            ));
        }
        if self.surface_strength < 0.0 {
            return Err(Error::InvalidConfig("surface_strength must be >= 0".into()));
        }
        if self.contrast_power <= 0.0 {
            return Err(Error::InvalidConfig("contrast_power must be > 0".into()));
        }
        Ok(())
    }
}
