//! Iso-contour extraction with antimeridian repair.
//!
//! - marching: subsampling, smoothing, and oriented marching squares
//! - stitch: reconnecting rings split by the antimeridian
pub mod marching;
pub mod stitch;

use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use marching::extract_contours;
pub use stitch::repair_antimeridian;

/// Default iso-levels for a normalized scalar field.
pub const DEFAULT_THRESHOLDS: [f32; 9] = [0.3, 0.4, 0.45, 0.5, 0.55, 0.65, 0.7, 0.75, 0.8];

/// A closed contour ring in `(lon, lat)` degrees. The last point implicitly
/// connects back to the first.
pub type Ring = Vec<Vec2>;

/// All rings of one iso-level.
///
/// Rings share a consistent winding (the enclosed region lies to the left of
/// travel), so after antimeridian repair holes and exteriors can be drawn as
/// one merged polygon. A contour is immutable once extracted; a changed
/// scalar grid means re-extracting from scratch.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Contour {
    pub threshold: f32,
    pub rings: Vec<Ring>,
}
