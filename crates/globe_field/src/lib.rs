#![forbid(unsafe_code)]
//! globe_field: Scalar and vector field derivation for a rotatable globe viewer.
//!
//! Modules:
//! - field: scalar/vector grids, raster decoding, smoothing, gradients
//! - shading: directional lights, hillshade, per-view brightness frames
//! - advect: particle pools and streamlines through the gradient field
//! - contour: marching-squares iso-lines with antimeridian repair
//! - worker: background threads building fields off the render loop
//! - engine: the state owner wiring loads, outcomes, and sampling together
//!
//! For examples and docs, see README and docs.rs.
pub mod advect;
pub mod contour;
pub mod engine;
pub mod error;
pub mod field;
pub mod geo;
pub mod shading;
pub mod worker;

/// Convenient re-exports for common types. Import with `use globe_field::prelude::*;`.
pub mod prelude {
    pub use crate::advect::{
        Particle, ParticlePool, SpawnBounds, StartPositions, StreamlineConfig, StreamlineSet,
    };
    pub use crate::contour::{
        extract_contours, repair_antimeridian, Contour, Ring, DEFAULT_THRESHOLDS,
    };
    pub use crate::engine::{EngineConfig, FieldEngine, FieldReady, LoopFlag};
    pub use crate::error::{Error, Result};
    pub use crate::field::{
        box_blur, gradient_from_scalar, scalar_from_rgba, ScalarGrid, VectorGrid,
    };
    pub use crate::geo::{clamp_lat, unit_vector, wrap_lon};
    pub use crate::shading::{
        default_lights, directional_shade, hillshade, relief_from_elevation, shade_view, Light,
        ShadedSample, ShadingConfig, ViewSample,
    };
    pub use crate::worker::{run_task, FieldOutcome, FieldTask, FieldWorkerPool, RasterTarget};
}
