//! Scalar and vector field construction over the full globe.
//!
//! - grid: equirectangular scalar/vector storage with lon/lat and uv lookup
//! - raster: RGBA decoding into normalized scalar grids
//! - smooth: separable box blur shared by raster, relief, and contour paths
//! - gradient: Horn-kernel gradient with longitude wrap and pole collapse
pub mod gradient;
pub mod grid;
pub mod raster;
pub mod smooth;

pub use gradient::gradient_from_scalar;
pub use grid::{ScalarGrid, VectorGrid};
pub use raster::scalar_from_rgba;
pub use smooth::box_blur;
