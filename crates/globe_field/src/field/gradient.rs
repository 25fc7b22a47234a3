//! Horn-kernel gradient of a scalar grid.
//!
//! The 8-neighbor stencil is laid out in screen order, row `A B C` to the
//! north of the center, `F G H` to the south:
//!
//! ```text
//! A B C
//! D . E
//! F G H
//! ```
//!
//! Longitude columns wrap across the antimeridian; at the pole rows the
//! missing row collapses onto the current row, flattening the derivative
//! there instead of inventing values beyond the pole.
use glam::Vec2;
use tracing::debug;

use crate::field::grid::{ScalarGrid, VectorGrid};

/// Raw Horn sums at a cell: `(gx, gy)` with `gy` oriented north-positive.
///
/// These carry the kernel's `1/8` weighting but no cell-size scaling.
pub(crate) fn horn_sums(grid: &ScalarGrid, ix: usize, iy: usize) -> (f32, f32) {
    let w = grid.width;
    let h = grid.height;
    let xm = if ix == 0 { w - 1 } else { ix - 1 };
    let xp = if ix == w - 1 { 0 } else { ix + 1 };
    let yn = if iy == 0 { iy } else { iy - 1 };
    let ys = if iy == h - 1 { iy } else { iy + 1 };

    let a = grid.get(xm, yn);
    let b = grid.get(ix, yn);
    let c = grid.get(xp, yn);
    let d = grid.get(xm, iy);
    let e = grid.get(xp, iy);
    let f = grid.get(xm, ys);
    let g = grid.get(ix, ys);
    let hh = grid.get(xp, ys);

    let gx = 0.125 * ((c + 2.0 * e + hh) - (a + 2.0 * d + f));
    let gy = 0.125 * ((a + 2.0 * b + c) - (f + 2.0 * g + hh));
    (gx, gy)
}

/// Build the gradient vector field of `scalar`.
///
/// Per cell, `vx = gx / (2 * dlon)` and `vy = gy / (2 * dlat)` with `gy`
/// north-positive. When `normalize` is set, the whole grid is rescaled by its
/// single largest magnitude so the strongest vector has length 1; an all-zero
/// field is left untouched.
pub fn gradient_from_scalar(scalar: &ScalarGrid, normalize: bool) -> VectorGrid {
    let mut out = VectorGrid::new(scalar.width, scalar.height);
    if scalar.is_empty() {
        return out;
    }
    let inv_2dlon = 1.0 / (2.0 * scalar.dlon());
    let inv_2dlat = 1.0 / (2.0 * scalar.dlat());

    for iy in 0..scalar.height {
        for ix in 0..scalar.width {
            let (gx, gy) = horn_sums(scalar, ix, iy);
            out.set(ix, iy, Vec2::new(gx * inv_2dlon, gy * inv_2dlat));
        }
    }

    if normalize {
        let max = out.max_magnitude();
        if max > 0.0 {
            out.scale_in_place(1.0 / max);
        }
    }
    debug!(
        width = out.width,
        height = out.height,
        normalize,
        "built gradient field"
    );
    out
}
