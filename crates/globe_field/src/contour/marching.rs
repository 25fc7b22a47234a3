//! Marching-squares contour extraction over a full-globe scalar grid.
//!
//! The grid is subsampled and smoothed first, then each iso-level is traced
//! with an oriented marching-squares pass. Cell values sit at half-integer
//! positions and the grid is surrounded by a virtual border of `-inf`, so
//! regions touching the grid edge close along it and border crossings land
//! exactly on `x = 0` / `x = w` (longitude ±180°) where the stitcher expects
//! them.
use std::collections::HashMap;

use glam::Vec2;
use tracing::debug;

use crate::contour::stitch::repair_antimeridian;
use crate::contour::{Contour, Ring};
use crate::field::grid::ScalarGrid;
use crate::field::smooth::box_blur;

/// Blur radius applied to the subsampled grid before tracing.
pub const CONTOUR_SMOOTH_RADIUS: usize = 3;

/// Largest divisor in {16, 8, 4, 2, 1} that evenly subsamples both axes.
fn subsample_step(width: usize, height: usize) -> usize {
    for ds in [16, 8, 4, 2] {
        if width % ds == 0 && height % ds == 0 {
            return ds;
        }
    }
    1
}

fn subsample(scalar: &ScalarGrid) -> ScalarGrid {
    let ds = subsample_step(scalar.width, scalar.height);
    if ds == 1 {
        return scalar.clone();
    }
    let w = scalar.width / ds;
    let h = scalar.height / ds;
    let mut out = ScalarGrid::new(w, h);
    for iy in 0..h {
        for ix in 0..w {
            out.set(ix, iy, scalar.get(ix * ds, iy * ds));
        }
    }
    out
}

/// Extract repaired contours of `scalar` at the given iso-levels.
pub fn extract_contours(scalar: &ScalarGrid, thresholds: &[f32]) -> Vec<Contour> {
    let mut grid = subsample(scalar);
    box_blur(&mut grid, CONTOUR_SMOOTH_RADIUS);
    debug!(
        width = grid.width,
        height = grid.height,
        levels = thresholds.len(),
        "extracting contours"
    );

    thresholds
        .iter()
        .map(|&threshold| {
            let rings = trace_rings(&grid, threshold)
                .into_iter()
                .map(|ring| to_lon_lat(&ring, grid.width, grid.height))
                .collect();
            let mut contour = Contour { threshold, rings };
            repair_antimeridian(&mut contour);
            contour
        })
        .collect()
}

fn to_lon_lat(ring: &[Vec2], w: usize, h: usize) -> Ring {
    ring.iter()
        .map(|p| {
            Vec2::new(
                p.x / w as f32 * 360.0 - 180.0,
                90.0 - p.y / h as f32 * 180.0,
            )
        })
        .collect()
}

/// An oriented boundary segment of one cell.
struct Segment {
    start: Vec2,
    end: Vec2,
}

/// Trace closed rings of the `level` iso-line in grid coordinates
/// (`[0, w] x [0, h]`), region `>= level` kept to the left of travel.
pub(crate) fn trace_rings(grid: &ScalarGrid, level: f32) -> Vec<Vec<Vec2>> {
    let w = grid.width as isize;
    let h = grid.height as isize;

    let value = |ix: isize, iy: isize| -> f32 {
        if ix < 0 || iy < 0 || ix >= w || iy >= h {
            f32::NEG_INFINITY
        } else {
            grid.get(ix as usize, iy as usize)
        }
    };
    let corner = |ix: isize, iy: isize| Vec2::new(ix as f32 + 0.5, iy as f32 + 0.5);

    let mut segments: Vec<Segment> = Vec::new();

    // Cells span the padded lattice, one beyond the grid on each side.
    for cy in -1..h {
        for cx in -1..w {
            let tl = value(cx, cy);
            let tr = value(cx + 1, cy);
            let br = value(cx + 1, cy + 1);
            let bl = value(cx, cy + 1);

            let mut case = 0u8;
            if tl >= level {
                case |= 1;
            }
            if tr >= level {
                case |= 2;
            }
            if br >= level {
                case |= 4;
            }
            if bl >= level {
                case |= 8;
            }
            if case == 0 || case == 15 {
                continue;
            }

            let top = || edge_point(corner(cx, cy), corner(cx + 1, cy), tl, tr, level);
            let right = || edge_point(corner(cx + 1, cy), corner(cx + 1, cy + 1), tr, br, level);
            let bottom = || edge_point(corner(cx, cy + 1), corner(cx + 1, cy + 1), bl, br, level);
            let left = || edge_point(corner(cx, cy), corner(cx, cy + 1), tl, bl, level);

            match case {
                1 => segments.push(Segment { start: left(), end: top() }),
                2 => segments.push(Segment { start: top(), end: right() }),
                3 => segments.push(Segment { start: left(), end: right() }),
                4 => segments.push(Segment { start: right(), end: bottom() }),
                5 => {
                    segments.push(Segment { start: left(), end: top() });
                    segments.push(Segment { start: right(), end: bottom() });
                }
                6 => segments.push(Segment { start: top(), end: bottom() }),
                7 => segments.push(Segment { start: left(), end: bottom() }),
                8 => segments.push(Segment { start: bottom(), end: left() }),
                9 => segments.push(Segment { start: bottom(), end: top() }),
                10 => {
                    segments.push(Segment { start: top(), end: right() });
                    segments.push(Segment { start: bottom(), end: left() });
                }
                11 => segments.push(Segment { start: bottom(), end: right() }),
                12 => segments.push(Segment { start: right(), end: left() }),
                13 => segments.push(Segment { start: right(), end: top() }),
                14 => segments.push(Segment { start: top(), end: left() }),
                _ => unreachable!(),
            }
        }
    }

    chain_segments(segments)
}

/// Crossing point on an edge between corner positions `p1`, `p2` with values
/// `v1`, `v2`.
///
/// Edges against the virtual border cross at the midpoint, which keeps border
/// coordinates exact. Both cells adjacent to an edge compute the crossing
/// from the same arguments, so shared endpoints are bit-identical and rings
/// chain without tolerance.
fn edge_point(p1: Vec2, p2: Vec2, v1: f32, v2: f32, level: f32) -> Vec2 {
    if !v1.is_finite() || !v2.is_finite() {
        return (p1 + p2) * 0.5;
    }
    let denom = v2 - v1;
    if denom == 0.0 {
        return (p1 + p2) * 0.5;
    }
    let t = ((level - v1) / denom).clamp(0.0, 1.0);
    p1 + (p2 - p1) * t
}

fn point_key(p: Vec2) -> (u32, u32) {
    (p.x.to_bits(), p.y.to_bits())
}

/// Connect oriented segments end-to-start into closed rings.
fn chain_segments(segments: Vec<Segment>) -> Vec<Vec<Vec2>> {
    let mut by_start: HashMap<(u32, u32), usize> = HashMap::with_capacity(segments.len());
    for (i, seg) in segments.iter().enumerate() {
        by_start.insert(point_key(seg.start), i);
    }

    let mut used = vec![false; segments.len()];
    let mut rings = Vec::new();

    for i in 0..segments.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        let first_key = point_key(segments[i].start);
        let mut ring = vec![segments[i].start, segments[i].end];

        loop {
            let tail_key = point_key(*ring.last().unwrap_or(&segments[i].end));
            if tail_key == first_key {
                ring.pop();
                break;
            }
            match by_start.get(&tail_key) {
                Some(&j) if !used[j] => {
                    used[j] = true;
                    ring.push(segments[j].end);
                }
                _ => break,
            }
        }

        if ring.len() >= 3 {
            rings.push(ring);
        }
    }
    rings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subsample_picks_largest_common_divisor() {
        assert_eq!(subsample_step(512, 256), 16);
        assert_eq!(subsample_step(360, 180), 4);
        assert_eq!(subsample_step(6, 4), 2);
        assert_eq!(subsample_step(7, 5), 1);
    }

    #[test]
    fn flat_grid_yields_no_rings() {
        let grid = ScalarGrid::from_values(8, 8, vec![0.2; 64]).unwrap();
        assert!(trace_rings(&grid, 0.5).is_empty());
    }

    #[test]
    fn spike_yields_one_closed_ring() {
        let mut grid = ScalarGrid::new(8, 8);
        grid.set(4, 4, 1.0);
        let rings = trace_rings(&grid, 0.5);
        assert_eq!(rings.len(), 1);
        // Four crossings around the hot cell, none duplicated.
        assert_eq!(rings[0].len(), 4);
        for p in &rings[0] {
            assert!(p.x > 3.0 && p.x < 6.0);
            assert!(p.y > 3.0 && p.y < 6.0);
        }
    }

    #[test]
    fn coordinates_stay_inside_the_padded_domain() {
        let mut grid = ScalarGrid::new(8, 4);
        for iy in 0..4 {
            for ix in 0..8 {
                grid.set(ix, iy, if iy == 1 { 1.0 } else { 0.0 });
            }
        }
        for ring in trace_rings(&grid, 0.5) {
            for p in ring {
                assert!((0.0..=8.0).contains(&p.x));
                assert!((0.0..=4.0).contains(&p.y));
            }
        }
    }

    #[test]
    fn full_latitude_band_touches_both_borders_exactly() {
        // A band hot across every longitude closes along the left and right
        // borders, producing exact x = 0 and x = w points for the stitcher.
        let mut grid = ScalarGrid::new(8, 4);
        for ix in 0..8 {
            grid.set(ix, 1, 1.0);
            grid.set(ix, 2, 1.0);
        }
        let rings = trace_rings(&grid, 0.5);
        assert_eq!(rings.len(), 1);
        let ring = &rings[0];
        assert!(ring.iter().any(|p| p.x == 0.0));
        assert!(ring.iter().any(|p| p.x == 8.0));
    }

    #[test]
    fn transformed_band_hits_the_antimeridian() {
        // 18x9 avoids subsampling so the band survives the blur.
        let mut grid = ScalarGrid::new(18, 9);
        for ix in 0..18 {
            grid.set(ix, 3, 1.0);
            grid.set(ix, 4, 1.0);
            grid.set(ix, 5, 1.0);
        }
        let contours = extract_contours(&grid, &[0.25]);
        assert_eq!(contours.len(), 1);
        assert!(!contours[0].rings.is_empty());
        // After repair, no point may sit exactly on the antimeridian.
        for ring in &contours[0].rings {
            for p in ring {
                assert!((p.x.abs() - 180.0).abs() > 1e-5);
                assert!((-90.0..=90.0).contains(&p.y));
            }
        }
    }

    #[test]
    fn rings_keep_the_region_on_the_left() {
        let mut grid = ScalarGrid::new(8, 8);
        grid.set(4, 4, 1.0);
        let ring = &trace_rings(&grid, 0.5)[0];
        // Signed area in y-down coordinates is negative for a
        // counter-clockwise-on-screen ring enclosing the region to its left.
        let mut area = 0.0f32;
        for i in 0..ring.len() {
            let a = ring[i];
            let b = ring[(i + 1) % ring.len()];
            area += a.x * b.y - b.x * a.y;
        }
        assert!(area < 0.0);
    }
}
