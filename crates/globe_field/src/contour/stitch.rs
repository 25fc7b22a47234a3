//! Antimeridian repair for contour rings.
//!
//! Marching squares runs on an equirectangular grid, so a region crossing
//! the antimeridian comes out as separate rings closed along the left and
//! right borders. Repair reconnects them:
//!
//! 1. record the latitude rows where rings touch lon ±180°,
//! 2. merge one-sided rows onto the closest opposite-side row within a small
//!    tolerance (grid rows line up exactly in theory, merging absorbs
//!    off-by-one rows),
//! 3. nudge antimeridian points that stayed one-sided slightly inward so
//!    they are not mistaken for crossings,
//! 4. split rings at the remaining seam points and rejoin the chains across
//!    the antimeridian into merged rings,
//! 5. strip the seam points themselves.
//!
//! Running the repair on an already-repaired contour is a no-op.
use std::collections::HashMap;

use glam::Vec2;
use tracing::warn;

use crate::contour::{Contour, Ring};

/// Tolerance for treating a point as touching the antimeridian.
pub const ANTIMERIDIAN_TOL: f32 = 0.01;
/// Maximum latitude distance bridged when merging one-sided seam rows.
pub const MERGE_TOL: f32 = 0.1;

const NUDGE_LON: f32 = 179.9999;
/// Exact-seam tolerance; tighter than the nudge offset so nudged points are
/// never taken for stitch points.
const SEAM_EPS: f32 = 1e-5;

const WEST: u8 = 1;
const EAST: u8 = 2;
const SHARED: u8 = WEST | EAST;

fn near_seam(lon: f32) -> bool {
    (lon + 180.0).abs() <= ANTIMERIDIAN_TOL || (lon - 180.0).abs() <= ANTIMERIDIAN_TOL
}

fn on_seam(lon: f32) -> bool {
    (lon.abs() - 180.0).abs() <= SEAM_EPS
}

/// Latitude rows touching the antimeridian, keyed by exact value.
#[derive(Default)]
struct SeamRows {
    masks: HashMap<u32, u8>,
}

impl SeamRows {
    fn record(&mut self, lat: f32, side: u8) {
        *self.masks.entry(lat.to_bits()).or_default() |= side;
    }

    fn mask(&self, lat: f32) -> u8 {
        self.masks.get(&lat.to_bits()).copied().unwrap_or(0)
    }

    fn mark_shared(&mut self, lat: f32) {
        self.masks.insert(lat.to_bits(), SHARED);
    }

    /// Closest row recorded only on the opposite side of `side`, within
    /// [MERGE_TOL].
    fn closest_opposite(&self, lat: f32, side: u8) -> Option<f32> {
        let opposite = SHARED ^ side;
        let mut best: Option<(f32, f32)> = None;
        for (&bits, &mask) in &self.masks {
            let other = f32::from_bits(bits);
            if other == lat || mask != opposite {
                continue;
            }
            let dist = (other - lat).abs();
            if dist < MERGE_TOL && best.map_or(true, |(_, d)| dist < d) {
                best = Some((other, dist));
            }
        }
        best.map(|(other, _)| other)
    }
}

/// Repair `contour` in place. Idempotent.
pub fn repair_antimeridian(contour: &mut Contour) {
    let mut rows = SeamRows::default();

    // Record which latitude rows touch each side of the seam.
    for ring in &contour.rings {
        for p in ring {
            if (p.x + 180.0).abs() <= ANTIMERIDIAN_TOL {
                rows.record(p.y, WEST);
            } else if (p.x - 180.0).abs() <= ANTIMERIDIAN_TOL {
                rows.record(p.y, EAST);
            }
        }
    }

    // Merge one-sided rows onto the closest opposite row; nudge the rest
    // off the seam so they do not take part in stitching.
    let mut unmatched = 0usize;
    for ring in &mut contour.rings {
        for p in ring {
            if !near_seam(p.x) {
                continue;
            }
            let mask = rows.mask(p.y);
            if mask == WEST || mask == EAST {
                if let Some(closest) = rows.closest_opposite(p.y, mask) {
                    p.y = closest;
                    rows.mark_shared(closest);
                } else {
                    unmatched += 1;
                }
            }
            if rows.mask(p.y) != SHARED {
                p.x = if p.x < 0.0 { -NUDGE_LON } else { NUDGE_LON };
            }
        }
    }
    if unmatched > 0 {
        warn!(
            threshold = contour.threshold,
            unmatched, "antimeridian rows without an opposite match; left nudged"
        );
    }

    stitch_rings(&mut contour.rings);

    // Strip the seam points; the neighbors on either side connect directly.
    for ring in &mut contour.rings {
        ring.retain(|p| !on_seam(p.x));
    }
    contour.rings.retain(|ring| !ring.is_empty());
}

/// Split rings at seam points and rejoin the chains across the seam.
fn stitch_rings(rings: &mut Vec<Ring>) {
    let mut kept: Vec<Ring> = Vec::new();
    let mut chains: Vec<Vec<Vec2>> = Vec::new();

    for ring in rings.drain(..) {
        let Some(first_seam) = ring.iter().position(|p| on_seam(p.x)) else {
            kept.push(ring);
            continue;
        };
        // Walk the ring cyclically from a seam point, cutting it into chains
        // that run from one seam point to the next. Runs of consecutive seam
        // points are border-following segments and fall away.
        let n = ring.len();
        let mut current = vec![ring[first_seam]];
        for k in 1..=n {
            let p = ring[(first_seam + k) % n];
            current.push(p);
            if on_seam(p.x) {
                if current.len() > 2 {
                    chains.push(std::mem::take(&mut current));
                }
                current = vec![p];
            }
        }
    }

    // Join chain ends to chain starts at the same latitude, preferring the
    // opposite side of the seam (a crossing) over the same side (a tangent).
    let mut by_start: HashMap<u32, Vec<usize>> = HashMap::new();
    for (i, chain) in chains.iter().enumerate() {
        by_start.entry(chain[0].y.to_bits()).or_default().push(i);
    }

    let mut used = vec![false; chains.len()];
    for i in 0..chains.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        let first = chains[i][0];
        let mut ring = chains[i].clone();

        loop {
            let end = *ring.last().unwrap_or(&first);
            if end.y.to_bits() == first.y.to_bits() && ring.len() > chains[i].len() {
                break;
            }
            let next = by_start
                .get(&end.y.to_bits())
                .and_then(|candidates| pick_continuation(candidates, &chains, &used, end));
            match next {
                Some(j) => {
                    used[j] = true;
                    ring.extend_from_slice(&chains[j][1..]);
                }
                None => {
                    // End of a tangent chain looping back onto its own start,
                    // or an unmatched crossing; keep what we have.
                    break;
                }
            }
        }
        kept.push(ring);
    }

    *rings = kept;
}

fn pick_continuation(
    candidates: &[usize],
    chains: &[Vec<Vec2>],
    used: &[bool],
    end: Vec2,
) -> Option<usize> {
    let mut same_side = None;
    for &j in candidates {
        if used[j] {
            continue;
        }
        let start = chains[j][0];
        if (start.x < 0.0) != (end.x < 0.0) {
            return Some(j);
        }
        same_side.get_or_insert(j);
    }
    same_side
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(points: &[(f32, f32)]) -> Ring {
        points.iter().map(|&(x, y)| Vec2::new(x, y)).collect()
    }

    /// A band polygon split by the seam: a western ring closed along
    /// lon -180 and an eastern ring closed along lon +180, crossing at the
    /// same two latitudes.
    fn split_band() -> Contour {
        Contour {
            threshold: 0.5,
            rings: vec![
                ring(&[
                    (-180.0, 20.0),
                    (-170.0, 25.0),
                    (-160.0, 20.0),
                    (-160.0, 10.0),
                    (-170.0, 5.0),
                    (-180.0, 10.0),
                ]),
                ring(&[
                    (180.0, 10.0),
                    (170.0, 5.0),
                    (160.0, 10.0),
                    (160.0, 20.0),
                    (170.0, 25.0),
                    (180.0, 20.0),
                ]),
            ],
        }
    }

    #[test]
    fn crossing_rings_merge_into_one() {
        let mut contour = split_band();
        repair_antimeridian(&mut contour);
        assert_eq!(contour.rings.len(), 1);
        let merged = &contour.rings[0];
        // Both interiors survive, all seam points are gone.
        assert!(merged.iter().any(|p| p.x == -170.0));
        assert!(merged.iter().any(|p| p.x == 170.0));
        assert!(merged.iter().all(|p| !on_seam(p.x)));
        assert_eq!(merged.len(), 8);
    }

    #[test]
    fn repair_is_idempotent() {
        let mut once = split_band();
        repair_antimeridian(&mut once);
        let mut twice = once.clone();
        repair_antimeridian(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn interior_rings_are_untouched() {
        let inner = ring(&[(10.0, 10.0), (20.0, 10.0), (20.0, 20.0), (10.0, 20.0)]);
        let mut contour = Contour {
            threshold: 0.3,
            rings: vec![inner.clone()],
        };
        repair_antimeridian(&mut contour);
        assert_eq!(contour.rings, vec![inner]);
    }

    #[test]
    fn one_sided_points_are_nudged_inward() {
        let mut contour = Contour {
            threshold: 0.4,
            rings: vec![ring(&[
                (-180.0, 40.0),
                (-170.0, 45.0),
                (-160.0, 40.0),
                (-170.0, 35.0),
            ])],
        };
        repair_antimeridian(&mut contour);
        assert_eq!(contour.rings.len(), 1);
        let nudged = contour.rings[0]
            .iter()
            .find(|p| (p.x + NUDGE_LON).abs() < 1e-4)
            .copied();
        assert!(nudged.is_some());
        assert_eq!(nudged.unwrap().y, 40.0);
    }

    #[test]
    fn close_rows_merge_within_tolerance() {
        // West crossing rows at 10.05/20.0, east at 10.0/20.05: off by less
        // than the merge tolerance.
        let mut contour = Contour {
            threshold: 0.5,
            rings: vec![
                ring(&[
                    (-180.0, 20.0),
                    (-170.0, 25.0),
                    (-170.0, 5.0),
                    (-180.0, 10.05),
                ]),
                ring(&[
                    (180.0, 10.0),
                    (170.0, 5.0),
                    (170.0, 25.0),
                    (180.0, 20.05),
                ]),
            ],
        };
        repair_antimeridian(&mut contour);
        assert_eq!(contour.rings.len(), 1);
        assert!(contour.rings[0].iter().all(|p| !on_seam(p.x)));
    }

    #[test]
    fn distant_rows_stay_nudged_not_stitched() {
        // Rows 0.5 degrees apart exceed the merge tolerance; both rings stay
        // separate with their seam points pushed off the seam.
        let mut contour = Contour {
            threshold: 0.5,
            rings: vec![
                ring(&[(-180.0, 30.0), (-170.0, 35.0), (-170.0, 25.0)]),
                ring(&[(180.0, 30.5), (170.0, 35.5), (170.0, 25.5)]),
            ],
        };
        repair_antimeridian(&mut contour);
        assert_eq!(contour.rings.len(), 2);
        for ring in &contour.rings {
            assert_eq!(ring.len(), 3);
            assert!(ring.iter().all(|p| !on_seam(p.x)));
        }
    }
}
