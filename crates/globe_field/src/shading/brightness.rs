//! Per-view brightness frames.
//!
//! Brightness is deliberately relative to the current view: the raw shade of
//! the visible sample set is rescaled to its own min/max every frame, so
//! contrast adapts as the globe rotates or zooms. Absolute brightness across
//! frames is not preserved.
use crate::field::grid::ScalarGrid;
use crate::shading::illumination::{directional_shade, hillshade};
use crate::shading::{Light, ShadingConfig};

/// A visible sample position: screen pixel plus normalized texture
/// coordinates (`u` east from the antimeridian, `v` south from the north
/// pole, both in `[0, 1]`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewSample {
    pub screen_x: f32,
    pub screen_y: f32,
    pub u: f32,
    pub v: f32,
}

/// A shaded sample: the screen position with its final brightness.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadedSample {
    pub screen_x: f32,
    pub screen_y: f32,
    pub brightness: f32,
}

/// Shade one frame's visible samples.
///
/// Each sample gets directional shade from `elevation` plus, when a relief
/// grid is supplied, the hillshade term. The raw values are then rescaled
/// over this sample set to `[0, 1]`, raised to `contrast_power`, and scaled
/// by `surface_strength`. A degenerate frame (all samples equally bright)
/// keeps its raw values.
pub fn shade_view(
    elevation: &ScalarGrid,
    relief: Option<&ScalarGrid>,
    samples: &[ViewSample],
    lights: &[Light],
    cfg: &ShadingConfig,
) -> Vec<ShadedSample> {
    let mut out = Vec::with_capacity(samples.len());
    for s in samples {
        let lon = s.u * 360.0 - 180.0;
        let lat = 90.0 - s.v * 180.0;
        let bump = elevation.sample_uv(s.u, s.v);
        let mut brightness = directional_shade(lon, lat, bump, lights, cfg);
        if let Some(relief) = relief {
            brightness += hillshade(relief, lon, lat, s.u, s.v, lights, cfg);
        }
        out.push(ShadedSample {
            screen_x: s.screen_x,
            screen_y: s.screen_y,
            brightness,
        });
    }

    let Some((min, max)) = out
        .iter()
        .map(|s| s.brightness)
        .fold(None, |acc: Option<(f32, f32)>, b| match acc {
            None => Some((b, b)),
            Some((lo, hi)) => Some((lo.min(b), hi.max(b))),
        })
    else {
        return out;
    };

    let range = max - min;
    if range > 0.0 {
        for s in &mut out {
            let normalized = (s.brightness - min) / range;
            s.brightness = normalized.powf(cfg.contrast_power) * cfg.surface_strength;
        }
    }
    out
}
