//! Directional shade and relief hillshade terms.
use crate::field::gradient::horn_sums;
use crate::field::grid::ScalarGrid;
use crate::field::smooth::box_blur;
use crate::geo::unit_vector;
use crate::shading::{Light, ShadingConfig};

/// Lambertian shade at a `(lon, lat)` position with local elevation `bump`.
///
/// The surface point sits at radius `1 + bump * bump_factor`; each light
/// contributes `max(0, dot(position, direction))` and the sum is averaged
/// over the light count.
pub fn directional_shade(
    lon: f32,
    lat: f32,
    bump: f32,
    lights: &[Light],
    cfg: &ShadingConfig,
) -> f32 {
    if lights.is_empty() {
        return 0.0;
    }
    let radius = 1.0 + bump * cfg.bump_factor;
    let position = unit_vector(lon, lat) * radius;

    let mut sum = 0.0;
    for light in lights {
        sum += position.dot(light.direction).max(0.0);
    }
    sum / lights.len() as f32
}

/// Prepare the relief grid used by [hillshade] from a normalized elevation
/// grid: a smoothed copy so slope estimates are not dominated by pixel noise.
pub fn relief_from_elevation(elevation: &ScalarGrid, smoothing_radius: usize) -> ScalarGrid {
    let mut relief = elevation.clone();
    box_blur(&mut relief, smoothing_radius);
    relief
}

/// Hillshade term at a `(lon, lat)` position with texture coordinates
/// `(u, v)` into `relief`.
///
/// Slopes come from the Horn kernel on the relief grid, `dzdy` oriented
/// screen-down. Each light in the same hemisphere as the surface normal
/// contributes the fast-hillshader incidence
/// `(sin β - Z·dzdx·sin α·cos β - Z·dzdy·cos α·cos β) / sqrt(1 + Z²·|∇z|²)`
/// with `α = π - azimuth` and `β = altitude`, clamped to `[0, 1]` and
/// weighted by the hemisphere dot product. The sum is scaled by
/// `hillshade_strength`.
pub fn hillshade(
    relief: &ScalarGrid,
    lon: f32,
    lat: f32,
    u: f32,
    v: f32,
    lights: &[Light],
    cfg: &ShadingConfig,
) -> f32 {
    if relief.is_empty() || lights.is_empty() {
        return 0.0;
    }
    let normal = unit_vector(lon, lat);
    let (ix, iy) = relief.cell_for_uv(u, v);
    let (gx, gy_north) = horn_sums(relief, ix, iy);
    let dzdx = gx;
    let dzdy = -gy_north;

    let z = cfg.z_factor;
    let denom = (1.0 + z * z * (dzdx * dzdx + dzdy * dzdy)).sqrt();

    let mut total = 0.0;
    for light in lights {
        let dot = normal.dot(light.direction);
        // No contribution from lights behind the surface point.
        if dot < 0.0 {
            continue;
        }
        let alpha = std::f32::consts::PI - light.azimuth_deg.to_radians();
        let beta = light.altitude_deg.to_radians();
        let incidence =
            (beta.sin() - z * dzdx * alpha.sin() * beta.cos() - z * dzdy * alpha.cos() * beta.cos())
                / denom;
        total += dot * incidence.clamp(0.0, 1.0);
    }
    total * cfg.hillshade_strength
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shading::default_lights;

    #[test]
    fn shade_is_constant_along_a_latitude_circle() {
        let lights = default_lights();
        let cfg = ShadingConfig::default();
        let reference = directional_shade(0.0, 40.0, 0.5, &lights, &cfg);
        for lon in [-180.0, -91.0, 13.0, 77.5, 179.0] {
            let shade = directional_shade(lon, 40.0, 0.5, &lights, &cfg);
            assert!((shade - reference).abs() < 1e-6);
        }
    }

    #[test]
    fn shade_grows_with_elevation_under_the_top_light() {
        let lights = default_lights();
        let cfg = ShadingConfig::default();
        let low = directional_shade(30.0, 60.0, 0.0, &lights, &cfg);
        let high = directional_shade(30.0, 60.0, 1.0, &lights, &cfg);
        assert!(high > low);
    }

    #[test]
    fn shade_is_zero_without_lights() {
        let cfg = ShadingConfig::default();
        assert_eq!(directional_shade(0.0, 0.0, 1.0, &[], &cfg), 0.0);
    }

    #[test]
    fn flat_relief_gives_sin_altitude_incidence() {
        let relief = ScalarGrid::from_values(8, 4, vec![0.5; 32]).unwrap();
        let lights = vec![Light::new(glam::Vec3::Z, 315.0, 45.0)];
        let cfg = ShadingConfig::default();
        // Zero slope collapses the incidence to sin(altitude), weighted by the
        // hemisphere dot product and the strength factor.
        let lat = 60.0f32;
        let expected =
            lat.to_radians().sin() * 45.0f32.to_radians().sin() * cfg.hillshade_strength;
        let got = hillshade(&relief, 0.0, lat, 0.5, 0.17, &lights, &cfg);
        assert!((got - expected).abs() < 1e-5);
    }

    #[test]
    fn hillshade_is_constant_along_a_latitude_circle_on_flat_relief() {
        let relief = ScalarGrid::from_values(16, 8, vec![0.25; 128]).unwrap();
        let lights = default_lights();
        let cfg = ShadingConfig::default();
        let reference = hillshade(&relief, 0.0, 30.0, 0.5, 0.33, &lights, &cfg);
        for (lon, u) in [(-120.0, 0.1), (45.0, 0.6), (170.0, 0.97)] {
            let got = hillshade(&relief, lon, 30.0, u, 0.33, &lights, &cfg);
            assert!((got - reference).abs() < 1e-6);
        }
    }

    #[test]
    fn southern_light_is_skipped_in_the_northern_hemisphere() {
        let relief = ScalarGrid::from_values(8, 4, vec![0.5; 32]).unwrap();
        let south_only = vec![Light::new(glam::Vec3::new(0.0, 0.0, -0.3), 180.0, 45.0)];
        let cfg = ShadingConfig::default();
        assert_eq!(hillshade(&relief, 0.0, 45.0, 0.5, 0.2, &south_only, &cfg), 0.0);
    }

    #[test]
    fn relief_preparation_smooths_the_elevation() {
        let mut elevation = ScalarGrid::new(9, 9);
        elevation.set(4, 4, 1.0);
        let relief = relief_from_elevation(&elevation, 1);
        assert!(relief.get(4, 4) < 1.0);
        assert!(relief.get(3, 4) > 0.0);
        // The source grid is untouched.
        assert_eq!(elevation.get(4, 4), 1.0);
    }
}
