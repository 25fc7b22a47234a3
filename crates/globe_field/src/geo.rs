//! Spherical coordinate helpers shared by advection, shading, and contouring.
//!
//! Longitudes are degrees in [-180, 180), latitudes degrees in [-90, 90],
//! and unit-sphere positions use a right-handed frame with +Z through the
//! north pole.
use glam::Vec3;

/// Wrap a longitude in degrees into `[-180, 180)`.
pub fn wrap_lon(lon: f32) -> f32 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Clamp a latitude in degrees to `[-90, 90]`.
pub fn clamp_lat(lat: f32) -> f32 {
    lat.clamp(-90.0, 90.0)
}

/// Unit-sphere position for a `(lon, lat)` pair in degrees.
pub fn unit_vector(lon_deg: f32, lat_deg: f32) -> Vec3 {
    let lon = lon_deg.to_radians();
    let lat = lat_deg.to_radians();
    Vec3::new(
        lat.cos() * lon.cos(),
        lat.cos() * lon.sin(),
        lat.sin(),
    )
}

/// Whether a unit-sphere point faces the viewer whose view center is `center`.
///
/// Points exactly on the horizon count as visible.
pub fn is_visible_from(center: Vec3, point: Vec3) -> bool {
    center.dot(point) >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_lon_keeps_range_half_open() {
        assert_eq!(wrap_lon(0.0), 0.0);
        assert_eq!(wrap_lon(180.0), -180.0);
        assert_eq!(wrap_lon(-180.0), -180.0);
        assert_eq!(wrap_lon(190.0), -170.0);
        assert_eq!(wrap_lon(-190.0), 170.0);
        assert_eq!(wrap_lon(540.0), -180.0);
    }

    #[test]
    fn clamp_lat_clamps_poles() {
        assert_eq!(clamp_lat(95.0), 90.0);
        assert_eq!(clamp_lat(-95.0), -90.0);
        assert_eq!(clamp_lat(12.5), 12.5);
    }

    #[test]
    fn unit_vector_hits_poles_and_equator() {
        assert!((unit_vector(0.0, 90.0) - Vec3::Z).length() < 1e-6);
        assert!((unit_vector(0.0, -90.0) + Vec3::Z).length() < 1e-6);
        assert!((unit_vector(0.0, 0.0) - Vec3::X).length() < 1e-6);
        assert!((unit_vector(90.0, 0.0) - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn visibility_includes_horizon() {
        let center = Vec3::X;
        assert!(is_visible_from(center, Vec3::X));
        assert!(is_visible_from(center, Vec3::Y));
        assert!(!is_visible_from(center, -Vec3::X));
    }
}
