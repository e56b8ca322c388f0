//! Great-circle distance on a sphere.

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Great-circle distance in meters between two coordinates on a sphere of
/// the given radius (meters). Coordinates are degrees.
#[must_use]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64, radius: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * radius * a.sqrt().atan2((1.0 - a).sqrt())
}

/// [`haversine_distance`] on the mean Earth radius.
#[must_use]
pub fn haversine_earth(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    haversine_distance(lat1, lon1, lat2, lon2, EARTH_RADIUS_M)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn identical_points_are_zero() {
        assert_eq!(haversine_earth(37.3319, -122.3069, 37.3319, -122.3069), 0.0);
    }

    #[test]
    fn one_degree_along_the_equator() {
        // One degree of arc is R * pi / 180.
        let expected = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        assert_abs_diff_eq!(haversine_earth(0.0, 0.0, 0.0, 1.0), expected, epsilon = 1e-6);
    }

    #[test]
    fn symmetric_in_its_endpoints() {
        let forward = haversine_earth(52.52, 13.40, 48.86, 2.35);
        let backward = haversine_earth(48.86, 2.35, 52.52, 13.40);
        assert_abs_diff_eq!(forward, backward, epsilon = 1e-9);
    }

    #[test]
    fn explicit_radius_scales_the_result() {
        // Half the circumference of a unit sphere.
        let half_turn = haversine_distance(0.0, 0.0, 0.0, 180.0, 1.0);
        assert_abs_diff_eq!(half_turn, std::f64::consts::PI, epsilon = 1e-12);
    }
}
