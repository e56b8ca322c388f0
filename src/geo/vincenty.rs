//! Inverse geodesic on the WGS-84 ellipsoid.

/// WGS-84 semi-major axis, meters.
const SEMI_MAJOR_M: f64 = 6_378_137.0;
/// WGS-84 semi-minor axis, meters.
const SEMI_MINOR_M: f64 = 6_356_752.314_245;
/// WGS-84 flattening.
const FLATTENING: f64 = (SEMI_MAJOR_M - SEMI_MINOR_M) / SEMI_MAJOR_M;

const MAX_ITERATIONS: u32 = 100;
const CONVERGENCE: f64 = 1e-12;

/// Geodesic distance in meters between two coordinates on the WGS-84
/// ellipsoid. Coordinates are degrees.
///
/// Returns exactly `0.0` for co-incident points. Returns NaN when the λ
/// iteration fails to converge, which happens for nearly antipodal pairs;
/// screen the value before handing it to an index.
#[must_use]
pub fn vincenty_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let l = (lon2 - lon1).to_radians();
    let u1 = ((1.0 - FLATTENING) * lat1.to_radians().tan()).atan();
    let u2 = ((1.0 - FLATTENING) * lat2.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    let mut sin_sigma = 0.0;
    let mut cos_sigma = 0.0;
    let mut sigma = 0.0;
    let mut cos_sq_alpha = 0.0;
    let mut cos2_sigma_m = 0.0;
    let mut converged = false;

    for _ in 0..MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let cross = cos_u2 * sin_lambda;
        let along = cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda;
        sin_sigma = (cross * cross + along * along).sqrt();
        if sin_sigma == 0.0 {
            // co-incident points
            return 0.0;
        }
        cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        cos2_sigma_m = cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha;
        if cos2_sigma_m.is_nan() {
            // equatorial line: cos²α = 0
            cos2_sigma_m = 0.0;
        }
        let c = FLATTENING / 16.0 * cos_sq_alpha * (4.0 + FLATTENING * (4.0 - 3.0 * cos_sq_alpha));
        let lambda_prev = lambda;
        lambda = l
            + (1.0 - c)
                * FLATTENING
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos2_sigma_m
                            + c * cos_sigma * (-1.0 + 2.0 * cos2_sigma_m * cos2_sigma_m)));
        if (lambda - lambda_prev).abs() < CONVERGENCE {
            converged = true;
            break;
        }
    }
    if !converged {
        return f64::NAN;
    }

    let u_sq = cos_sq_alpha * (SEMI_MAJOR_M * SEMI_MAJOR_M - SEMI_MINOR_M * SEMI_MINOR_M)
        / (SEMI_MINOR_M * SEMI_MINOR_M);
    let a_term = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let b_term = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
    let delta_sigma = b_term
        * sin_sigma
        * (cos2_sigma_m
            + b_term / 4.0
                * (cos_sigma * (-1.0 + 2.0 * cos2_sigma_m * cos2_sigma_m)
                    - b_term / 6.0
                        * cos2_sigma_m
                        * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                        * (-3.0 + 4.0 * cos2_sigma_m * cos2_sigma_m)));
    SEMI_MINOR_M * a_term * (sigma - delta_sigma)
}
