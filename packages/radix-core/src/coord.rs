//! Coordinate kernel — range/azimuth/elevation ↔ ENU, Doppler radial decomposition.
//!
//! Pure functions, no state. Azimuth is measured from +y (North) toward +x
//! (East), clockwise; all trig uses radians internally.

const EPSILON: f64 = 1e-9;

/// Spherical `(range, az_deg, el_deg)` → ENU `[x, y, z]` meters.
#[must_use]
pub fn enu_from_range_az_el(range_m: f64, azimuth_deg: f64, elevation_deg: f64) -> [f64; 3] {
    let az = azimuth_deg.to_radians();
    let el = elevation_deg.to_radians();
    [
        range_m * el.cos() * az.sin(),
        range_m * el.cos() * az.cos(),
        range_m * el.sin(),
    ]
}

/// Scalar Doppler `d` decomposed along the same direction cosines as
/// [`enu_from_range_az_el`]. Only the radial component is recovered; tangential
/// velocity is reported as zero.
#[must_use]
pub fn doppler_to_enu_velocity(doppler_mps: f64, azimuth_deg: f64, elevation_deg: f64) -> [f64; 3] {
    enu_from_range_az_el(doppler_mps, azimuth_deg, elevation_deg)
}

/// ENU relative position `Δp` (target − sensor) → `(range_m, azimuth_deg, elevation_deg)`.
/// `azimuth_deg` is wrapped into `[0, 360)`.
#[must_use]
pub fn range_az_el_from_enu(delta: [f64; 3]) -> (f64, f64, f64) {
    let range_m = (delta[0] * delta[0] + delta[1] * delta[1] + delta[2] * delta[2]).sqrt();
    let mut azimuth_deg = delta[0].atan2(delta[1]).to_degrees();
    if azimuth_deg < 0.0 {
        azimuth_deg += 360.0;
    }
    let elevation_deg = (delta[2] / (range_m + EPSILON)).asin().to_degrees();
    (range_m, azimuth_deg, elevation_deg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn enu_matches_fmcw_normalization_scenario() {
        // Scenario 4 from spec.md: range=1000, az=45, el=10.
        let pos = enu_from_range_az_el(1000.0, 45.0, 10.0);
        assert_relative_eq!(pos[0], 696.36, epsilon = 1e-2);
        assert_relative_eq!(pos[1], 696.36, epsilon = 1e-2);
        assert_relative_eq!(pos[2], 173.65, epsilon = 1e-2);
    }

    #[test]
    fn round_trip_range_az_el() {
        for &(range, az, el) in &[
            (1000.0, 45.0, 10.0),
            (50.0, 359.0, -30.0),
            (1.0, 0.0, 90.0),
            (1.0, 0.0, -90.0),
        ] {
            let enu = enu_from_range_az_el(range, az, el);
            let (r2, az2, el2) = range_az_el_from_enu(enu);
            assert_relative_eq!(r2, range, epsilon = 1e-6);
            // Azimuth is undefined at the poles (el = ±90); skip that check there.
            // Elevation near the poles also loses precision (asin's derivative
            // diverges as its argument approaches ±1), so widen its tolerance there.
            if el.abs() < 89.999 {
                assert_relative_eq!(az2, az, epsilon = 1e-6);
                assert_relative_eq!(el2, el, epsilon = 1e-6);
            } else {
                assert_relative_eq!(el2, el, epsilon = 1e-2);
            }
        }
    }

    #[test]
    fn norm_equals_range() {
        let pos = enu_from_range_az_el(3450.0, 23.4, 5.2);
        let norm = (pos[0] * pos[0] + pos[1] * pos[1] + pos[2] * pos[2]).sqrt();
        assert_relative_eq!(norm, 3450.0, epsilon = 3450.0 * 1e-3);
    }

    #[test]
    fn nonnegative_elevation_yields_nonnegative_z() {
        for el in [0.0, 5.0, 45.0, 89.0] {
            let pos = enu_from_range_az_el(500.0, 120.0, el);
            assert!(pos[2] >= 0.0);
        }
    }
}
