//! Data normalization engine — converts heterogeneous radar detections to the
//! unified RADIX schema.

use radix_types::{FormatTag, NormalizedDetection, RawDetection, RawFields, TrackState};
use serde_json::json;
use std::collections::HashMap;
use tracing::warn;

use crate::coord::{doppler_to_enu_velocity, enu_from_range_az_el};

/// Reasons a detection failed to normalize. Never surfaced past `normalize` —
/// the public contract stays `Option`, per spec; this exists so the drop
/// reason reaches the log line.
#[derive(Debug, thiserror::Error)]
enum NormalizeError {
    #[error("projection produced a non-finite value")]
    NonFinite,
}

/// Stateless dispatcher from vendor-specific raw detections to the unified schema.
#[derive(Debug, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize one detection. Returns `None` iff a catastrophic error occurs
    /// during projection; logs but never panics.
    pub fn normalize(&self, raw: &RawDetection) -> Option<NormalizedDetection> {
        let result = match &raw.fields {
            RawFields::Fmcw { .. } if raw.format_tag == FormatTag::Fmcw => {
                self.normalize_fmcw(raw)
            }
            RawFields::PulseDoppler { .. } if raw.format_tag == FormatTag::PulseDoppler => {
                self.normalize_pulse_doppler(raw)
            }
            RawFields::Aesa { .. } if raw.format_tag == FormatTag::Aesa => self.normalize_aesa(raw),
            _ => Ok(self.normalize_generic(raw)),
        };

        match result {
            Ok(normalized) => Some(normalized),
            Err(e) => {
                warn!(sensor_id = %raw.sensor_id, format_tag = %raw.format_tag, error = %e, "dropping detection");
                None
            }
        }
    }

    /// Normalize a batch, filtering out detections that failed to normalize.
    pub fn batch_normalize(&self, raws: &[RawDetection]) -> Vec<NormalizedDetection> {
        raws.iter().filter_map(|raw| self.normalize(raw)).collect()
    }

    fn normalize_fmcw(&self, raw: &RawDetection) -> Result<NormalizedDetection, NormalizeError> {
        let RawFields::Fmcw {
            range_m,
            azimuth_deg,
            elevation_deg,
            doppler_mps,
            snr_db,
            target_id,
            rcs_dbsm,
            is_false_alarm,
            beat_frequency_khz,
            range_resolution_m,
        } = &raw.fields
        else {
            unreachable!("dispatch guard guarantees this arm")
        };

        let proj = project(*range_m, *azimuth_deg, *elevation_deg, *doppler_mps)?;

        Ok(NormalizedDetection {
            timestamp: raw.timestamp,
            sensor_id: raw.sensor_id.clone(),
            target_id: *target_id,
            range_m: proj.range_m,
            azimuth_deg: proj.azimuth_deg,
            elevation_deg: Some(proj.elevation_deg),
            doppler_mps: *doppler_mps,
            snr_db: *snr_db,
            rcs_dbsm: *rcs_dbsm,
            track_state_hint: if *is_false_alarm {
                None
            } else {
                Some(TrackState::Tentative)
            },
            position_enu: Some(proj.position_enu),
            velocity_enu: Some(proj.velocity_enu),
            vendor_metadata: HashMap::from([
                ("beat_frequency_khz".to_string(), json!(beat_frequency_khz)),
                ("range_resolution_m".to_string(), json!(range_resolution_m)),
                ("radar_type".to_string(), json!("FMCW")),
            ]),
        })
    }

    fn normalize_pulse_doppler(
        &self,
        raw: &RawDetection,
    ) -> Result<NormalizedDetection, NormalizeError> {
        let RawFields::PulseDoppler {
            range_m,
            azimuth_deg,
            elevation_deg,
            doppler_mps,
            snr_db,
            target_id,
            rcs_dbsm,
            is_false_alarm,
            prf_hz,
            doppler_freq_hz,
            velocity_folded,
            range_ambiguity,
        } = &raw.fields
        else {
            unreachable!("dispatch guard guarantees this arm")
        };

        let proj = project(*range_m, *azimuth_deg, *elevation_deg, *doppler_mps)?;

        Ok(NormalizedDetection {
            timestamp: raw.timestamp,
            sensor_id: raw.sensor_id.clone(),
            target_id: *target_id,
            range_m: proj.range_m,
            azimuth_deg: proj.azimuth_deg,
            elevation_deg: Some(proj.elevation_deg),
            doppler_mps: *doppler_mps,
            snr_db: *snr_db,
            rcs_dbsm: *rcs_dbsm,
            track_state_hint: if *is_false_alarm {
                None
            } else {
                Some(TrackState::Tentative)
            },
            position_enu: Some(proj.position_enu),
            velocity_enu: Some(proj.velocity_enu),
            vendor_metadata: HashMap::from([
                ("doppler_freq_hz".to_string(), json!(doppler_freq_hz)),
                ("prf_hz".to_string(), json!(prf_hz)),
                ("velocity_folded".to_string(), json!(velocity_folded)),
                ("range_ambiguity".to_string(), json!(range_ambiguity)),
                ("radar_type".to_string(), json!("PULSE_DOPPLER")),
            ]),
        })
    }

    fn normalize_aesa(&self, raw: &RawDetection) -> Result<NormalizedDetection, NormalizeError> {
        let RawFields::Aesa {
            range_m,
            azimuth_deg,
            elevation_deg,
            doppler_mps,
            snr_db,
            target_id,
            rcs_dbsm,
            beam_azimuth_deg,
            beam_elevation_deg,
            beam_gain_db,
            num_elements,
            angle_accuracy_deg,
        } = &raw.fields
        else {
            unreachable!("dispatch guard guarantees this arm")
        };

        let proj = project(*range_m, *azimuth_deg, *elevation_deg, *doppler_mps)?;

        Ok(NormalizedDetection {
            timestamp: raw.timestamp,
            sensor_id: raw.sensor_id.clone(),
            target_id: *target_id,
            range_m: proj.range_m,
            azimuth_deg: proj.azimuth_deg,
            elevation_deg: Some(proj.elevation_deg),
            doppler_mps: *doppler_mps,
            snr_db: *snr_db,
            rcs_dbsm: *rcs_dbsm,
            track_state_hint: Some(if *snr_db > 15.0 {
                TrackState::Confirmed
            } else {
                TrackState::Tentative
            }),
            position_enu: Some(proj.position_enu),
            velocity_enu: Some(proj.velocity_enu),
            vendor_metadata: HashMap::from([
                ("beam_azimuth_deg".to_string(), json!(beam_azimuth_deg)),
                ("beam_elevation_deg".to_string(), json!(beam_elevation_deg)),
                ("beam_gain_db".to_string(), json!(beam_gain_db)),
                ("num_elements".to_string(), json!(num_elements)),
                ("angle_accuracy_deg".to_string(), json!(angle_accuracy_deg)),
                ("radar_type".to_string(), json!("AESA")),
            ]),
        })
    }

    /// Unknown `format_tag`, or a format_tag/fields mismatch: never fails, any
    /// missing numeric field defaults to zero.
    fn normalize_generic(&self, raw: &RawDetection) -> NormalizedDetection {
        let get = |key: &str| -> f64 {
            match &raw.fields {
                RawFields::Other(map) => map.get(key).and_then(|v| v.as_f64()).unwrap_or(0.0),
                _ => 0.0,
            }
        };
        let get_opt = |key: &str| -> Option<f64> {
            match &raw.fields {
                RawFields::Other(map) => map.get(key).and_then(|v| v.as_f64()),
                _ => None,
            }
        };
        let target_id = match &raw.fields {
            RawFields::Other(map) => map.get("target_id").and_then(|v| v.as_i64()),
            _ => None,
        };

        NormalizedDetection {
            timestamp: raw.timestamp,
            sensor_id: raw.sensor_id.clone(),
            target_id,
            range_m: get("range_m").max(0.0),
            azimuth_deg: get("azimuth_deg").rem_euclid(360.0),
            elevation_deg: get_opt("elevation_deg").map(|e| e.clamp(-90.0, 90.0)),
            doppler_mps: get("doppler_mps"),
            snr_db: get("snr_db"),
            rcs_dbsm: None,
            track_state_hint: None,
            position_enu: None,
            velocity_enu: None,
            vendor_metadata: HashMap::from([("radar_type".to_string(), json!("UNKNOWN"))]),
        }
    }
}

/// The clamped scalars and the ENU geometry projected from them, shared by
/// every strict-format normalizer so the clamping rule lives in one place.
struct Projection {
    range_m: f64,
    azimuth_deg: f64,
    elevation_deg: f64,
    position_enu: [f64; 3],
    velocity_enu: [f64; 3],
}

/// Shared projection step for the three strict formats: negative range is
/// clamped to 0, azimuth reduced modulo 360, elevation clamped to [-90, 90]
/// before projecting, and the result rejected if non-finite.
fn project(
    range_m: f64,
    azimuth_deg: f64,
    elevation_deg: f64,
    doppler_mps: f64,
) -> Result<Projection, NormalizeError> {
    let range_m = range_m.max(0.0);
    let azimuth_deg = azimuth_deg.rem_euclid(360.0);
    let elevation_deg = elevation_deg.clamp(-90.0, 90.0);

    let position_enu = enu_from_range_az_el(range_m, azimuth_deg, elevation_deg);
    let velocity_enu = doppler_to_enu_velocity(doppler_mps, azimuth_deg, elevation_deg);

    if position_enu.iter().chain(velocity_enu.iter()).any(|v| !v.is_finite()) {
        return Err(NormalizeError::NonFinite);
    }

    Ok(Projection {
        range_m,
        azimuth_deg,
        elevation_deg,
        position_enu,
        velocity_enu,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Utc;

    fn fmcw_raw(is_false_alarm: bool) -> RawDetection {
        RawDetection {
            timestamp: Utc::now(),
            sensor_id: "RADAR_A".to_string(),
            format_tag: FormatTag::Fmcw,
            fields: RawFields::Fmcw {
                range_m: 1000.0,
                azimuth_deg: 45.0,
                elevation_deg: 10.0,
                doppler_mps: -15.0,
                snr_db: 20.0,
                target_id: None,
                rcs_dbsm: Some(10.0),
                is_false_alarm,
                beat_frequency_khz: Some(100.0),
                range_resolution_m: Some(0.05),
            },
        }
    }

    #[test]
    fn fmcw_normalization_scenario() {
        // Scenario 4 from spec.md.
        let n = Normalizer::new().normalize(&fmcw_raw(false)).unwrap();
        let pos = n.position_enu.unwrap();
        assert_relative_eq!(pos[0], 696.4, epsilon = 1e-1);
        assert_relative_eq!(pos[1], 696.4, epsilon = 1e-1);
        assert_relative_eq!(pos[2], 173.6, epsilon = 1e-1);
        assert_eq!(n.vendor_metadata["radar_type"], json!("FMCW"));

        let vel = n.velocity_enu.unwrap();
        // velocity must be collinear (antiparallel here, since doppler<0) with position
        let cross = [
            pos[1] * vel[2] - pos[2] * vel[1],
            pos[2] * vel[0] - pos[0] * vel[2],
            pos[0] * vel[1] - pos[1] * vel[0],
        ];
        for c in cross {
            assert_relative_eq!(c, 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn false_alarm_has_no_track_state_hint() {
        let n = Normalizer::new().normalize(&fmcw_raw(true)).unwrap();
        assert_eq!(n.track_state_hint, None);
    }

    #[test]
    fn unknown_format_falls_back_to_generic() {
        let raw = RawDetection {
            timestamp: Utc::now(),
            sensor_id: "MYSTERY".to_string(),
            format_tag: FormatTag::Unknown,
            fields: RawFields::Other(HashMap::from([(
                "range_m".to_string(),
                json!(500.0),
            )])),
        };
        let n = Normalizer::new().normalize(&raw).unwrap();
        assert_eq!(n.range_m, 500.0);
        assert_eq!(n.azimuth_deg, 0.0);
        assert!(n.position_enu.is_none());
    }

    #[test]
    fn aesa_high_snr_hints_confirmed() {
        let raw = RawDetection {
            timestamp: Utc::now(),
            sensor_id: "RADAR_C".to_string(),
            format_tag: FormatTag::Aesa,
            fields: RawFields::Aesa {
                range_m: 2000.0,
                azimuth_deg: 10.0,
                elevation_deg: 5.0,
                doppler_mps: 3.0,
                snr_db: 16.0,
                target_id: None,
                rcs_dbsm: None,
                beam_azimuth_deg: None,
                beam_elevation_deg: None,
                beam_gain_db: None,
                num_elements: None,
                angle_accuracy_deg: None,
            },
        };
        let n = Normalizer::new().normalize(&raw).unwrap();
        assert_eq!(n.track_state_hint, Some(TrackState::Confirmed));
    }

    #[test]
    fn negative_range_is_clamped() {
        let raw = RawDetection {
            timestamp: Utc::now(),
            sensor_id: "RADAR_A".to_string(),
            format_tag: FormatTag::Fmcw,
            fields: RawFields::Fmcw {
                range_m: -5.0,
                azimuth_deg: 400.0,
                elevation_deg: 200.0,
                doppler_mps: 0.0,
                snr_db: 10.0,
                target_id: None,
                rcs_dbsm: None,
                is_false_alarm: false,
                beat_frequency_khz: None,
                range_resolution_m: None,
            },
        };
        let n = Normalizer::new().normalize(&raw).unwrap();
        assert_eq!(n.range_m, 0.0);
        assert_eq!(n.azimuth_deg, 40.0);
        assert_eq!(n.elevation_deg, Some(90.0));
    }
}
