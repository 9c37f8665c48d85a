//! Shared radar-simulator machinery: detection probability, SNR model, and
//! the per-tick frame assembly loop common to every vendor format.

use chrono::{DateTime, Utc};
use rand::{Rng, RngCore};
use rand_distr::{Distribution, Normal, Poisson, Uniform};
use radix_types::{FormatTag, RawDetection, RawFields};
use serde_json::json;
use std::collections::HashMap;

use crate::target::Target;

/// Common per-sensor parameters shared by every vendor format.
#[derive(Debug, Clone)]
pub struct RadarConfig {
    pub id: String,
    pub location: [f64; 3],
    pub min_range_m: f64,
    pub max_range_m: f64,
    pub detection_probability: f64,
    pub false_alarm_rate: f64,
    pub range_noise_std: f64,
    pub angle_noise_std: f64,
    pub doppler_noise_std: f64,
}

impl RadarConfig {
    pub fn new(id: impl Into<String>, location: [f64; 3]) -> Self {
        Self {
            id: id.into(),
            location,
            min_range_m: 50.0,
            max_range_m: 10_000.0,
            detection_probability: 0.95,
            false_alarm_rate: 0.01,
            range_noise_std: 5.0,
            angle_noise_std: 0.5,
            doppler_noise_std: 0.5,
        }
    }
}

/// Simplified radar-equation SNR model: 1/R^4 range loss plus RCS gain,
/// perturbed by measurement noise.
pub fn calculate_snr(range_m: f64, rcs_dbsm: f64, rng: &mut dyn RngCore) -> f64 {
    let base_snr = 30.0;
    let range_loss = 40.0 * (range_m / 1000.0).log10();
    let noise = Normal::new(0.0, 2.0).unwrap().sample(rng);
    (base_snr - range_loss + rcs_dbsm + noise).max(-10.0)
}

/// Detection probability as a step function of SNR.
pub fn should_detect(snr_db: f64, detection_probability: f64, rng: &mut dyn RngCore) -> bool {
    let prob = if snr_db > 13.0 {
        detection_probability
    } else if snr_db > 5.0 {
        0.7
    } else if snr_db > 0.0 {
        0.3
    } else {
        0.1
    };
    rng.gen::<f64>() < prob
}

/// A clutter/noise detection unrelated to any simulated target. Reported as
/// `RawFields::Other` since it carries only the common fields, not a vendor's
/// full measurement set.
pub fn generate_false_alarm(
    sensor_id: &str,
    format_tag: FormatTag,
    timestamp: DateTime<Utc>,
    rng: &mut dyn RngCore,
) -> RawDetection {
    let range_m = Uniform::new(100.0, 10_000.0).sample(rng);
    let azimuth_deg = Uniform::new(0.0, 360.0).sample(rng);
    let elevation_deg = Uniform::new(-10.0, 45.0).sample(rng);
    let doppler_mps = Uniform::new(-50.0, 50.0).sample(rng);
    let snr_db = Uniform::new(0.0, 8.0).sample(rng);

    let fields = RawFields::Other(HashMap::from([
        ("range_m".to_string(), json!(range_m)),
        ("azimuth_deg".to_string(), json!(azimuth_deg)),
        ("elevation_deg".to_string(), json!(elevation_deg)),
        ("doppler_mps".to_string(), json!(doppler_mps)),
        ("snr_db".to_string(), json!(snr_db)),
        ("is_false_alarm".to_string(), json!(true)),
    ]));

    RawDetection {
        timestamp,
        sensor_id: sensor_id.to_string(),
        format_tag,
        fields,
    }
}

/// Implemented by each vendor-format simulator. Only `generate_detection` is
/// format-specific; `simulate_frame` assembles a whole tick the same way for
/// all of them, mirroring the base/subclass split of the ported Python model.
pub trait RadarSimulator {
    fn config(&self) -> &RadarConfig;
    fn format_tag(&self) -> FormatTag;
    fn targets(&self) -> &[Target];
    fn targets_mut(&mut self) -> &mut Vec<Target>;

    fn add_target(&mut self, target: Target) {
        self.targets_mut().push(target);
    }

    fn update_targets(&mut self, dt: f64) {
        for target in self.targets_mut() {
            target.step(dt);
        }
    }

    /// Per-tick housekeeping with no Python counterpart in the shared base
    /// class (e.g. AESA's beam sweep). No-op by default.
    fn post_tick(&mut self) {}

    /// Builds the vendor-specific field set for one detected target.
    fn generate_detection(
        &self,
        target: &Target,
        range_m: f64,
        azimuth_deg: f64,
        elevation_deg: f64,
        doppler_mps: f64,
        snr_db: f64,
        rng: &mut dyn RngCore,
    ) -> RawFields;

    fn simulate_frame(&mut self, timestamp: DateTime<Utc>, rng: &mut dyn RngCore) -> Vec<RawDetection> {
        let radar_pos = self.config().location;
        let min_range_m = self.config().min_range_m;
        let max_range_m = self.config().max_range_m;
        let detection_probability = self.config().detection_probability;
        let false_alarm_rate = self.config().false_alarm_rate;
        let sensor_id = self.config().id.clone();
        let format_tag = self.format_tag();

        let targets = self.targets().to_vec();
        let mut detections = Vec::new();

        for target in &targets {
            let (range_m, azimuth_deg, elevation_deg) = target.range_azimuth_elevation(radar_pos);
            if range_m <= min_range_m || range_m >= max_range_m {
                continue;
            }
            let snr_db = calculate_snr(range_m, target.rcs_dbsm, rng);
            if !should_detect(snr_db, detection_probability, rng) {
                continue;
            }
            let doppler_mps = target.doppler_mps(radar_pos);
            let fields = self.generate_detection(
                target,
                range_m,
                azimuth_deg,
                elevation_deg,
                doppler_mps,
                snr_db,
                rng,
            );
            detections.push(RawDetection {
                timestamp,
                sensor_id: sensor_id.clone(),
                format_tag,
                fields,
            });
        }

        let num_false_alarms = Poisson::new(false_alarm_rate * 100.0)
            .unwrap()
            .sample(rng) as u32;
        for _ in 0..num_false_alarms {
            detections.push(generate_false_alarm(&sensor_id, format_tag, timestamp, rng));
        }

        detections
    }
}
