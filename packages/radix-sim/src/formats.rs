//! Per-vendor detection generators: FMCW, Pulse-Doppler, and AESA.

use rand::RngCore;
use rand_distr::{Distribution, Normal};
use radix_types::{FormatTag, RawFields};

use crate::simulator::{RadarConfig, RadarSimulator};
use crate::target::Target;

/// Common automotive/short-range FMCW radar: fine range resolution, no
/// dedicated beam steering.
#[derive(Debug)]
pub struct FmcwSimulator {
    pub config: RadarConfig,
    pub targets: Vec<Target>,
    pub bandwidth_mhz: f64,
    pub chirp_time_us: f64,
    pub range_resolution_m: f64,
}

impl FmcwSimulator {
    pub fn new(config: RadarConfig, bandwidth_mhz: f64, chirp_time_us: f64) -> Self {
        let range_resolution_m = 3e8 / (2.0 * bandwidth_mhz * 1e6);
        Self {
            config,
            targets: Vec::new(),
            bandwidth_mhz,
            chirp_time_us,
            range_resolution_m,
        }
    }
}

impl Default for FmcwSimulator {
    fn default() -> Self {
        Self::new(RadarConfig::new("FMCW_1", [0.0, 0.0, 0.0]), 4000.0, 50.0)
    }
}

impl RadarSimulator for FmcwSimulator {
    fn config(&self) -> &RadarConfig {
        &self.config
    }

    fn format_tag(&self) -> FormatTag {
        FormatTag::Fmcw
    }

    fn targets(&self) -> &[Target] {
        &self.targets
    }

    fn targets_mut(&mut self) -> &mut Vec<Target> {
        &mut self.targets
    }

    fn generate_detection(
        &self,
        target: &Target,
        range_m: f64,
        azimuth_deg: f64,
        elevation_deg: f64,
        doppler_mps: f64,
        snr_db: f64,
        rng: &mut dyn RngCore,
    ) -> RawFields {
        let range_noise = Normal::new(0.0, self.config.range_noise_std).unwrap();
        let angle_noise = Normal::new(0.0, self.config.angle_noise_std).unwrap();
        let doppler_noise = Normal::new(0.0, self.config.doppler_noise_std).unwrap();

        let range_m = range_m + range_noise.sample(rng);
        let azimuth_deg = azimuth_deg + angle_noise.sample(rng);
        let elevation_deg = elevation_deg + angle_noise.sample(rng);
        let doppler_mps = doppler_mps + doppler_noise.sample(rng);

        let beat_frequency_khz =
            (2.0 * self.bandwidth_mhz * range_m) / (3e8 * self.chirp_time_us * 1e-6) / 1000.0;

        RawFields::Fmcw {
            range_m: range_m.max(0.0),
            azimuth_deg: azimuth_deg.rem_euclid(360.0),
            elevation_deg: elevation_deg.clamp(-90.0, 90.0),
            doppler_mps,
            snr_db,
            target_id: Some(target.target_id),
            rcs_dbsm: Some(target.rcs_dbsm),
            is_false_alarm: false,
            beat_frequency_khz: Some(beat_frequency_khz),
            range_resolution_m: Some(self.range_resolution_m),
        }
    }
}

/// Airborne/air-defense pulse-Doppler radar: reports unambiguous-range and
/// velocity-folding artifacts alongside the measurement.
#[derive(Debug)]
pub struct PulseDopplerSimulator {
    pub config: RadarConfig,
    pub targets: Vec<Target>,
    pub prf_hz: f64,
    pub pulse_width_us: f64,
    pub num_pulses: u32,
    pub wavelength_m: f64,
    pub max_unambiguous_range_m: f64,
    pub max_unambiguous_velocity_mps: f64,
}

impl PulseDopplerSimulator {
    pub fn new(config: RadarConfig, frequency_ghz: f64, prf_hz: f64) -> Self {
        let wavelength_m = 3e8 / (frequency_ghz * 1e9);
        Self {
            config,
            targets: Vec::new(),
            prf_hz,
            pulse_width_us: 1.0,
            num_pulses: 128,
            wavelength_m,
            max_unambiguous_range_m: 3e8 / (2.0 * prf_hz),
            max_unambiguous_velocity_mps: (wavelength_m * prf_hz) / 4.0,
        }
    }
}

impl Default for PulseDopplerSimulator {
    fn default() -> Self {
        Self::new(RadarConfig::new("PD_1", [0.0, 0.0, 0.0]), 10.0, 10_000.0)
    }
}

impl RadarSimulator for PulseDopplerSimulator {
    fn config(&self) -> &RadarConfig {
        &self.config
    }

    fn format_tag(&self) -> FormatTag {
        FormatTag::PulseDoppler
    }

    fn targets(&self) -> &[Target] {
        &self.targets
    }

    fn targets_mut(&mut self) -> &mut Vec<Target> {
        &mut self.targets
    }

    fn generate_detection(
        &self,
        target: &Target,
        range_m: f64,
        azimuth_deg: f64,
        elevation_deg: f64,
        doppler_mps: f64,
        snr_db: f64,
        rng: &mut dyn RngCore,
    ) -> RawFields {
        let range_noise = Normal::new(0.0, self.config.range_noise_std).unwrap();
        let angle_noise = Normal::new(0.0, self.config.angle_noise_std).unwrap();
        let elevation_noise = Normal::new(0.0, self.config.angle_noise_std * 1.5).unwrap();
        let doppler_noise = Normal::new(0.0, self.config.doppler_noise_std).unwrap();

        let range_m = range_m + range_noise.sample(rng);
        let azimuth_deg = azimuth_deg + angle_noise.sample(rng);
        let elevation_deg = elevation_deg + elevation_noise.sample(rng);
        let doppler_mps = doppler_mps + doppler_noise.sample(rng);

        let doppler_freq_hz = 2.0 * doppler_mps / self.wavelength_m;
        let range_ambiguity = (range_m / self.max_unambiguous_range_m) as i64;
        let velocity_folded = doppler_mps.rem_euclid(2.0 * self.max_unambiguous_velocity_mps)
            - self.max_unambiguous_velocity_mps;

        RawFields::PulseDoppler {
            range_m: range_m.max(0.0),
            azimuth_deg: azimuth_deg.rem_euclid(360.0),
            elevation_deg: elevation_deg.clamp(-90.0, 90.0),
            doppler_mps,
            snr_db,
            target_id: Some(target.target_id),
            rcs_dbsm: Some(target.rcs_dbsm),
            is_false_alarm: false,
            prf_hz: Some(self.prf_hz),
            doppler_freq_hz: Some(doppler_freq_hz),
            velocity_folded: Some(velocity_folded),
            range_ambiguity: Some(range_ambiguity as f64),
        }
    }
}

/// Active electronically scanned array: beam steering modulates SNR via a
/// Gaussian beam-gain pattern, and angle accuracy is noticeably tighter.
#[derive(Debug)]
pub struct AesaSimulator {
    pub config: RadarConfig,
    pub targets: Vec<Target>,
    pub elements: u32,
    pub beam_width_deg: f64,
    pub scan_azimuth_range: (f64, f64),
    beam_azimuth_deg: f64,
    beam_elevation_deg: f64,
}

impl AesaSimulator {
    pub fn new(config: RadarConfig, elements: u32, beam_width_deg: f64) -> Self {
        Self {
            config,
            targets: Vec::new(),
            elements,
            beam_width_deg,
            scan_azimuth_range: (-60.0, 60.0),
            beam_azimuth_deg: 0.0,
            beam_elevation_deg: 0.0,
        }
    }

    fn beam_gain_db(&self, target_az: f64, target_el: f64) -> f64 {
        let az_diff = (target_az - self.beam_azimuth_deg).abs();
        let el_diff = (target_el - self.beam_elevation_deg).abs();
        let gain_db = -12.0
            * ((az_diff / self.beam_width_deg).powi(2) + (el_diff / self.beam_width_deg).powi(2));
        gain_db.max(-40.0)
    }
}

impl Default for AesaSimulator {
    fn default() -> Self {
        Self::new(RadarConfig::new("AESA_1", [0.0, 0.0, 0.0]), 1024, 2.0)
    }
}

impl RadarSimulator for AesaSimulator {
    fn config(&self) -> &RadarConfig {
        &self.config
    }

    fn format_tag(&self) -> FormatTag {
        FormatTag::Aesa
    }

    fn targets(&self) -> &[Target] {
        &self.targets
    }

    fn targets_mut(&mut self) -> &mut Vec<Target> {
        &mut self.targets
    }

    fn generate_detection(
        &self,
        target: &Target,
        range_m: f64,
        azimuth_deg: f64,
        elevation_deg: f64,
        doppler_mps: f64,
        _snr_db: f64,
        rng: &mut dyn RngCore,
    ) -> RawFields {
        let beam_gain_db = self.beam_gain_db(azimuth_deg, elevation_deg);
        let snr_db = crate::simulator::calculate_snr(range_m, target.rcs_dbsm, rng) + beam_gain_db;

        let range_noise = Normal::new(0.0, self.config.range_noise_std * 0.5).unwrap();
        let angle_noise = Normal::new(0.0, self.config.angle_noise_std * 0.3).unwrap();
        let doppler_noise = Normal::new(0.0, self.config.doppler_noise_std * 0.5).unwrap();

        let range_m = range_m + range_noise.sample(rng);
        let azimuth_deg = azimuth_deg + angle_noise.sample(rng);
        let elevation_deg = elevation_deg + angle_noise.sample(rng);
        let doppler_mps = doppler_mps + doppler_noise.sample(rng);

        RawFields::Aesa {
            range_m: range_m.max(0.0),
            azimuth_deg: azimuth_deg.rem_euclid(360.0),
            elevation_deg: elevation_deg.clamp(-90.0, 90.0),
            doppler_mps,
            snr_db,
            target_id: Some(target.target_id),
            rcs_dbsm: Some(target.rcs_dbsm),
            beam_azimuth_deg: Some(self.beam_azimuth_deg),
            beam_elevation_deg: Some(self.beam_elevation_deg),
            beam_gain_db: Some(beam_gain_db),
            num_elements: Some(self.elements as f64),
            angle_accuracy_deg: Some(self.config.angle_noise_std * 0.3),
        }
    }

    fn post_tick(&mut self) {
        self.sweep_beam();
    }
}

impl AesaSimulator {
    /// Advances the beam through a simple sweep pattern; called once per tick
    /// by the orchestrator after `simulate_frame`.
    pub fn sweep_beam(&mut self) {
        self.beam_azimuth_deg += 5.0;
        if self.beam_azimuth_deg > self.scan_azimuth_range.1 {
            self.beam_azimuth_deg = self.scan_azimuth_range.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn fmcw_detects_a_nearby_target() {
        let mut sim = FmcwSimulator::default();
        sim.add_target(Target::new(1, [1000.0, 1000.0, 0.0], [-10.0, -10.0, 0.0], 10.0));
        let mut rng = StdRng::seed_from_u64(7);
        let mut saw_detection = false;
        for _ in 0..20 {
            let detections = sim.simulate_frame(Utc::now(), &mut rng);
            if detections.iter().any(|d| matches!(d.fields, RawFields::Fmcw { is_false_alarm: false, .. })) {
                saw_detection = true;
                break;
            }
        }
        assert!(saw_detection);
    }

    #[test]
    fn pulse_doppler_reports_ambiguity_fields() {
        let mut sim = PulseDopplerSimulator::default();
        sim.add_target(Target::new(1, [500.0, 500.0, 100.0], [0.0, -5.0, 0.0], 15.0));
        let mut rng = StdRng::seed_from_u64(3);
        let detections = sim.simulate_frame(Utc::now(), &mut rng);
        for d in detections {
            if let RawFields::PulseDoppler { doppler_freq_hz, .. } = d.fields {
                assert!(doppler_freq_hz.is_some());
            }
        }
    }

    #[test]
    fn aesa_beam_sweep_wraps_around() {
        let mut sim = AesaSimulator::default();
        sim.beam_azimuth_deg = 58.0;
        for _ in 0..3 {
            sim.sweep_beam();
        }
        assert!(sim.beam_azimuth_deg <= sim.scan_azimuth_range.1);
    }
}
