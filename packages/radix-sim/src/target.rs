//! Simulated target kinematics.

use chrono::{DateTime, Utc};
use radix_core::coord::range_az_el_from_enu;
use serde::{Deserialize, Serialize};

/// Half-width of the bounding box a target bounces inside of, meters.
const WORLD_BOUND_M: f64 = 10_000.0;

/// A point target with constant-velocity kinematics, reflecting off a fixed
/// bounding box so long-running simulations stay in radar coverage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub target_id: i64,
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub rcs_dbsm: f64,
}

impl Target {
    pub fn new(target_id: i64, position: [f64; 3], velocity: [f64; 3], rcs_dbsm: f64) -> Self {
        Self {
            target_id,
            position,
            velocity,
            rcs_dbsm,
        }
    }

    pub fn step(&mut self, dt: f64) {
        for i in 0..3 {
            self.position[i] += self.velocity[i] * dt;
            if self.position[i].abs() > WORLD_BOUND_M {
                self.velocity[i] *= -1.0;
                self.position[i] = self.position[i].clamp(-WORLD_BOUND_M, WORLD_BOUND_M);
            }
        }
    }

    /// Range, azimuth, elevation relative to a sensor at `radar_pos`.
    pub fn range_azimuth_elevation(&self, radar_pos: [f64; 3]) -> (f64, f64, f64) {
        let delta = [
            self.position[0] - radar_pos[0],
            self.position[1] - radar_pos[1],
            self.position[2] - radar_pos[2],
        ];
        range_az_el_from_enu(delta)
    }

    /// Radial (line-of-sight) velocity relative to a sensor at `radar_pos`.
    pub fn doppler_mps(&self, radar_pos: [f64; 3]) -> f64 {
        let delta = [
            self.position[0] - radar_pos[0],
            self.position[1] - radar_pos[1],
            self.position[2] - radar_pos[2],
        ];
        let range_m = (delta[0] * delta[0] + delta[1] * delta[1] + delta[2] * delta[2]).sqrt();
        if range_m < 1e-9 {
            return 0.0;
        }
        let los = [delta[0] / range_m, delta[1] / range_m, delta[2] / range_m];
        self.velocity[0] * los[0] + self.velocity[1] * los[1] + self.velocity[2] * los[2]
    }
}

/// A tick boundary used only to timestamp generated frames; kept separate
/// from `chrono::Utc::now()` so callers (and tests) can drive simulated time.
pub fn tick_timestamp(start: DateTime<Utc>, elapsed_s: f64) -> DateTime<Utc> {
    start + chrono::Duration::milliseconds((elapsed_s * 1000.0) as i64)
}
