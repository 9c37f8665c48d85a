//! Owns the sensor set, the normalizer/tracker/extractor pipeline, and the
//! bounded detection ring. Ticked by a single task in `main.rs`; read
//! concurrently by HTTP handlers through `Arc<RwLock<Orchestrator>>`.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use radix_core::{Extractor, Normalizer, Tracker};
use radix_sim::{AesaSimulator, FmcwSimulator, PulseDopplerSimulator, RadarSimulator, Target};
use radix_types::{FormatTag, NormalizedDetection, SensorInfo, SystemStatus, Track, TrackSummary};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::config::PipelineConfig;

/// The push-surface frame broadcast once per tick to every `/ws` subscriber.
#[derive(Debug, Clone, Serialize)]
pub struct FrameUpdate {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub timestamp: DateTime<Utc>,
    /// This tick's normalized detections, capped at 50.
    pub detections: Vec<NormalizedDetection>,
    pub tracks: Vec<TrackSummary>,
    pub system_status: SystemStatus,
}

/// Recursively rounds every JSON number to `decimals` places. Applied to the
/// push frame only — pull endpoints serve full precision.
pub fn round_floats(value: &mut serde_json::Value, decimals: i32) {
    let factor = 10f64.powi(decimals);
    match value {
        serde_json::Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                let rounded = (f * factor).round() / factor;
                if let Some(replacement) = serde_json::Number::from_f64(rounded) {
                    *n = replacement;
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                round_floats(item, decimals);
            }
        }
        serde_json::Value::Object(map) => {
            for v in map.values_mut() {
                round_floats(v, decimals);
            }
        }
        _ => {}
    }
}

pub type SharedOrchestrator = Arc<RwLock<Orchestrator>>;

pub struct Orchestrator {
    sensors: Vec<Box<dyn RadarSimulator + Send + Sync>>,
    sensor_info: Vec<SensorInfo>,
    normalizer: Normalizer,
    tracker: Tracker,
    extractor: Extractor,
    rng: StdRng,
    detections: VecDeque<NormalizedDetection>,
    detection_ring_capacity: usize,
    total_detections: u64,
    /// (tick timestamp, detection count) pairs spanning at least the last
    /// second, used to compute a time-windowed `data_rate_hz`.
    recent_ticks: VecDeque<(DateTime<Utc>, usize)>,
    started_at: Instant,
}

impl Orchestrator {
    pub fn new(config: &PipelineConfig) -> Self {
        let mut sensors: Vec<Box<dyn RadarSimulator + Send + Sync>> = Vec::new();
        let mut sensor_info = Vec::new();

        if config.sensors.fmcw {
            let mut sim = FmcwSimulator::default();
            sim.add_target(Target::new(1, [1200.0, 800.0, 50.0], [-15.0, 5.0, 0.0], 8.0));
            sensor_info.push(SensorInfo {
                id: sim.config.id.clone(),
                format_tag: FormatTag::Fmcw,
                location: sim.config.location,
                enabled: true,
            });
            sensors.push(Box::new(sim));
        }
        if config.sensors.pulse_doppler {
            let mut sim = PulseDopplerSimulator::default();
            sim.add_target(Target::new(
                2,
                [3000.0, -2000.0, 1500.0],
                [-200.0, 150.0, -5.0],
                20.0,
            ));
            sensor_info.push(SensorInfo {
                id: sim.config.id.clone(),
                format_tag: FormatTag::PulseDoppler,
                location: sim.config.location,
                enabled: true,
            });
            sensors.push(Box::new(sim));
        }
        if config.sensors.aesa {
            let mut sim = AesaSimulator::default();
            sim.add_target(Target::new(3, [500.0, 500.0, 100.0], [0.0, -20.0, 0.0], 5.0));
            sensor_info.push(SensorInfo {
                id: sim.config.id.clone(),
                format_tag: FormatTag::Aesa,
                location: sim.config.location,
                enabled: true,
            });
            sensors.push(Box::new(sim));
        }

        Self {
            sensors,
            sensor_info,
            normalizer: Normalizer::new(),
            tracker: Tracker::new(config.association_gate_m, config.max_coast_time_s),
            extractor: Extractor::new(),
            rng: StdRng::from_entropy(),
            detections: VecDeque::new(),
            detection_ring_capacity: config.detection_ring_capacity,
            total_detections: 0,
            recent_ticks: VecDeque::with_capacity(32),
            started_at: Instant::now(),
        }
    }

    /// Advances every sensor by `dt` seconds, normalizes its frame, and
    /// associates the result into the tracker.
    pub fn tick(&mut self, timestamp: DateTime<Utc>, dt: f64) -> FrameUpdate {
        let mut raws = Vec::new();
        for sensor in &mut self.sensors {
            sensor.update_targets(dt);
            raws.extend(sensor.simulate_frame(timestamp, &mut self.rng));
            sensor.post_tick();
        }

        let normalized = self.normalizer.batch_normalize(&raws);
        self.total_detections += normalized.len() as u64;

        self.recent_ticks.push_back((timestamp, normalized.len()));
        while self.recent_ticks.len() > 2
            && (timestamp - self.recent_ticks[1].0).num_milliseconds() as f64 / 1000.0 >= 1.0
        {
            self.recent_ticks.pop_front();
        }

        for det in &normalized {
            self.detections.push_back(det.clone());
        }
        while self.detections.len() > self.detection_ring_capacity {
            self.detections.pop_front();
        }

        let tracks = self.tracker.update_at(&normalized, timestamp);
        let track_summaries: Vec<TrackSummary> = tracks.iter().map(TrackSummary::from).collect();

        let mut frame_detections = normalized;
        if frame_detections.len() > 50 {
            let overflow = frame_detections.len() - 50;
            frame_detections.drain(0..overflow);
        }

        FrameUpdate {
            kind: "update",
            timestamp,
            detections: frame_detections,
            tracks: track_summaries,
            system_status: self.status(),
        }
    }

    pub fn status(&self) -> SystemStatus {
        let data_rate_hz = if self.recent_ticks.len() < 2 {
            0.0
        } else {
            let total: usize = self.recent_ticks.iter().map(|(_, c)| *c).sum();
            let oldest = self.recent_ticks.front().unwrap().0;
            let newest = self.recent_ticks.back().unwrap().0;
            let elapsed_s = (newest - oldest).num_milliseconds() as f64 / 1000.0;
            if elapsed_s > 0.0 {
                total as f64 / elapsed_s
            } else {
                0.0
            }
        };

        SystemStatus {
            uptime_seconds: self.started_at.elapsed().as_secs_f64(),
            active_radars: self.sensors.len(),
            total_detections: self.total_detections,
            active_tracks: self.tracker.active_tracks().len(),
            data_rate_hz,
            timestamp: Utc::now(),
        }
    }

    pub fn sensor_info(&self) -> &[SensorInfo] {
        &self.sensor_info
    }

    /// Last `limit` retained detections, oldest first.
    pub fn recent_detections(&self, limit: usize) -> Vec<NormalizedDetection> {
        let skip = self.detections.len().saturating_sub(limit);
        self.detections.iter().skip(skip).cloned().collect()
    }

    /// The full retained detection ring, oldest first. Used to build ML
    /// datasets, which must see detections never associated into a track.
    pub fn all_detections(&self) -> Vec<NormalizedDetection> {
        self.detections.iter().cloned().collect()
    }

    /// Tracks fit to report externally (CONFIRMED or COASTING).
    pub fn active_tracks(&self) -> Vec<Track> {
        self.tracker.active_tracks()
    }

    /// Every live track regardless of state, for dataset extraction.
    pub fn all_tracks(&self) -> Vec<Track> {
        self.tracker.all_tracks()
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    pub fn extractor_mut(&mut self) -> &mut Extractor {
        &mut self.extractor
    }
}
