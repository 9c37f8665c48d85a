//! # radix-types
//!
//! Shared data model for the RADIX radar detection pipeline.
//!
//! These types are used by:
//! - `radix-core`: normalizing raw detections, tracking, and extracting datasets
//! - `radix-sim`: producing `RawDetection`s from synthetic per-vendor sensors
//! - `radix-server`: the HTTP/WS network surface
//!
//! ## Coordinate conventions
//!
//! - **ENU**: East-North-Up, local Cartesian, centered on the sensor.
//! - Azimuth is measured from +y (North) toward +x (East), clockwise, in `[0, 360)`.
//! - Elevation is measured from the horizontal plane, in `[-90, 90]`.
//! - Doppler is the signed radial (line-of-sight) velocity; negative = approaching.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

// ── Format tags ────────────────────────────────────────────────────────────

/// Vendor radar format, selecting the normalizer's dispatch handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormatTag {
    Fmcw,
    PulseDoppler,
    Aesa,
    Isar,
    Cw,
    Unknown,
}

impl std::fmt::Display for FormatTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_string(self).unwrap_or_default();
        write!(f, "{}", s.trim_matches('"'))
    }
}

// ── Raw detection (sensor frontend → normalizer) ──────────────────────────────

/// Per-format fields carried by a raw detection, re-expressed as a tagged sum
/// rather than a duck-typed map. `Other` preserves whatever the frontend sent
/// for vendors the normalizer doesn't know about.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum RawFields {
    Fmcw {
        range_m: f64,
        azimuth_deg: f64,
        elevation_deg: f64,
        doppler_mps: f64,
        snr_db: f64,
        #[serde(default)]
        target_id: Option<i64>,
        #[serde(default)]
        rcs_dbsm: Option<f64>,
        #[serde(default)]
        is_false_alarm: bool,
        #[serde(default)]
        beat_frequency_khz: Option<f64>,
        #[serde(default)]
        range_resolution_m: Option<f64>,
    },
    PulseDoppler {
        range_m: f64,
        azimuth_deg: f64,
        elevation_deg: f64,
        doppler_mps: f64,
        snr_db: f64,
        #[serde(default)]
        target_id: Option<i64>,
        #[serde(default)]
        rcs_dbsm: Option<f64>,
        #[serde(default)]
        is_false_alarm: bool,
        #[serde(default)]
        prf_hz: Option<f64>,
        #[serde(default)]
        doppler_freq_hz: Option<f64>,
        #[serde(default)]
        velocity_folded: Option<f64>,
        #[serde(default)]
        range_ambiguity: Option<f64>,
    },
    Aesa {
        range_m: f64,
        azimuth_deg: f64,
        elevation_deg: f64,
        doppler_mps: f64,
        snr_db: f64,
        #[serde(default)]
        target_id: Option<i64>,
        #[serde(default)]
        rcs_dbsm: Option<f64>,
        #[serde(default)]
        beam_azimuth_deg: Option<f64>,
        #[serde(default)]
        beam_elevation_deg: Option<f64>,
        #[serde(default)]
        beam_gain_db: Option<f64>,
        #[serde(default)]
        num_elements: Option<f64>,
        #[serde(default)]
        angle_accuracy_deg: Option<f64>,
    },
    /// Unknown or partially-populated vendor payload; missing numeric fields
    /// default to zero per spec.
    Other(HashMap<String, serde_json::Value>),
}

/// Inbound, vendor-specific detection before normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDetection {
    pub timestamp: DateTime<Utc>,
    pub sensor_id: String,
    pub format_tag: FormatTag,
    pub fields: RawFields,
}

// ── Normalized detection (unified schema) ─────────────────────────────────────

/// Unified measurement produced by the normalizer, consumed by the tracker and
/// extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedDetection {
    pub timestamp: DateTime<Utc>,
    pub sensor_id: String,
    pub target_id: Option<i64>,
    pub range_m: f64,
    pub azimuth_deg: f64,
    pub elevation_deg: Option<f64>,
    pub doppler_mps: f64,
    pub snr_db: f64,
    pub rcs_dbsm: Option<f64>,
    pub track_state_hint: Option<TrackState>,
    pub position_enu: Option<[f64; 3]>,
    pub velocity_enu: Option<[f64; 3]>,
    pub vendor_metadata: HashMap<String, serde_json::Value>,
}

// ── Track ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackState {
    Tentative,
    Confirmed,
    Coasting,
    Lost,
}

/// An association hypothesis maintained by the tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub track_id: u64,
    pub sensor_id: String,
    pub first_seen: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub state_vector: [f64; 6],
    pub track_state: TrackState,
    /// Last `<= 50` detections, oldest first. Ring-capped; does not govern
    /// confirmation (see `cumulative_detections`).
    pub detections: VecDeque<NormalizedDetection>,
    /// Lifetime association count. Never decremented by ring eviction — this is
    /// what actually governs the CONFIRMED threshold.
    pub cumulative_detections: u64,
}

impl Track {
    pub fn position(&self) -> [f64; 3] {
        [self.state_vector[0], self.state_vector[1], self.state_vector[2]]
    }

    pub fn velocity(&self) -> [f64; 3] {
        [self.state_vector[3], self.state_vector[4], self.state_vector[5]]
    }
}

/// The external view of a `Track`: what `list_tracks` and the push-frame
/// report, as opposed to the full detection history `Track` itself carries
/// for dataset extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackSummary {
    pub track_id: u64,
    pub sensor_id: String,
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub track_state: TrackState,
    pub first_seen: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub num_detections: usize,
}

impl From<&Track> for TrackSummary {
    fn from(track: &Track) -> Self {
        Self {
            track_id: track.track_id,
            sensor_id: track.sensor_id.clone(),
            position: track.position(),
            velocity: track.velocity(),
            track_state: track.track_state,
            first_seen: track.first_seen,
            last_updated: track.last_updated,
            num_detections: track.detections.len(),
        }
    }
}

// ── Dataset descriptor ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetFormat {
    Tabular,
    Sequence,
    Graph,
}

impl std::str::FromStr for DatasetFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tabular" => Ok(Self::Tabular),
            "sequence" => Ok(Self::Sequence),
            "graph" => Ok(Self::Graph),
            _ => Err(()),
        }
    }
}

/// Immutable metadata handle for a registered ML dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    pub dataset_id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub sensor_ids: HashSet<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub num_samples: usize,
    pub format: DatasetFormat,
    pub metadata: HashMap<String, serde_json::Value>,
}

// ── Sensor info (query surface) ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub format_tag: FormatTag,
    pub location: [f64; 3],
    pub enabled: bool,
}

// ── System status ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStatus {
    pub uptime_seconds: f64,
    pub active_radars: usize,
    pub total_detections: u64,
    pub active_tracks: usize,
    pub data_rate_hz: f64,
    pub timestamp: DateTime<Utc>,
}
