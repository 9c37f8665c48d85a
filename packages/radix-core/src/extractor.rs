//! ML dataset extraction: tabular, sequence, and graph projections over
//! normalized detections and tracks, plus a registry of materialized
//! dataset descriptors.

use chrono::{DateTime, Utc};
use radix_types::{DatasetDescriptor, DatasetFormat, NormalizedDetection, Track, TrackState};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("dataset {0} not found")]
    NotFound(String),
    #[error("unsupported dataset format: {0}")]
    InvalidFormat(String),
    #[error("no detections available to extract from")]
    Empty,
}

/// Sliding-window length for the `sequence` projection.
const SEQUENCE_WINDOW: usize = 10;
/// Window stride for the `sequence` projection.
const SEQUENCE_STRIDE: usize = 1;
/// Proximity radius (meters) beyond which the `graph` adjacency weight is zero.
const PROXIMITY_RADIUS_M: f64 = 1000.0;

/// One row of the tabular projection: flattened per-detection feature vector.
/// Column order is fixed: absent optional inputs fall back to documented
/// defaults (`target_id` -1, `elevation_deg`/`rcs_dbsm` 0); ENU axes are only
/// present when the detection carries ENU at all.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TabularRow {
    pub timestamp: DateTime<Utc>,
    pub sensor_id: String,
    pub target_id: i64,
    pub range_m: f64,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub doppler_mps: f64,
    pub snr_db: f64,
    pub rcs_dbsm: f64,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub vx: Option<f64>,
    pub vy: Option<f64>,
    pub vz: Option<f64>,
}

fn tabular_row(d: &NormalizedDetection) -> TabularRow {
    let (x, y, z) = match d.position_enu {
        Some(p) => (Some(p[0]), Some(p[1]), Some(p[2])),
        None => (None, None, None),
    };
    let (vx, vy, vz) = match d.velocity_enu {
        Some(v) => (Some(v[0]), Some(v[1]), Some(v[2])),
        None => (None, None, None),
    };
    TabularRow {
        timestamp: d.timestamp,
        sensor_id: d.sensor_id.clone(),
        target_id: d.target_id.unwrap_or(-1),
        range_m: d.range_m,
        azimuth_deg: d.azimuth_deg,
        elevation_deg: d.elevation_deg.unwrap_or(0.0),
        doppler_mps: d.doppler_mps,
        snr_db: d.snr_db,
        rcs_dbsm: d.rcs_dbsm.unwrap_or(0.0),
        x,
        y,
        z,
        vx,
        vy,
        vz,
    }
}

/// One tabular row plus the owning track's identity at emit time.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SequenceRow {
    #[serde(flatten)]
    pub detection: TabularRow,
    pub track_id: u64,
    pub track_state: TrackState,
}

/// One sliding window over a single track's detection history.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SequenceWindow {
    pub track_id: u64,
    pub start_index: usize,
    pub rows: Vec<SequenceRow>,
}

/// Symmetric proximity-weighted adjacency over the current track set.
#[derive(Debug, Clone, serde::Serialize)]
pub struct GraphDataset {
    pub track_ids: Vec<u64>,
    pub adjacency: Vec<Vec<f64>>,
    pub edge_index: Vec<(usize, usize)>,
}

/// Per-track summary statistics. `None` when the track has fewer than two
/// detections or none of them carry ENU position.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TrackFeatures {
    pub track_id: u64,
    pub mean_position: [f64; 3],
    pub std_position: [f64; 3],
    pub mean_speed_mps: f64,
    pub std_speed_mps: f64,
    pub num_detections: u64,
    pub duration_seconds: f64,
}

struct DatasetEntry {
    descriptor: DatasetDescriptor,
    detections: Vec<NormalizedDetection>,
    tracks: Vec<Track>,
}

/// Stateless (data in, data out) projections plus a stateful dataset registry.
#[derive(Default)]
pub struct Extractor {
    datasets: HashMap<String, DatasetEntry>,
    next_dataset_id: u64,
}

impl Extractor {
    pub fn new() -> Self {
        Self {
            datasets: HashMap::new(),
            next_dataset_id: 1,
        }
    }

    /// One row per detection, independent of track membership.
    pub fn tabular(&self, detections: &[NormalizedDetection]) -> Vec<TabularRow> {
        detections.iter().map(tabular_row).collect()
    }

    /// Sliding windows of `SEQUENCE_WINDOW` consecutive detections, one
    /// series per track with at least that many. Tracks shorter than the
    /// window contribute nothing.
    pub fn sequence(&self, tracks: &[Track]) -> Vec<SequenceWindow> {
        tracks.iter().flat_map(windows_for_track).collect()
    }

    pub fn graph(&self, tracks: &[Track]) -> GraphDataset {
        let track_ids: Vec<u64> = tracks.iter().map(|t| t.track_id).collect();
        let n = tracks.len();
        let mut adjacency = vec![vec![0.0; n]; n];
        let mut edge_index = Vec::new();

        for i in 0..n {
            for j in (i + 1)..n {
                let dist = distance(tracks[i].position(), tracks[j].position());
                let weight = if dist < PROXIMITY_RADIUS_M {
                    1.0 / (dist + 1.0)
                } else {
                    0.0
                };
                if weight > 0.0 {
                    adjacency[i][j] = weight;
                    adjacency[j][i] = weight;
                    edge_index.push((i, j));
                    edge_index.push((j, i));
                }
            }
        }

        GraphDataset {
            track_ids,
            adjacency,
            edge_index,
        }
    }

    pub fn track_features(&self, track: &Track) -> Option<TrackFeatures> {
        if track.detections.len() < 2 {
            return None;
        }

        let positions: Vec<[f64; 3]> = track
            .detections
            .iter()
            .filter_map(|d| d.position_enu)
            .collect();
        if positions.is_empty() {
            return None;
        }

        let mean_position = mean_axis(&positions);
        let std_position = std_axis(&positions, mean_position);

        let speeds: Vec<f64> = track
            .detections
            .iter()
            .filter_map(|d| d.velocity_enu)
            .map(|v| (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt())
            .collect();
        let mean_speed_mps = if speeds.is_empty() {
            0.0
        } else {
            speeds.iter().sum::<f64>() / speeds.len() as f64
        };
        let std_speed_mps = if speeds.is_empty() {
            0.0
        } else {
            let variance = speeds
                .iter()
                .map(|s| (s - mean_speed_mps).powi(2))
                .sum::<f64>()
                / speeds.len() as f64;
            variance.sqrt()
        };

        let duration_seconds =
            (track.last_updated - track.first_seen).num_milliseconds() as f64 / 1000.0;

        Some(TrackFeatures {
            track_id: track.track_id,
            mean_position,
            std_position,
            mean_speed_mps,
            std_speed_mps,
            num_detections: track.cumulative_detections,
            duration_seconds,
        })
    }

    /// Materializes and registers a new dataset from the current detection
    /// stream and track set. `start_time`/`end_time`/`sensor_ids` are derived
    /// from the detections, not from track lifetimes, so detections never
    /// associated into a track still count.
    pub fn create_dataset(
        &mut self,
        name: &str,
        description: &str,
        format: DatasetFormat,
        detections: &[NormalizedDetection],
        tracks: &[Track],
    ) -> Result<DatasetDescriptor, ExtractError> {
        if detections.is_empty() {
            return Err(ExtractError::Empty);
        }

        let sensor_ids: HashSet<String> = detections.iter().map(|d| d.sensor_id.clone()).collect();
        let start_time = detections.iter().map(|d| d.timestamp).min().unwrap();
        let end_time = detections.iter().map(|d| d.timestamp).max().unwrap();

        let dataset_id = format!("dataset_{}", self.next_dataset_id);
        self.next_dataset_id += 1;

        let descriptor = DatasetDescriptor {
            dataset_id: dataset_id.clone(),
            name: name.to_string(),
            description: description.to_string(),
            created_at: Utc::now(),
            sensor_ids,
            start_time,
            end_time,
            num_samples: detections.len(),
            format,
            metadata: HashMap::new(),
        };

        self.datasets.insert(
            dataset_id,
            DatasetEntry {
                descriptor: descriptor.clone(),
                detections: detections.to_vec(),
                tracks: tracks.to_vec(),
            },
        );
        Ok(descriptor)
    }

    pub fn list_datasets(&self) -> Vec<DatasetDescriptor> {
        let mut out: Vec<_> = self.datasets.values().map(|e| e.descriptor.clone()).collect();
        out.sort_by_key(|d| d.created_at);
        out
    }

    /// Re-projects a registered dataset. `format` overrides the format it was
    /// created with; an unparseable format string is `InvalidFormat`, an
    /// unknown `dataset_id` is `NotFound`.
    pub fn export_dataset(
        &self,
        dataset_id: &str,
        format: Option<&str>,
    ) -> Result<Value, ExtractError> {
        let entry = self
            .datasets
            .get(dataset_id)
            .ok_or_else(|| ExtractError::NotFound(dataset_id.to_string()))?;

        let format = match format {
            Some(s) => s
                .parse::<DatasetFormat>()
                .map_err(|_| ExtractError::InvalidFormat(s.to_string()))?,
            None => entry.descriptor.format,
        };

        let payload = match format {
            DatasetFormat::Tabular => json!(self.tabular(&entry.detections)),
            DatasetFormat::Sequence => json!(self.sequence(&entry.tracks)),
            DatasetFormat::Graph => json!(self.graph(&entry.tracks)),
        };
        Ok(payload)
    }
}

fn windows_for_track(track: &Track) -> Vec<SequenceWindow> {
    let detections: Vec<&NormalizedDetection> = track.detections.iter().collect();
    if detections.len() < SEQUENCE_WINDOW {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut start = 0;
    while start + SEQUENCE_WINDOW <= detections.len() {
        let rows = detections[start..start + SEQUENCE_WINDOW]
            .iter()
            .map(|d| SequenceRow {
                detection: tabular_row(d),
                track_id: track.track_id,
                track_state: track.track_state,
            })
            .collect();
        out.push(SequenceWindow {
            track_id: track.track_id,
            start_index: start,
            rows,
        });
        start += SEQUENCE_STRIDE;
    }
    out
}

fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

fn mean_axis(positions: &[[f64; 3]]) -> [f64; 3] {
    let n = positions.len().max(1) as f64;
    let mut sum = [0.0; 3];
    for p in positions {
        sum[0] += p[0];
        sum[1] += p[1];
        sum[2] += p[2];
    }
    [sum[0] / n, sum[1] / n, sum[2] / n]
}

fn std_axis(positions: &[[f64; 3]], mean: [f64; 3]) -> [f64; 3] {
    let n = positions.len().max(1) as f64;
    let mut acc = [0.0; 3];
    for p in positions {
        for k in 0..3 {
            let d = p[k] - mean[k];
            acc[k] += d * d;
        }
    }
    [
        (acc[0] / n).sqrt(),
        (acc[1] / n).sqrt(),
        (acc[2] / n).sqrt(),
    ]
}
