//! Multi-target tracker: nearest-neighbor association over a TENTATIVE →
//! CONFIRMED → COASTING → LOST state machine.

use chrono::{DateTime, Utc};
use radix_types::{NormalizedDetection, Track, TrackState};
use std::collections::VecDeque;

/// Detections within this many meters of a track's last known position
/// associate to it; otherwise a new track is spawned.
pub const DEFAULT_ASSOCIATION_GATE_M: f64 = 100.0;
/// Default time a track may go unassociated before it is marked LOST.
pub const DEFAULT_MAX_COAST_TIME_S: f64 = 5.0;
/// Cumulative detections required before a track is promoted out of TENTATIVE.
const CONFIRMATION_THRESHOLD: u64 = 3;
/// Retained per-track detection history; ring-capped, does not affect
/// `cumulative_detections`.
const HISTORY_CAPACITY: usize = 50;

/// Owns the live track set and assigns monotone track IDs.
#[derive(Debug)]
pub struct Tracker {
    tracks: Vec<Track>,
    next_track_id: u64,
    association_gate_m: f64,
    max_coast_time_s: f64,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new(DEFAULT_ASSOCIATION_GATE_M, DEFAULT_MAX_COAST_TIME_S)
    }
}

impl Tracker {
    pub fn new(association_gate_m: f64, max_coast_time_s: f64) -> Self {
        Self {
            tracks: Vec::new(),
            next_track_id: 1,
            association_gate_m,
            max_coast_time_s,
        }
    }

    /// Associates `detections` to existing tracks (nearest-neighbor, gated),
    /// spawns new tracks for unassociated detections, advances every track's
    /// FSM, and evicts LOST tracks. Returns the live track set after the tick.
    ///
    /// `now`, the tracker's aging reference for this tick, is the first
    /// detection's timestamp, or wall-clock if the batch is empty.
    pub fn update(&mut self, detections: &[NormalizedDetection]) -> Vec<Track> {
        let now = detections
            .first()
            .map(|d| d.timestamp)
            .unwrap_or_else(Utc::now);
        self.update_at(detections, now)
    }

    /// Same as [`Tracker::update`] with an explicit aging reference, for
    /// callers that already know the tick's timestamp (the orchestrator) or
    /// need deterministic timing in tests.
    pub fn update_at(&mut self, detections: &[NormalizedDetection], now: DateTime<Utc>) -> Vec<Track> {
        let mut associated = vec![false; detections.len()];

        for track in &mut self.tracks {
            let mut best: Option<(usize, f64)> = None;
            let last_pos = track.position();

            for (i, det) in detections.iter().enumerate() {
                if associated[i] {
                    continue;
                }
                let Some(pos) = det.position_enu else {
                    continue;
                };
                let dist = distance(last_pos, pos);
                if dist >= self.association_gate_m {
                    continue;
                }
                match best {
                    Some((_, best_dist)) if dist >= best_dist => {}
                    _ => best = Some((i, dist)),
                }
            }

            if let Some((i, _)) = best {
                associated[i] = true;
                apply_detection(track, &detections[i]);
                advance_state(track, true, now, self.max_coast_time_s);
            } else {
                advance_state(track, false, now, self.max_coast_time_s);
            }
        }

        self.tracks.retain(|t| t.track_state != TrackState::Lost);

        for (i, det) in detections.iter().enumerate() {
            if associated[i] {
                continue;
            }
            if det.position_enu.is_none() || det.velocity_enu.is_none() {
                continue;
            }
            self.spawn_track(det);
        }

        self.tracks.clone()
    }

    /// All live tracks, any state. Used by the dataset extraction surface,
    /// which needs the full population rather than just what's externally
    /// reportable.
    pub fn all_tracks(&self) -> Vec<Track> {
        self.tracks.clone()
    }

    /// Tracks in a state fit to report externally (CONFIRMED or COASTING).
    pub fn active_tracks(&self) -> Vec<Track> {
        self.tracks
            .iter()
            .filter(|t| matches!(t.track_state, TrackState::Confirmed | TrackState::Coasting))
            .cloned()
            .collect()
    }

    pub fn track_by_id(&self, track_id: u64) -> Option<&Track> {
        self.tracks.iter().find(|t| t.track_id == track_id)
    }

    fn spawn_track(&mut self, det: &NormalizedDetection) {
        let track_id = self.next_track_id;
        self.next_track_id += 1;

        let mut history = VecDeque::with_capacity(1);
        history.push_back(det.clone());

        let track = Track {
            track_id,
            sensor_id: det.sensor_id.clone(),
            first_seen: det.timestamp,
            last_updated: det.timestamp,
            state_vector: state_vector_from(det),
            track_state: TrackState::Tentative,
            detections: history,
            cumulative_detections: 1,
        };

        self.tracks.push(track);
    }
}

fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

fn state_vector_from(det: &NormalizedDetection) -> [f64; 6] {
    let pos = det.position_enu.unwrap_or([0.0, 0.0, 0.0]);
    let vel = det.velocity_enu.unwrap_or([0.0, 0.0, 0.0]);
    [pos[0], pos[1], pos[2], vel[0], vel[1], vel[2]]
}

fn apply_detection(track: &mut Track, det: &NormalizedDetection) {
    track.last_updated = det.timestamp;
    track.state_vector = state_vector_from(det);
    track.cumulative_detections += 1;

    track.detections.push_back(det.clone());
    while track.detections.len() > HISTORY_CAPACITY {
        track.detections.pop_front();
    }
}

/// Advances a track's FSM for one tick. `associated` is whether a detection
/// was just applied this tick; `now - track.last_updated` (pre-update on a
/// miss) against `max_coast_time_s` decides COASTING vs LOST. TENTATIVE
/// tracks follow the same coast/lost rule as CONFIRMED ones.
fn advance_state(track: &mut Track, associated: bool, now: DateTime<Utc>, max_coast_time_s: f64) {
    if associated {
        track.track_state = match track.track_state {
            TrackState::Tentative if track.cumulative_detections >= CONFIRMATION_THRESHOLD => {
                TrackState::Confirmed
            }
            TrackState::Tentative => TrackState::Tentative,
            TrackState::Confirmed | TrackState::Coasting => TrackState::Confirmed,
            TrackState::Lost => TrackState::Lost,
        };
        return;
    }

    let elapsed_s = (now - track.last_updated).num_milliseconds() as f64 / 1000.0;
    track.track_state = if elapsed_s < max_coast_time_s {
        TrackState::Coasting
    } else {
        TrackState::Lost
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn det_at(sensor: &str, pos: [f64; 3], t: DateTime<Utc>) -> NormalizedDetection {
        NormalizedDetection {
            timestamp: t,
            sensor_id: sensor.to_string(),
            target_id: None,
            range_m: (pos[0] * pos[0] + pos[1] * pos[1] + pos[2] * pos[2]).sqrt(),
            azimuth_deg: 0.0,
            elevation_deg: Some(0.0),
            doppler_mps: 0.0,
            snr_db: 20.0,
            rcs_dbsm: None,
            track_state_hint: None,
            position_enu: Some(pos),
            velocity_enu: Some([0.0, 0.0, 0.0]),
            vendor_metadata: HashMap::new(),
        }
    }

    #[test]
    fn single_detection_seeds_tentative_track() {
        let mut tracker = Tracker::default();
        let t = Utc::now();
        let tracks = tracker.update(&[det_at("A", [100.0, 100.0, 0.0], t)]);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].track_state, TrackState::Tentative);
        assert_eq!(tracks[0].track_id, 1);
    }

    #[test]
    fn confirms_at_three_associations() {
        let mut tracker = Tracker::default();
        let t = Utc::now();
        let pos = [100.0, 100.0, 0.0];
        tracker.update(&[det_at("A", pos, t)]);
        tracker.update(&[det_at("A", pos, t)]);
        let tracks = tracker.update(&[det_at("A", pos, t)]);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].track_state, TrackState::Confirmed);
        assert_eq!(tracks[0].cumulative_detections, 3);
    }

    #[test]
    fn coast_then_lose_matches_the_documented_timestamps() {
        let mut tracker = Tracker::default();
        let t0 = Utc::now();
        let pos = [100.0, 100.0, 0.0];
        for _ in 0..3 {
            tracker.update(&[det_at("A", pos, t0)]);
        }

        // Empty batch 0.5s later: still within the 5s coast window.
        let half_second_later = t0 + chrono::Duration::milliseconds(500);
        let tracks = tracker.update_at(&[], half_second_later);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].track_state, TrackState::Coasting);

        // Empty batch 6s after the last update: past the coast window.
        let six_seconds_later = t0 + chrono::Duration::seconds(6);
        let tracks = tracker.update_at(&[], six_seconds_later);
        assert!(tracks.is_empty());
        assert!(tracker.active_tracks().is_empty());
    }

    #[test]
    fn ring_caps_history_but_not_cumulative_count() {
        let mut tracker = Tracker::default();
        let t = Utc::now();
        let pos = [100.0, 100.0, 0.0];
        for _ in 0..60 {
            tracker.update(&[det_at("A", pos, t)]);
        }
        let tracks = tracker.all_tracks();
        assert_eq!(tracks[0].detections.len(), HISTORY_CAPACITY);
        assert_eq!(tracks[0].cumulative_detections, 60);
    }

    #[test]
    fn far_detection_spawns_a_new_track_and_the_old_one_keeps_coasting() {
        let mut tracker = Tracker::default();
        let t = Utc::now();
        tracker.update(&[det_at("A", [0.0, 100.0, 0.0], t)]);
        let tracks = tracker.update(&[det_at("A", [5000.0, 100.0, 0.0], t)]);
        // Original track missed (within coast window at identical timestamps)
        // and the far detection seeds a second, unrelated track.
        assert_eq!(tracks.len(), 2);
    }

    #[test]
    fn far_detection_does_not_associate_to_a_confirmed_track() {
        let mut tracker = Tracker::default();
        let t = Utc::now();
        let near = [0.0, 100.0, 0.0];
        for _ in 0..3 {
            tracker.update(&[det_at("A", near, t)]);
        }
        let tracks = tracker.update(&[det_at("A", [5000.0, 100.0, 0.0], t)]);
        assert_eq!(tracks.len(), 2);
    }

    #[test]
    fn list_tracks_excludes_tentative() {
        let mut tracker = Tracker::default();
        let t = Utc::now();
        let tracks = tracker.update(&[det_at("A", [100.0, 100.0, 0.0], t)]);
        assert_eq!(tracks.len(), 1);
        assert!(tracker.active_tracks().is_empty());
        assert_eq!(tracker.all_tracks().len(), 1);
    }

    #[test]
    fn association_gate_is_configurable() {
        let mut tight = Tracker::new(10.0, DEFAULT_MAX_COAST_TIME_S);
        let t = Utc::now();
        tight.update(&[det_at("A", [0.0, 0.0, 0.0], t)]);
        let tracks = tight.update(&[det_at("A", [50.0, 0.0, 0.0], t)]);
        // 50m exceeds the 10m gate: treated as a new, unrelated track.
        assert_eq!(tracks.len(), 2);
    }

    #[test]
    fn detection_without_enu_cannot_seed_a_track() {
        let mut tracker = Tracker::default();
        let t = Utc::now();
        let mut det = det_at("A", [0.0, 0.0, 0.0], t);
        det.position_enu = None;
        det.velocity_enu = None;
        let tracks = tracker.update(&[det]);
        assert!(tracks.is_empty());
        assert!(tracker.all_tracks().is_empty());
    }
}
