//! Cross-module scenarios spanning normalizer → tracker → extractor.

use chrono::{Duration, Utc};
use radix_core::{Extractor, Normalizer, Tracker};
use radix_types::{DatasetFormat, FormatTag, RawDetection, RawFields};

fn fmcw_at(sensor: &str, range_m: f64, azimuth_deg: f64, t: chrono::DateTime<Utc>) -> RawDetection {
    RawDetection {
        timestamp: t,
        sensor_id: sensor.to_string(),
        format_tag: FormatTag::Fmcw,
        fields: RawFields::Fmcw {
            range_m,
            azimuth_deg,
            elevation_deg: 5.0,
            doppler_mps: -10.0,
            snr_db: 22.0,
            target_id: None,
            rcs_dbsm: Some(8.0),
            is_false_alarm: false,
            beat_frequency_khz: Some(120.0),
            range_resolution_m: Some(0.1),
        },
    }
}

#[test]
fn pipeline_confirms_a_track_after_three_consistent_ticks() {
    let normalizer = Normalizer::new();
    let mut tracker = Tracker::default();
    let t = Utc::now();

    for i in 0..3 {
        let raw = fmcw_at("RADAR_A", 1000.0, 45.0, t + Duration::seconds(i));
        let normalized = normalizer.batch_normalize(&[raw]);
        let tracks = tracker.update(&normalized);
        if i < 2 {
            assert_eq!(tracks[0].track_state, radix_types::TrackState::Tentative);
        } else {
            assert_eq!(tracks[0].track_state, radix_types::TrackState::Confirmed);
        }
    }
}

#[test]
fn pipeline_coasts_and_then_loses_a_confirmed_track() {
    let normalizer = Normalizer::new();
    let mut tracker = Tracker::default();
    let t0 = Utc::now();

    for i in 0..3 {
        let raw = fmcw_at("RADAR_A", 1000.0, 45.0, t0 + Duration::seconds(i));
        let normalized = normalizer.batch_normalize(&[raw]);
        tracker.update(&normalized);
    }

    // +0.5s: within the 5s default coast window.
    let tracks = tracker.update_at(&[], t0 + Duration::milliseconds(2500));
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].track_state, radix_types::TrackState::Coasting);

    // +6s past the last update: past the coast window, evicted.
    let tracks = tracker.update_at(&[], t0 + Duration::seconds(8));
    assert!(tracks.is_empty());
}

#[test]
fn extractor_builds_a_symmetric_proximity_graph_over_live_tracks() {
    let normalizer = Normalizer::new();
    let mut tracker = Tracker::default();
    let t = Utc::now();

    let raws = vec![
        fmcw_at("RADAR_A", 500.0, 10.0, t),
        fmcw_at("RADAR_A", 520.0, 12.0, t),
        fmcw_at("RADAR_A", 4000.0, 200.0, t),
    ];
    let normalized = normalizer.batch_normalize(&raws);
    let tracks = tracker.update(&normalized);
    assert_eq!(tracks.len(), 3);

    let extractor = Extractor::new();
    let graph = extractor.graph(&tracks);
    assert_eq!(graph.track_ids.len(), 3);
    for i in 0..3 {
        assert_eq!(graph.adjacency[i][i], 0.0);
        for j in 0..3 {
            assert_eq!(graph.adjacency[i][j], graph.adjacency[j][i]);
        }
    }
}

#[test]
fn extractor_produces_sliding_sequence_windows_over_track_history() {
    let normalizer = Normalizer::new();
    let mut tracker = Tracker::default();
    let t = Utc::now();

    for i in 0..15 {
        let raw = fmcw_at("RADAR_A", 1000.0, 45.0, t + Duration::seconds(i));
        let normalized = normalizer.batch_normalize(&[raw]);
        tracker.update(&normalized);
    }

    let tracks = tracker.active_tracks();
    let extractor = Extractor::new();
    let windows = extractor.sequence(&tracks);
    assert!(!windows.is_empty());
    assert_eq!(windows[0].track_id, tracks[0].track_id);
    // window=10, stride=1, 15 detections => 6 windows
    assert_eq!(windows.len(), 6);
}

#[test]
fn create_and_export_dataset_round_trips_through_the_registry() {
    let normalizer = Normalizer::new();
    let mut tracker = Tracker::default();
    let t = Utc::now();
    let mut all_detections = Vec::new();
    for i in 0..3 {
        let raw = fmcw_at("RADAR_A", 1000.0, 45.0, t + Duration::seconds(i));
        let normalized = normalizer.batch_normalize(&[raw]);
        all_detections.extend(normalized.iter().cloned());
        tracker.update(&normalized);
    }
    let tracks = tracker.active_tracks();

    let mut extractor = Extractor::new();
    let descriptor = extractor
        .create_dataset(
            "confirmed-tracks",
            "test",
            DatasetFormat::Tabular,
            &all_detections,
            &tracks,
        )
        .expect("dataset creation should succeed with a nonempty detection set");
    assert_eq!(descriptor.num_samples, all_detections.len());

    let exported = extractor
        .export_dataset(&descriptor.dataset_id, None)
        .expect("just-created dataset should be exportable");
    assert!(exported.is_array());
    assert_eq!(exported.as_array().unwrap().len(), descriptor.num_samples);

    let reprojected = extractor
        .export_dataset(&descriptor.dataset_id, Some("graph"))
        .expect("should be able to re-project to a different format at export time");
    assert!(reprojected.get("adjacency").is_some());
}
