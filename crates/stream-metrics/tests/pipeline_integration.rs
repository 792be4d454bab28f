//! End-to-end tests for the metrics pipeline over files on disk.
//!
//! Streams are generated with the `test-data` crate (or written by hand for
//! GPX and malformed inputs) into a temporary data directory laid out the way
//! `FileStreamLoader` expects:
//!
//! - `<data_dir>/streams/<user_id>/<activity_id>.json`
//! - `<data_dir>/gpx/<user_id>/<activity_id>.gpx`

use std::fs;
use std::path::Path;

use rand::{SeedableRng, rngs::StdRng};
use stream_metrics::models::{ALTITUDE, DISTANCE};
use stream_metrics::{
    FileStreamLoader, HealthMetrics, MetricsConfig, MetricsError, MetricsPipeline, Segment,
    SegmentLabeler, StreamLoader, TimeColumn,
};
use tempfile::TempDir;
use test_data::prelude::*;
use uuid::Uuid;

const GPX_HILL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="pipeline-integration" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>Hill repeat</name>
    <trkseg>
      <trkpt lat="40.0000" lon="-105.0000"><ele>100</ele><time>2024-05-01T08:00:00Z</time></trkpt>
      <trkpt lat="40.0001" lon="-105.0000"><ele>100</ele><time>2024-05-01T08:00:10Z</time></trkpt>
      <trkpt lat="40.0002" lon="-105.0000"><ele>150</ele><time>2024-05-01T08:00:20Z</time></trkpt>
      <trkpt lat="40.0003" lon="-105.0000"><ele>100</ele><time>2024-05-01T08:00:30Z</time></trkpt>
      <trkpt lat="40.0004" lon="-105.0000"><ele>100</ele><time>2024-05-01T08:00:40Z</time></trkpt>
    </trkseg>
  </trk>
</gpx>
"#;

fn stream_config() -> StreamConfig {
    StreamConfig {
        heartrate_dropout: 0.0,
        ..StreamConfig::short()
    }
}

/// Generates and writes one activity, returning the stream that was written.
fn write_generated(data_dir: &Path, user_id: Uuid, activity_id: i64, seed: u64) -> GeneratedStream {
    let mut rng = StdRng::seed_from_u64(seed);
    let stream = StreamGenerator::new(seed as u32)
        .with_config(stream_config())
        .generate(&mut rng);
    stream
        .write_to(data_dir, user_id, activity_id)
        .expect("write generated stream");
    stream
}

fn write_gpx(data_dir: &Path, user_id: Uuid, activity_id: i64, contents: &str) {
    let dir = data_dir.join("gpx").join(user_id.to_string());
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{activity_id}.gpx")), contents).unwrap();
}

fn pipeline(dir: &TempDir) -> MetricsPipeline<FileStreamLoader> {
    MetricsPipeline::from_config(&MetricsConfig::default().with_data_dir(dir.path())).unwrap()
}

#[test]
fn test_generated_stream_full_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let user_id = Uuid::new_v4();
    let stream = write_generated(dir.path(), user_id, 1001, 11);

    let health = HealthMetrics::with_max_heartrate(190.0);
    let result = pipeline(&dir)
        .compute_metrics(1001, user_id, Some(&health))
        .unwrap();

    let zone_times = result.zone_times.expect("zone times");
    let recorded = stream.time.last().copied().unwrap_or_default() - stream.time[0];
    assert!(
        (zone_times.total() - recorded).abs() < 1e-6,
        "zone times {} should cover the recording {recorded}",
        zone_times.total()
    );

    let trends = [result.uphill_heartrate, result.downhill_heartrate];
    assert!(trends.iter().any(Option::is_some));
    for hr in trends.into_iter().flatten() {
        assert!((40.0..=200.0).contains(&hr), "implausible trend average {hr}");
    }
}

#[test]
fn test_generated_stream_without_health_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let user_id = Uuid::new_v4();
    write_generated(dir.path(), user_id, 5, 3);

    let result = pipeline(&dir).compute_metrics(5, user_id, None).unwrap();
    assert!(result.zone_times.is_none());
    assert!(result.uphill_heartrate.is_some() || result.downhill_heartrate.is_some());

    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("zone_0_time").is_none());
    assert!(json["analyzed_at"].as_str().is_some_and(|s| s.ends_with('Z')));
}

#[test]
fn test_result_serializes_flat_zone_keys() {
    let dir = tempfile::tempdir().unwrap();
    let user_id = Uuid::new_v4();
    write_generated(dir.path(), user_id, 8, 21);

    let health = HealthMetrics::with_max_heartrate(185.0);
    let result = pipeline(&dir)
        .compute_metrics(8, user_id, Some(&health))
        .unwrap();
    let json = serde_json::to_value(&result).unwrap();

    for zone in 0..6 {
        let key = format!("zone_{zone}_time");
        assert!(json[&key].is_number(), "missing {key}");
    }
    assert!(json.get("zone_times").is_none());
}

#[test]
fn test_stream_without_heartrate_reports_timestamp_only() {
    let dir = tempfile::tempdir().unwrap();
    let user_id = Uuid::new_v4();
    let mut rng = StdRng::seed_from_u64(4);
    StreamGenerator::new(4)
        .with_profile(HikerProfile::default())
        .with_config(stream_config().without_heartrate())
        .generate(&mut rng)
        .write_to(dir.path(), user_id, 12)
        .unwrap();

    let health = HealthMetrics::with_max_heartrate(180.0);
    let result = pipeline(&dir)
        .compute_metrics(12, user_id, Some(&health))
        .unwrap();

    assert!(result.uphill_heartrate.is_none());
    assert!(result.downhill_heartrate.is_none());
    assert!(result.zone_times.is_none());
}

#[test]
fn test_gpx_fallback_loads_track() {
    let dir = tempfile::tempdir().unwrap();
    let user_id = Uuid::new_v4();
    write_gpx(dir.path(), user_id, 42, GPX_HILL);

    let loader = FileStreamLoader::new(dir.path());
    let table = loader.load(42, user_id).unwrap();

    assert_eq!(table.len(), 5);
    assert!(matches!(table.time(), Some(TimeColumn::Absolute(_))));
    let elapsed: Vec<f64> = table.time().map(TimeColumn::elapsed_seconds).unwrap();
    assert_eq!(elapsed, vec![0.0, 10.0, 20.0, 30.0, 40.0]);

    let distance: Vec<f64> = table.column(DISTANCE).unwrap().iter().flatten().copied().collect();
    assert_eq!(distance[0], 0.0);
    assert!(distance.windows(2).all(|w| w[1] > w[0]));
    // 0.0004 degrees of latitude is roughly 44.5 m.
    assert!((distance[4] - 44.5).abs() < 1.0, "distance {}", distance[4]);

    let labels = SegmentLabeler::new(10.0).unwrap().label_table(&table).unwrap();
    assert_eq!(
        labels,
        vec![
            Segment::Uphill,
            Segment::Uphill,
            Segment::Downhill,
            Segment::Downhill,
            Segment::Downhill
        ]
    );
    assert!(table.has_column(ALTITUDE));
}

#[test]
fn test_json_preferred_over_gpx() {
    let dir = tempfile::tempdir().unwrap();
    let user_id = Uuid::new_v4();
    let stream = write_generated(dir.path(), user_id, 42, 2);
    write_gpx(dir.path(), user_id, 42, GPX_HILL);

    let table = FileStreamLoader::new(dir.path()).load(42, user_id).unwrap();
    assert_eq!(table.len(), stream.len());
    assert!(matches!(table.time(), Some(TimeColumn::Elapsed(_))));
}

#[test]
fn test_missing_activity_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let user_id = Uuid::new_v4();

    let err = pipeline(&dir).compute_metrics(99, user_id, None).unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(
        err,
        MetricsError::NotFound { activity_id: 99, user_id: id } if id == user_id
    ));
}

#[test]
fn test_malformed_stream_file() {
    let dir = tempfile::tempdir().unwrap();
    let user_id = Uuid::new_v4();
    let user_dir = dir.path().join("streams").join(user_id.to_string());
    fs::create_dir_all(&user_dir).unwrap();
    fs::write(user_dir.join("3.json"), "{ not json").unwrap();

    let err = pipeline(&dir).compute_metrics(3, user_id, None).unwrap_err();
    assert!(matches!(err, MetricsError::MalformedStream { .. }), "{err:?}");
}

#[test]
fn test_invalid_max_heartrate_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let user_id = Uuid::new_v4();
    write_generated(dir.path(), user_id, 7, 5);

    let health: HealthMetrics = r#"{"max_heartrate": 0}"#.parse().unwrap();
    let err = pipeline(&dir)
        .compute_metrics(7, user_id, Some(&health))
        .unwrap_err();
    assert!(matches!(err, MetricsError::Validation(_)), "{err:?}");
}

#[test]
fn test_activity_ids_lists_streams_and_tracks() {
    let dir = tempfile::tempdir().unwrap();
    let user_id = Uuid::new_v4();
    write_generated(dir.path(), user_id, 30, 1);
    write_generated(dir.path(), user_id, 10, 2);
    write_gpx(dir.path(), user_id, 20, GPX_HILL);
    write_gpx(dir.path(), user_id, 10, GPX_HILL);
    fs::write(
        dir.path()
            .join("streams")
            .join(user_id.to_string())
            .join("notes.txt"),
        "ignored",
    )
    .unwrap();

    let loader = FileStreamLoader::new(dir.path());
    assert_eq!(loader.activity_ids(user_id).unwrap(), vec![10, 20, 30]);
    assert!(loader.activity_ids(Uuid::new_v4()).unwrap().is_empty());
}

#[test]
fn test_compute_many_keeps_order_and_isolates_failures() {
    let dir = tempfile::tempdir().unwrap();
    let user_id = Uuid::new_v4();
    write_generated(dir.path(), user_id, 2, 8);
    write_generated(dir.path(), user_id, 1, 9);
    write_gpx(dir.path(), user_id, 3, GPX_HILL);

    let health = HealthMetrics::with_max_heartrate(190.0);
    let results = pipeline(&dir).compute_many(&[2, 404, 1, 3], user_id, Some(&health));

    let ids: Vec<i64> = results.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![2, 404, 1, 3]);

    assert!(results[0].1.as_ref().is_ok_and(|r| r.zone_times.is_some()));
    assert!(results[1].1.as_ref().is_err_and(MetricsError::is_not_found));
    assert!(results[2].1.as_ref().is_ok_and(|r| r.zone_times.is_some()));
    // GPX tracks carry no heart rate.
    assert!(results[3].1.as_ref().is_ok_and(|r| r.zone_times.is_none()));
}
