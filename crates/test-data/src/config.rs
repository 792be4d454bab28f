//! Configuration types for test data generation.

use serde::{Deserialize, Serialize};

/// Shape of a generated activity stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Length of the recording in seconds.
    pub duration_secs: f64,
    /// Seconds between samples while moving.
    pub sample_interval_secs: f64,
    /// Probability (0.0 - 1.0) that a sample is followed by a pause.
    pub pause_probability: f64,
    /// Duration range for pauses (min, max) in seconds.
    pub pause_duration_range: (f64, f64),
    /// Probability (0.0 - 1.0) that the heart rate strap drops a sample.
    pub heartrate_dropout: f64,
    /// Standard deviation of altitude noise in meters.
    pub elevation_jitter_m: f64,
    /// Start position (lat, lon) of the route.
    pub start_point: (f64, f64),
    pub include_altitude: bool,
    pub include_heartrate: bool,
    pub include_latlng: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            duration_secs: 3600.0,
            sample_interval_secs: 1.0,
            pause_probability: 0.002,
            pause_duration_range: (10.0, 90.0),
            heartrate_dropout: 0.01,
            elevation_jitter_m: 0.5,
            start_point: (40.0150, -105.2705), // Boulder, CO
            include_altitude: true,
            include_heartrate: true,
            include_latlng: true,
        }
    }
}

impl StreamConfig {
    /// A short stream for unit and integration tests.
    pub fn short() -> Self {
        Self {
            duration_secs: 900.0,
            ..Default::default()
        }
    }

    pub fn without_heartrate(mut self) -> Self {
        self.include_heartrate = false;
        self
    }

    pub fn without_altitude(mut self) -> Self {
        self.include_altitude = false;
        self
    }
}

/// Configuration for the `seed` binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Number of activities to write.
    pub activity_count: usize,
    /// Id of the first activity; later ones count up from here.
    pub first_activity_id: i64,
    /// RNG seed for reproducible output.
    pub seed: u64,
    pub stream: StreamConfig,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            activity_count: 10,
            first_activity_id: 1000,
            seed: 12345,
            stream: StreamConfig::default(),
        }
    }
}
