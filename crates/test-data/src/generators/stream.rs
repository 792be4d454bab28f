//! Activity stream generation.
//!
//! Walks an athlete along procedurally generated terrain and records
//! time, distance, altitude, position and heart rate the way a watch would.

use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::config::StreamConfig;
use crate::profiles::{
    AthleteProfile, RunnerProfile, sample_variance, speed_at_grade, target_heartrate,
};
use crate::terrain::{ElevationGenerator, add_elevation_jitter};

/// Heart rate response time constant in seconds.
const HEARTRATE_LAG_SECS: f64 = 30.0;
/// Distance ahead used to estimate the current grade.
const GRADE_LOOKAHEAD_M: f64 = 10.0;
const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One recorded activity. Columns are parallel and share `time`'s length.
#[derive(Debug, Clone)]
pub struct GeneratedStream {
    /// Seconds since the start of the recording.
    pub time: Vec<f64>,
    /// Cumulative distance in meters.
    pub distance: Vec<f64>,
    pub altitude: Option<Vec<f64>>,
    /// Heart rate in bpm; `None` where the strap dropped out.
    pub heartrate: Option<Vec<Option<f64>>>,
    pub latlng: Option<Vec<(f64, f64)>>,
}

impl GeneratedStream {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn total_distance(&self) -> f64 {
        self.distance.last().copied().unwrap_or(0.0)
    }

    /// Serializes to the keyed stream layout (`{"time": {"data": [...]}, ...}`).
    pub fn to_json(&self) -> Value {
        let mut streams = serde_json::Map::new();
        streams.insert("time".into(), json!({ "data": self.time }));
        streams.insert("distance".into(), json!({ "data": self.distance }));
        if let Some(altitude) = &self.altitude {
            streams.insert("altitude".into(), json!({ "data": altitude }));
        }
        if let Some(heartrate) = &self.heartrate {
            streams.insert("heartrate".into(), json!({ "data": heartrate }));
        }
        if let Some(latlng) = &self.latlng {
            let pairs: Vec<[f64; 2]> = latlng.iter().map(|&(lat, lon)| [lat, lon]).collect();
            streams.insert("latlng".into(), json!({ "data": pairs }));
        }
        Value::Object(streams)
    }

    /// Writes the stream to `<data_dir>/streams/<user_id>/<activity_id>.json`.
    pub fn write_to(
        &self,
        data_dir: &Path,
        user_id: Uuid,
        activity_id: i64,
    ) -> Result<PathBuf, GenerateError> {
        let dir = data_dir.join("streams").join(user_id.to_string());
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{activity_id}.json"));
        fs::write(&path, serde_json::to_vec(&self.to_json())?)?;
        Ok(path)
    }
}

/// Generates activity streams for one athlete over one piece of terrain.
pub struct StreamGenerator {
    config: StreamConfig,
    terrain: ElevationGenerator,
    profile: Box<dyn AthleteProfile>,
}

impl StreamGenerator {
    /// A runner on rolling terrain.
    pub fn new(terrain_seed: u32) -> Self {
        Self {
            config: StreamConfig::default(),
            terrain: ElevationGenerator::rolling(terrain_seed),
            profile: Box::new(RunnerProfile::default()),
        }
    }

    pub fn with_config(mut self, config: StreamConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_terrain(mut self, terrain: ElevationGenerator) -> Self {
        self.terrain = terrain;
        self
    }

    pub fn with_profile(mut self, profile: impl AthleteProfile + 'static) -> Self {
        self.profile = Box::new(profile);
        self
    }

    pub fn profile(&self) -> &dyn AthleteProfile {
        self.profile.as_ref()
    }

    pub fn generate(&self, rng: &mut impl Rng) -> GeneratedStream {
        let config = &self.config;
        let profile = self.profile.as_ref();
        let interval = config.sample_interval_secs.max(0.1);
        let pause_probability = config.pause_probability.clamp(0.0, 1.0);
        let dropout = config.heartrate_dropout.clamp(0.0, 1.0);
        let (pause_min, pause_max) = config.pause_duration_range;
        let hr_noise = Normal::new(0.0, 1.5).ok();
        let variance = sample_variance(profile, rng);

        let mut time = Vec::new();
        let mut distance = Vec::new();
        let mut altitude = Vec::new();
        let mut heartrate = Vec::new();
        let mut latlng = Vec::new();

        let (start_lat, start_lon) = config.start_point;
        let meters_per_degree_lon = METERS_PER_DEGREE_LAT * start_lat.to_radians().cos().max(0.01);

        let mut t = 0.0;
        let mut d = 0.0;
        let mut hr = target_heartrate(profile, 0.0, variance) * 0.85;

        while t <= config.duration_secs {
            time.push(t);
            distance.push(d);
            altitude.push(add_elevation_jitter(
                self.terrain.elevation_at(d),
                rng,
                config.elevation_jitter_m,
            ));
            // Route heads due east from the start point.
            latlng.push((start_lat, start_lon + d / meters_per_degree_lon));

            let reading = match &hr_noise {
                Some(noise) => hr + noise.sample(rng),
                None => hr,
            };
            heartrate.push((!rng.gen_bool(dropout)).then_some(reading.round()));

            let grade = self.terrain.grade_between(d, d + GRADE_LOOKAHEAD_M);
            let mut step = interval;
            let mut target = target_heartrate(profile, grade, variance);

            if rng.gen_bool(pause_probability) && pause_max >= pause_min {
                step += rng.gen_range(pause_min..=pause_max);
                target = profile.resting_heartrate();
            } else {
                d += speed_at_grade(profile, grade, variance) * interval;
            }

            hr += (target - hr) * (1.0 - (-step / HEARTRATE_LAG_SECS).exp());
            t += step;
        }

        GeneratedStream {
            time,
            distance,
            altitude: config.include_altitude.then_some(altitude),
            heartrate: config.include_heartrate.then_some(heartrate),
            latlng: config.include_latlng.then_some(latlng),
        }
    }
}
