//! Runtime configuration for metric derivation.

use std::{env, path::PathBuf};

use crate::segmentation::DEFAULT_PROMINENCE;

pub const DATA_DIR_ENV: &str = "STREAMS_DATA_DIR";
pub const PROMINENCE_ENV: &str = "SEGMENT_PROMINENCE";

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Root holding `streams/<user_id>/<activity_id>.json` and
    /// `gpx/<user_id>/<activity_id>.gpx`.
    pub data_dir: PathBuf,
    /// Minimum prominence for a summit or valley to split segments.
    pub prominence: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            prominence: DEFAULT_PROMINENCE,
        }
    }
}

impl MetricsConfig {
    /// Reads overrides from the environment, falling back to defaults for
    /// unset or unparsable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_dir: env::var(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            prominence: env::var(PROMINENCE_ENV)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.prominence),
        }
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_prominence(mut self, prominence: f64) -> Self {
        self.prominence = prominence;
        self
    }
}
