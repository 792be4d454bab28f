//! Heart rate training zones based on percentage of maximum heart rate.
//!
//! Zones follow the Training for the New Alpinism model: each zone is defined
//! by its lower bound as a fraction of the athlete's maximum heart rate.

use crate::{
    errors::{MetricsError, Result},
    models::{HealthMetrics, ZONE_COUNT},
};

/// Lower bound of each zone as a fraction of maximum heart rate.
pub const ZONE_PCT: [f64; ZONE_COUNT] = [0.0, 0.55, 0.75, 0.80, 0.90, 0.95];

pub const MIN_MAX_HEARTRATE: f64 = 1.0;
pub const MAX_MAX_HEARTRATE: f64 = 300.0;

/// Absolute zone thresholds for one athlete.
#[derive(Debug, Clone, PartialEq)]
pub struct HeartrateZones {
    max_heartrate: f64,
    thresholds: [f64; ZONE_COUNT],
}

impl HeartrateZones {
    /// Builds the zone model from a health profile.
    ///
    /// Fails if `max_heartrate` is missing, not a number, or outside
    /// `[1, 300]`.
    pub fn from_health_metrics(health_metrics: &HealthMetrics) -> Result<Self> {
        let value = health_metrics.max_heartrate().ok_or_else(|| {
            MetricsError::validation("health_metrics must include 'max_heartrate'")
        })?;
        let max_heartrate = value.as_f64().ok_or_else(|| {
            MetricsError::validation(format!("max_heartrate must be a number, got {value}"))
        })?;
        Self::new(max_heartrate)
    }

    pub fn new(max_heartrate: f64) -> Result<Self> {
        if !(MIN_MAX_HEARTRATE..=MAX_MAX_HEARTRATE).contains(&max_heartrate) {
            return Err(MetricsError::validation(format!(
                "max_heartrate must be between {MIN_MAX_HEARTRATE} and {MAX_MAX_HEARTRATE}, got {max_heartrate}"
            )));
        }

        Ok(Self {
            max_heartrate,
            thresholds: Self::compute_thresholds(max_heartrate),
        })
    }

    fn compute_thresholds(max_heartrate: f64) -> [f64; ZONE_COUNT] {
        ZONE_PCT.map(|pct| pct * max_heartrate)
    }

    pub fn max_heartrate(&self) -> f64 {
        self.max_heartrate
    }

    /// Lower bound heart rate of each zone, non-decreasing.
    pub fn thresholds(&self) -> &[f64; ZONE_COUNT] {
        &self.thresholds
    }

    /// Zone of a single heart rate. A value equal to a threshold belongs to
    /// that threshold's zone.
    ///
    /// Thresholds are compared exactly as computed in `f64`, so a reading
    /// that matches a threshold only in decimal notation may fall one zone
    /// lower: with a 190 bpm maximum, `0.55 * 190` is `104.50000000000001`
    /// and a reading of `104.5` is zone 0.
    pub fn zone(&self, heartrate: f64) -> u8 {
        let reached = self
            .thresholds
            .iter()
            .filter(|&&threshold| threshold <= heartrate)
            .count();
        reached.saturating_sub(1).min(ZONE_COUNT - 1) as u8
    }

    /// Zones of a sequence of heart rates, in input order.
    pub fn zones(&self, heartrates: &[f64]) -> Vec<u8> {
        heartrates.iter().map(|&hr| self.zone(hr)).collect()
    }
}
