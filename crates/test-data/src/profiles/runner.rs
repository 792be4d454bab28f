//! Runner profile.

use super::AthleteProfile;

/// Trail runner: fast on the flat, heart rate close to threshold on climbs.
#[derive(Debug, Clone)]
pub struct RunnerProfile {
    base_speed: f64,
    resting_heartrate: f64,
    max_heartrate: f64,
    variance: f64,
}

impl Default for RunnerProfile {
    fn default() -> Self {
        Self {
            base_speed: 3.2, // ~5:10/km
            resting_heartrate: 52.0,
            max_heartrate: 190.0,
            variance: 0.06,
        }
    }
}

impl RunnerProfile {
    pub fn with_max_heartrate(mut self, max_heartrate: f64) -> Self {
        self.max_heartrate = max_heartrate;
        self
    }

    pub fn with_pace(mut self, pace_min_per_km: f64) -> Self {
        self.base_speed = 1000.0 / (pace_min_per_km * 60.0);
        self
    }
}

impl AthleteProfile for RunnerProfile {
    fn base_speed_mps(&self) -> f64 {
        self.base_speed
    }

    fn grade_factor(&self, grade: f64) -> f64 {
        if grade >= 0.0 {
            (1.0 - grade * 6.0).max(0.25)
        } else {
            (1.0 - grade * 3.0).min(1.4)
        }
    }

    fn resting_heartrate(&self) -> f64 {
        self.resting_heartrate
    }

    fn max_heartrate(&self) -> f64 {
        self.max_heartrate
    }

    fn effort_at_grade(&self, grade: f64) -> f64 {
        // Easy aerobic on the flat, approaching threshold above ~12%.
        if grade >= 0.0 {
            (0.65 + grade * 2.5).min(0.95)
        } else {
            (0.65 + grade * 1.5).max(0.45)
        }
    }

    fn variance(&self) -> f64 {
        self.variance
    }
}
