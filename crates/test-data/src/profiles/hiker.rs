//! Hiker profile.

use super::AthleteProfile;

/// Mountain hiker: slow and steady, heart rate dominated by grade.
#[derive(Debug, Clone)]
pub struct HikerProfile {
    base_speed: f64,
    resting_heartrate: f64,
    max_heartrate: f64,
    variance: f64,
}

impl Default for HikerProfile {
    fn default() -> Self {
        Self {
            base_speed: 1.4, // ~5 km/h
            resting_heartrate: 60.0,
            max_heartrate: 180.0,
            variance: 0.1,
        }
    }
}

impl HikerProfile {
    /// Loaded pack: slower and working harder at the same grade.
    pub fn backpacker() -> Self {
        Self {
            base_speed: 1.2,
            resting_heartrate: 62.0,
            max_heartrate: 180.0,
            variance: 0.12,
        }
    }

    pub fn with_max_heartrate(mut self, max_heartrate: f64) -> Self {
        self.max_heartrate = max_heartrate;
        self
    }
}

impl AthleteProfile for HikerProfile {
    fn base_speed_mps(&self) -> f64 {
        self.base_speed
    }

    fn grade_factor(&self, grade: f64) -> f64 {
        if grade >= 0.0 {
            (1.0 - grade * 4.0).max(0.3)
        } else {
            (1.0 - grade * 1.5).min(1.2)
        }
    }

    fn resting_heartrate(&self) -> f64 {
        self.resting_heartrate
    }

    fn max_heartrate(&self) -> f64 {
        self.max_heartrate
    }

    fn effort_at_grade(&self, grade: f64) -> f64 {
        if grade >= 0.0 {
            (0.4 + grade * 3.5).min(0.9)
        } else {
            (0.4 + grade).max(0.3)
        }
    }

    fn variance(&self) -> f64 {
        self.variance
    }
}
