//! Athlete profiles.
//!
//! A profile decides how fast the athlete moves on a given grade and how hard
//! their heart works for it. Stream generators use both to produce
//! plausible speed and heart rate series over generated terrain.

mod hiker;
mod runner;

pub use hiker::HikerProfile;
pub use runner::RunnerProfile;

/// Heart rate and pacing behaviour of an athlete.
pub trait AthleteProfile: Send + Sync {
    /// Base speed on flat terrain in meters per second.
    fn base_speed_mps(&self) -> f64;

    /// Speed multiplier for a grade (fraction, e.g. 0.05 = 5% grade).
    fn grade_factor(&self, grade: f64) -> f64;

    /// Resting heart rate in bpm.
    fn resting_heartrate(&self) -> f64;

    /// Maximum heart rate in bpm.
    fn max_heartrate(&self) -> f64;

    /// Fraction of heart rate reserve used at the given grade.
    fn effort_at_grade(&self, grade: f64) -> f64;

    /// Day-to-day performance variance as a coefficient of variation.
    fn variance(&self) -> f64;
}

/// Speed at a grade, never below a slow walk.
pub fn speed_at_grade(profile: &dyn AthleteProfile, grade: f64, variance_factor: f64) -> f64 {
    (profile.base_speed_mps() * profile.grade_factor(grade) * variance_factor).max(0.5)
}

/// Steady-state heart rate the athlete settles at on a grade.
pub fn target_heartrate(profile: &dyn AthleteProfile, grade: f64, variance_factor: f64) -> f64 {
    let reserve = profile.max_heartrate() - profile.resting_heartrate();
    let effort = (profile.effort_at_grade(grade) * variance_factor).clamp(0.0, 1.0);
    profile.resting_heartrate() + reserve * effort
}

/// Samples a multiplier around 1.0 from the profile's variance.
pub fn sample_variance(profile: &dyn AthleteProfile, rng: &mut impl rand::Rng) -> f64 {
    use rand_distr::{Distribution, Normal};

    match Normal::new(1.0, profile.variance()) {
        Ok(normal) if profile.variance() > 0.0 => normal.sample(rng).clamp(0.8, 1.2),
        _ => 1.0,
    }
}
