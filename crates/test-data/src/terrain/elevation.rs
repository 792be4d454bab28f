//! Perlin noise-based elevation profiles along a route.

use noise::{NoiseFn, Perlin};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Generates altitude as a function of distance travelled.
///
/// Several octaves of Perlin noise are summed so that profiles have long
/// climbs with small undulations on top, which is what prominence filtering
/// has to cope with on real recordings.
#[derive(Debug, Clone)]
pub struct ElevationGenerator {
    perlin: Perlin,
    /// Altitude the profile oscillates around, in meters.
    base_elevation: f64,
    /// Maximum deviation from the base, in meters.
    height_scale: f64,
    /// Noise cycles per meter of the lowest octave.
    frequency: f64,
    octaves: u32,
}

impl ElevationGenerator {
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            base_elevation: 1500.0,
            height_scale: 300.0,
            frequency: 0.0004, // one major climb every few kilometers
            octaves: 4,
        }
    }

    /// Alpine terrain: high base and long, steep climbs.
    pub fn mountain(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            base_elevation: 2200.0,
            height_scale: 700.0,
            frequency: 0.0003,
            octaves: 5,
        }
    }

    /// Rolling hills with little total relief.
    pub fn rolling(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            base_elevation: 300.0,
            height_scale: 40.0,
            frequency: 0.001,
            octaves: 2,
        }
    }

    pub fn with_base_elevation(mut self, elevation: f64) -> Self {
        self.base_elevation = elevation;
        self
    }

    pub fn with_height_scale(mut self, scale: f64) -> Self {
        self.height_scale = scale;
        self
    }

    pub fn base_elevation(&self) -> f64 {
        self.base_elevation
    }

    pub fn height_scale(&self) -> f64 {
        self.height_scale
    }

    /// Altitude after `distance` meters along the route.
    pub fn elevation_at(&self, distance: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.frequency;
        let mut max_amplitude = 0.0;

        for _ in 0..self.octaves {
            total += self.perlin.get([distance * frequency, 0.5]) * amplitude;
            max_amplitude += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }

        self.base_elevation + (total / max_amplitude) * self.height_scale
    }

    /// Average grade between two distances, as a fraction.
    pub fn grade_between(&self, from: f64, to: f64) -> f64 {
        if (to - from).abs() < f64::EPSILON {
            return 0.0;
        }
        (self.elevation_at(to) - self.elevation_at(from)) / (to - from)
    }
}

/// Barometric/GPS altitude noise with the given standard deviation. A
/// non-positive deviation leaves the elevation untouched.
pub fn add_elevation_jitter(elevation: f64, rng: &mut impl Rng, std_dev: f64) -> f64 {
    if std_dev.is_nan() || std_dev <= 0.0 {
        return elevation;
    }
    match Normal::new(0.0, std_dev) {
        Ok(normal) => elevation + normal.sample(rng),
        Err(_) => elevation,
    }
}
