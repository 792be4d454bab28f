//! Synthetic activity streams for stream-metrics.
//!
//! Generates realistic recordings (time, distance, altitude, position and
//! heart rate) over procedural terrain and writes them in the on-disk layout
//! the stream loader reads, for integration tests and manual verification.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_data::prelude::*;
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let stream = StreamGenerator::new(42)
//!     .with_profile(HikerProfile::default())
//!     .with_config(StreamConfig::short())
//!     .generate(&mut rng);
//! stream.write_to(Path::new("data"), user_id, 1001)?;
//! ```

pub mod config;
pub mod generators;
pub mod profiles;
pub mod terrain;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::{SeedConfig, StreamConfig};
    pub use crate::generators::{GenerateError, GeneratedStream, StreamGenerator};
    pub use crate::profiles::{
        AthleteProfile, HikerProfile, RunnerProfile, sample_variance, speed_at_grade,
        target_heartrate,
    };
    pub use crate::terrain::ElevationGenerator;
}
