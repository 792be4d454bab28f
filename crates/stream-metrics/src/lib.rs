//! Training-load metrics derived from recorded activity streams.
//!
//! The pipeline labels every sample as uphill or downhill from its altitude
//! profile, classifies heart rate into zones relative to the athlete's
//! maximum, and reports duration-weighted heart rate per trend and time spent
//! per zone.

pub mod config;
pub mod errors;
pub mod heartrate_zones;
pub mod models;
pub mod pipeline;
pub mod scoring;
pub mod segmentation;
pub mod stream_loader;

pub use config::MetricsConfig;
pub use errors::MetricsError;
pub use heartrate_zones::HeartrateZones;
pub use models::{HealthMetrics, MetricsResult, Segment, StreamTable, TimeColumn, ZoneTimes};
pub use pipeline::{MetricsPipeline, derive_metrics};
pub use segmentation::SegmentLabeler;
pub use stream_loader::{FileStreamLoader, StreamLoader};
