//! Metric derivation for a single activity stream.
//!
//! Each stage only runs when the stream carries the columns it needs; a
//! stage that cannot run leaves its metrics out of the result instead of
//! failing the whole analysis.

use rayon::prelude::*;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    config::MetricsConfig,
    errors::Result,
    heartrate_zones::HeartrateZones,
    models::{ALTITUDE, HEARTRATE, HealthMetrics, MetricsResult, Segment, StreamTable, TimeColumn},
    scoring::{StreamMetric, ZoneTimeMetric, time_weighted_average},
    segmentation::SegmentLabeler,
    stream_loader::{FileStreamLoader, StreamLoader},
};

pub struct MetricsPipeline<L> {
    loader: L,
    labeler: SegmentLabeler,
}

impl MetricsPipeline<FileStreamLoader> {
    pub fn from_config(config: &MetricsConfig) -> Result<Self> {
        Ok(Self {
            loader: FileStreamLoader::new(&config.data_dir),
            labeler: SegmentLabeler::new(config.prominence)?,
        })
    }
}

impl<L: StreamLoader> MetricsPipeline<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            labeler: SegmentLabeler::default(),
        }
    }

    pub fn with_labeler(mut self, labeler: SegmentLabeler) -> Self {
        self.labeler = labeler;
        self
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Loads the stream for an activity and derives its metrics.
    #[instrument(skip(self, health_metrics))]
    pub fn compute_metrics(
        &self,
        activity_id: i64,
        user_id: Uuid,
        health_metrics: Option<&HealthMetrics>,
    ) -> Result<MetricsResult> {
        let table = self.loader.load(activity_id, user_id)?;
        info!(
            "Loaded {} samples with columns [{}]",
            table.len(),
            table.column_names().collect::<Vec<_>>().join(", ")
        );
        derive_metrics(&table, health_metrics, &self.labeler, OffsetDateTime::now_utc())
    }
}

impl<L: StreamLoader + Sync> MetricsPipeline<L> {
    /// Analyses several activities of one user in parallel. Results keep the
    /// order of `activity_ids`.
    pub fn compute_many(
        &self,
        activity_ids: &[i64],
        user_id: Uuid,
        health_metrics: Option<&HealthMetrics>,
    ) -> Vec<(i64, Result<MetricsResult>)> {
        activity_ids
            .par_iter()
            .map(|&id| (id, self.compute_metrics(id, user_id, health_metrics)))
            .collect()
    }
}

/// Seconds between each sample and the one before it; zero for the first.
pub fn derive_dt(time: &TimeColumn) -> Vec<f64> {
    let elapsed = time.elapsed_seconds();
    if elapsed.is_empty() {
        return Vec::new();
    }
    std::iter::once(0.0)
        .chain(elapsed.windows(2).map(|w| w[1] - w[0]))
        .collect()
}

/// Derives all metrics the table supports.
///
/// Fails only when `health_metrics` carries an invalid `max_heartrate`.
pub fn derive_metrics(
    table: &StreamTable,
    health_metrics: Option<&HealthMetrics>,
    labeler: &SegmentLabeler,
    analyzed_at: OffsetDateTime,
) -> Result<MetricsResult> {
    let mut result = MetricsResult::new(analyzed_at.format(&Rfc3339)?);

    // The profile is validated even when the stream has no heart rate.
    let zone_model = health_metrics
        .filter(|h| h.max_heartrate().is_some())
        .map(HeartrateZones::from_health_metrics)
        .transpose()?;

    let dt = table.time().map(derive_dt);

    let segments = if table.has_column(ALTITUDE) {
        match labeler.label_table(table) {
            Ok(segments) => Some(segments),
            Err(e) => {
                warn!("Skipping segmentation: {e}");
                None
            }
        }
    } else {
        None
    };

    let heartrate = table.column(HEARTRATE);

    // Rows still in play after samples without heart rate are dropped for
    // zone classification.
    let mut rows: Vec<usize> = (0..table.len()).collect();
    let mut zones = None;
    if let (Some(heartrate), Some(model)) = (heartrate, &zone_model) {
        rows.retain(|&i| heartrate[i].is_some());
        zones = Some(
            rows.iter()
                .filter_map(|&i| heartrate[i])
                .map(|hr| model.zone(hr))
                .collect::<Vec<_>>(),
        );
        debug!(
            samples = rows.len(),
            max_heartrate = model.max_heartrate(),
            "classified heart rate zones"
        );
    }

    if let (Some(heartrate), Some(dt), Some(segments)) = (heartrate, &dt, &segments) {
        let trend_average = |trend: Segment| {
            time_weighted_average(
                rows.iter()
                    .filter(|&&i| segments[i] == trend)
                    .map(|&i| (heartrate[i], dt[i])),
            )
        };
        result.uphill_heartrate = trend_average(Segment::Uphill);
        result.downhill_heartrate = trend_average(Segment::Downhill);
    }

    if let (Some(dt), Some(zones)) = (&dt, &zones) {
        let mut zone_times = ZoneTimeMetric::default();
        for (&i, &zone) in rows.iter().zip(zones) {
            zone_times.next_sample((zone, dt[i]));
        }
        result.zone_times = Some(zone_times.finish());
    }

    Ok(result)
}
