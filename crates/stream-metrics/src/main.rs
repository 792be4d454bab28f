use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use serde_json::{Map, Value};
use stream_metrics::{HealthMetrics, MetricsConfig, MetricsPipeline, stream_loader::FileStreamLoader};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    name = "derive-metrics",
    about = "Derive uphill/downhill heart rate and time in heart rate zones from an activity stream"
)]
#[command(group(ArgGroup::new("target").required(true).args(["activity_id", "all"])))]
struct Cli {
    /// Activity to analyse
    #[arg(long = "activity_id")]
    activity_id: Option<i64>,

    /// Analyse every activity the user has a stream for
    #[arg(long)]
    all: bool,

    /// Owner of the activity
    #[arg(long = "user_id")]
    user_id: Uuid,

    /// Health metrics as a JSON object, e.g. '{"max_heartrate": 190}'
    #[arg(long = "health_metrics")]
    health_metrics: Option<HealthMetrics>,

    /// Data directory holding streams/ and gpx/ (overrides STREAMS_DATA_DIR)
    #[arg(long = "data_dir")]
    data_dir: Option<PathBuf>,

    /// Minimum summit/valley prominence (overrides SEGMENT_PROMINENCE)
    #[arg(long)]
    prominence: Option<f64>,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = MetricsConfig::from_env();
    if let Some(data_dir) = cli.data_dir {
        config = config.with_data_dir(data_dir);
    }
    if let Some(prominence) = cli.prominence {
        config = config.with_prominence(prominence);
    }

    let pipeline = MetricsPipeline::from_config(&config)?;
    let health_metrics = cli.health_metrics.as_ref();

    let output = match cli.activity_id {
        Some(activity_id) => {
            let metrics = pipeline.compute_metrics(activity_id, cli.user_id, health_metrics)?;
            serde_json::to_value(metrics)?
        }
        None => analyze_all(&pipeline, cli.user_id, health_metrics)?,
    };

    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

/// Metrics for every activity of the user keyed by activity id. Activities
/// that fail are listed under `errors` instead of aborting the run.
fn analyze_all(
    pipeline: &MetricsPipeline<FileStreamLoader>,
    user_id: Uuid,
    health_metrics: Option<&HealthMetrics>,
) -> anyhow::Result<Value> {
    let activity_ids = pipeline.loader().activity_ids(user_id)?;
    tracing::info!(
        "Analysing {} activities for user {user_id} in {}",
        activity_ids.len(),
        pipeline.loader().data_dir().display()
    );

    let mut output = Map::new();
    let mut errors = Map::new();
    for (activity_id, result) in pipeline.compute_many(&activity_ids, user_id, health_metrics) {
        match result {
            Ok(metrics) => {
                output.insert(activity_id.to_string(), serde_json::to_value(metrics)?);
            }
            Err(e) => {
                tracing::error!("Activity {activity_id} failed: {e}");
                errors.insert(activity_id.to_string(), Value::String(e.to_string()));
            }
        }
    }
    if !errors.is_empty() {
        output.insert("errors".to_string(), Value::Object(errors));
    }

    Ok(Value::Object(output))
}
