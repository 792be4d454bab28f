//! Writes a batch of synthetic activity streams for one user.
//!
//! Run with:
//! ```
//! cargo run -p test-data --bin seed -- --data_dir data --count 10
//! ```

use std::path::PathBuf;

use clap::Parser;
use rand::{Rng, SeedableRng, rngs::StdRng};
use test_data::prelude::*;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "seed", about = "Generate synthetic activity streams")]
struct Args {
    /// Root data directory; streams land under <data_dir>/streams/<user_id>/.
    #[arg(long = "data_dir", default_value = "data")]
    data_dir: PathBuf,

    /// Owner of the generated activities. A random id is used when omitted.
    #[arg(long = "user_id")]
    user_id: Option<Uuid>,

    #[arg(long, default_value_t = SeedConfig::default().activity_count)]
    count: usize,

    #[arg(long = "first_id", default_value_t = SeedConfig::default().first_activity_id)]
    first_id: i64,

    /// RNG seed for reproducible data.
    #[arg(long, default_value_t = SeedConfig::default().seed)]
    seed: u64,

    /// Recording length of each activity in seconds.
    #[arg(long, default_value_t = StreamConfig::default().duration_secs)]
    duration: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = SeedConfig {
        activity_count: args.count,
        first_activity_id: args.first_id,
        seed: args.seed,
        stream: StreamConfig {
            duration_secs: args.duration,
            ..StreamConfig::default()
        },
    };
    let user_id = args.user_id.unwrap_or_else(Uuid::new_v4);

    let mut rng = StdRng::seed_from_u64(config.seed);

    for offset in 0..config.activity_count {
        let activity_id = config.first_activity_id + offset as i64;
        let terrain_seed: u32 = rng.gen_range(0..u32::MAX);

        // Alternate runners and hikers so both heart rate shapes show up.
        let generator = if offset % 2 == 0 {
            StreamGenerator::new(terrain_seed).with_profile(RunnerProfile::default())
        } else {
            StreamGenerator::new(terrain_seed)
                .with_terrain(ElevationGenerator::mountain(terrain_seed))
                .with_profile(HikerProfile::default())
        }
        .with_config(config.stream.clone());

        let stream = generator.generate(&mut rng);
        let path = stream.write_to(&args.data_dir, user_id, activity_id)?;
        tracing::info!(
            activity_id,
            samples = stream.len(),
            distance_m = stream.total_distance().round(),
            path = %path.display(),
            "wrote stream"
        );
    }

    tracing::info!("Seed completed!");
    tracing::info!("  User: {user_id}");
    tracing::info!("  Activities: {}", config.activity_count);

    Ok(())
}
