// src/main.rs

mod config;
mod geometry;
mod motion;
mod occupancy;
mod orchestrator;
mod publish;
mod regions;
mod snapshot;
mod source;
mod spaces;
mod stream;
mod track_history;
mod types;

use anyhow::Result;
use tracing::{error, info};
use types::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());
    let config = Config::load(&config_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "parking_monitor={}",
                    config.logging.level
                ))
            }),
        )
        .init();

    info!(
        "Loaded config '{}': {} stream(s), publish {}",
        config_path,
        config.streams.len(),
        if config.publish.enabled { "on" } else { "off" }
    );

    let outcomes = orchestrator::run_streams(&config).await;

    info!("==================== RUN SUMMARY ====================");
    for outcome in &outcomes {
        match &outcome.result {
            Ok(stats) => {
                let (occupied, total) = stats
                    .last_occupancy
                    .as_ref()
                    .map(|o| (o.occupied, o.total))
                    .unwrap_or((0, 0));
                info!(
                    "Stream '{}': {} frames, final occupancy {}/{}, peak {}, \
                     {} report(s) published, {} publish failure(s)",
                    outcome.name,
                    stats.frames,
                    occupied,
                    total,
                    stats.peak_occupied,
                    stats.reports_published,
                    stats.publish_failures
                );
            }
            Err(e) => error!("Stream '{}' failed: {:#}", outcome.name, e),
        }
    }

    if orchestrator::any_failed(&outcomes) {
        anyhow::bail!("One or more streams failed");
    }
    Ok(())
}
