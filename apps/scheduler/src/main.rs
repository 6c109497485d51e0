use anyhow::Context;
use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scheduling_cell::{AssignmentEngine, SchedulingRunner};
use shared_api_client::SchedulingApiClient;
use shared_config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting appointment scheduler");

    // Load configuration
    let config = AppConfig::from_env();
    let engine = AssignmentEngine::new(&config.calendar)
        .context("calendar configuration is invalid")?;
    let client = SchedulingApiClient::new(&config);
    info!("Scheduling against {}", client.get_base_url());

    let mut runner = SchedulingRunner::new(engine, client);
    match runner.run().await {
        Ok(report) => {
            info!(
                "Run finished: {} seeded, {} assigned, {} dropped, {} skipped",
                report.seeded, report.assigned, report.dropped, report.skipped
            );
            Ok(())
        }
        Err(e) => {
            error!("Scheduling run aborted: {}", e);
            Err(e).context("scheduling run aborted, rerun to start a fresh run")
        }
    }
}
