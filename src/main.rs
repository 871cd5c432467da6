use anyhow::Result;
use credhub_core::{config::Config, server, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    // Initialize tracing and metrics
    let prometheus_handle = telemetry::init(&config.telemetry)?;

    info!("Starting CredHub Core Service");
    info!("HTTP server listening on {}", config.http_addr());
    info!("Search index at {}", config.elasticsearch.url);

    // Run the server
    server::run(config, prometheus_handle).await
}
