/*
 * Spyglass - DEX Analytics Service
 * Main entry point for the application
 */

use spyglass::{api, config::Config, service::AnalyticsService};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Spyglass DEX Analytics Service");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        "Configuration loaded for {:?} (chain id {})",
        config.subgraph.network,
        config.subgraph.network.chain_id()
    );

    let service = Arc::new(AnalyticsService::new(&config)?);

    let api_state = api::ApiState {
        config: config.clone(),
        service,
    };

    info!(
        "Starting API server on {}:{}",
        config.server.host, config.server.port
    );

    let rocket = api::create_rocket(api_state);
    rocket.launch().await?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spyglass=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
