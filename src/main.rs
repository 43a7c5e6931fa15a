//! Stellar Swap Adapter - unsigned payment builder for cross-chain swaps
//!
//! Serves the build pipeline over HTTP so the router's signer can fetch
//! unsigned Stellar payments for detected swaps.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use stellar_swap_adapter::api::{self, AppState};
use stellar_swap_adapter::chain::HorizonProvider;
use stellar_swap_adapter::config::Settings;
use stellar_swap_adapter::metrics::MetricsServer;
use stellar_swap_adapter::BuildPipeline;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("Starting Stellar Swap Adapter v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;
    info!(
        "Loaded configuration for chain {} ({} signers, {} assets)",
        settings.adapter.chain_id,
        settings.signers.len(),
        settings.assets.len()
    );

    // Horizon client shared by the pipeline and readiness checks
    let horizon = Arc::new(
        HorizonProvider::new(&settings.horizon).context("Failed to create Horizon client")?,
    );
    if !horizon.health_check().await {
        warn!("Horizon at {} is not reachable yet", horizon.base_url());
    }

    let pipeline = Arc::new(BuildPipeline::from_settings(&settings, horizon.clone())?);
    info!("Build pipeline initialized");

    // Initialize metrics server
    let metrics_server = if settings.metrics.enabled {
        Some(MetricsServer::new(settings.metrics.port))
    } else {
        None
    };

    // Start API server
    let api_handle = tokio::spawn({
        let config = settings.api.clone();
        let state = AppState::new(&settings.api, pipeline.clone(), horizon.clone());
        async move {
            if let Err(e) = api::run_server(config, state).await {
                error!("API server error: {}", e);
            }
        }
    });

    // Start metrics server
    let metrics_handle = metrics_server.map(|server| {
        tokio::spawn(async move {
            if let Err(e) = server.run().await {
                error!("Metrics server error: {}", e);
            }
        })
    });

    info!("Stellar Swap Adapter is running");
    info!("API server: http://{}:{}", settings.api.host, settings.api.port);
    if settings.metrics.enabled {
        info!("Metrics: http://0.0.0.0:{}/metrics", settings.metrics.port);
    }

    // Wait for shutdown signal
    shutdown_signal().await;

    info!("Shutdown signal received, stopping...");

    api_handle.abort();
    if let Some(h) = metrics_handle {
        h.abort();
    }

    info!("Stellar Swap Adapter stopped");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stellar_swap_adapter=debug,hyper=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
