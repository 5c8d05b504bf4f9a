//! DDU Agent - root-cause analysis of DDU consumption spikes
//!
//! Runs once per cycle over every configured environment, explains open
//! DDU alert problems and comments them with the result.

use anyhow::{Context, Result};
use ddu_lib::{
    gateway::HttpGatewayFactory,
    health::{components, HealthRegistry},
    observability::{AgentMetrics, StructuredLogger},
    ActivationConfig, AnalysisLoopBuilder,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting ddu-agent");

    let config = config::AgentConfig::load().context("Invalid AGENT_* settings")?;
    let activation = ActivationConfig::load(&config.activation_config).with_context(|| {
        format!(
            "Failed to load activation config from {}",
            config.activation_config.display()
        )
    })?;
    info!(
        activation_config = %config.activation_config.display(),
        endpoints = activation.endpoint_count(),
        "Agent configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::SCHEDULER).await;
    health_registry.register(components::GATEWAY).await;

    let metrics = AgentMetrics::new();

    let logger = StructuredLogger::new("ddu-agent");
    logger.log_startup(AGENT_VERSION, activation.endpoint_count());

    let analysis_loop = AnalysisLoopBuilder::new()
        .factory(Arc::new(HttpGatewayFactory::new(config.request_timeout())))
        .endpoints(activation.endpoints())
        .interval(config.cycle_interval())
        .health(health_registry.clone())
        .logger(logger.clone())
        .build()?;

    let app_state = Arc::new(api::AppState::new(health_registry.clone(), metrics));

    health_registry.set_ready(true).await;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let loop_handle = tokio::spawn(analysis_loop.run(shutdown_rx));
    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            logger.log_shutdown("SIGINT received");
        }
        result = api_handle => {
            match result {
                Ok(Err(e)) => error!(error = ?e, "API server failed"),
                Err(e) => error!(error = %e, "API server task panicked"),
                Ok(Ok(())) => {}
            }
            logger.log_shutdown("API server stopped");
        }
    }

    // Let an in-flight cycle finish
    let _ = shutdown_tx.send(());
    loop_handle.await?;
    info!("Shutting down");

    Ok(())
}
