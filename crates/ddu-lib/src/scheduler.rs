//! Periodic analysis loop
//!
//! Runs one analysis cycle per tick. Endpoints are processed one after the
//! other with their own client; a failing endpoint is logged and the cycle
//! moves on to the next one.

use crate::config::EndpointConfig;
use crate::correlator::{EndpointSummary, ProblemCorrelator};
use crate::error::ConfigError;
use crate::gateway::GatewayFactory;
use crate::health::{components, HealthRegistry};
use crate::observability::{AgentMetrics, StructuredLogger};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Configuration for the analysis loop
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Cycle cadence (default: 60 seconds)
    pub interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

/// Totals over all endpoints of one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    pub endpoints_succeeded: usize,
    pub endpoints_failed: usize,
    pub problems_analyzed: usize,
    pub problems_skipped: usize,
    pub comments_posted: usize,
    pub billable_extensions: usize,
}

impl CycleSummary {
    fn absorb(&mut self, endpoint: &EndpointSummary) {
        self.endpoints_succeeded += 1;
        self.problems_analyzed += endpoint.problems_analyzed;
        self.problems_skipped += endpoint.problems_skipped;
        self.comments_posted += endpoint.comments_posted;
        self.billable_extensions += endpoint.billable_extensions;
    }
}

/// Analysis loop over all configured endpoints
pub struct AnalysisLoop {
    factory: Arc<dyn GatewayFactory>,
    endpoints: Vec<std::result::Result<EndpointConfig, ConfigError>>,
    config: SchedulerConfig,
    health: HealthRegistry,
    metrics: AgentMetrics,
    logger: StructuredLogger,
}

impl AnalysisLoop {
    pub fn new(
        factory: Arc<dyn GatewayFactory>,
        endpoints: Vec<std::result::Result<EndpointConfig, ConfigError>>,
        config: SchedulerConfig,
        health: HealthRegistry,
        logger: StructuredLogger,
    ) -> Self {
        let metrics = AgentMetrics::new();
        metrics.set_configured_endpoints(endpoints.len() as i64);

        Self {
            factory,
            endpoints,
            config,
            health,
            metrics,
            logger,
        }
    }

    /// Run until the shutdown signal fires
    ///
    /// A cycle in progress always finishes before shutdown is observed.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            endpoints = self.endpoints.len(),
            "Starting analysis loop"
        );

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let summary = self.run_cycle(Utc::now()).await;
                    debug!(?summary, "Cycle summary");
                }
                _ = shutdown.recv() => {
                    info!("Shutting down analysis loop");
                    break;
                }
            }
        }
    }

    /// One pass over every endpoint
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> CycleSummary {
        let start = Instant::now();
        self.logger.log_cycle_started(self.endpoints.len());

        let mut summary = CycleSummary::default();

        for entry in &self.endpoints {
            let endpoint = match entry {
                Ok(endpoint) => endpoint,
                Err(err) => {
                    self.logger.log_endpoint_invalid(err);
                    self.metrics.inc_endpoint_failures();
                    summary.endpoints_failed += 1;
                    continue;
                }
            };

            match self.run_endpoint(endpoint, now).await {
                Ok(result) => {
                    summary.absorb(&result);
                    self.metrics.add_problems_analyzed(result.problems_analyzed as u64);
                    self.metrics.add_problems_skipped(result.problems_skipped as u64);
                    self.metrics.add_comments_posted(result.comments_posted as u64);
                    self.metrics
                        .add_billable_extensions(result.billable_extensions as u64);
                }
                Err(err) => {
                    self.logger
                        .log_endpoint_failed(endpoint.index, &endpoint.environment_url, &err);
                    self.metrics.inc_endpoint_failures();
                    summary.endpoints_failed += 1;
                }
            }
        }

        let elapsed = start.elapsed();
        self.metrics.observe_cycle_duration(elapsed.as_secs_f64());
        self.health
            .record_cycle(summary.endpoints_succeeded, summary.endpoints_failed)
            .await;
        self.health.set_healthy(components::SCHEDULER).await;
        self.logger.log_cycle_finished(
            summary.endpoints_succeeded,
            summary.endpoints_failed,
            elapsed.as_millis(),
        );

        summary
    }

    async fn run_endpoint(&self, endpoint: &EndpointConfig, now: DateTime<Utc>) -> Result<EndpointSummary> {
        let api = self
            .factory
            .connect(endpoint)
            .with_context(|| format!("Failed to create client for {}", endpoint.environment_url))?;

        let correlator = ProblemCorrelator::new(api, endpoint.clone(), self.logger.clone());
        let summary = correlator
            .run(now)
            .await
            .with_context(|| format!("Analysis of {} aborted", endpoint.environment_url))?;

        Ok(summary)
    }
}

/// Builder for creating the analysis loop
pub struct AnalysisLoopBuilder {
    factory: Option<Arc<dyn GatewayFactory>>,
    endpoints: Vec<std::result::Result<EndpointConfig, ConfigError>>,
    config: SchedulerConfig,
    health: Option<HealthRegistry>,
    logger: Option<StructuredLogger>,
}

impl AnalysisLoopBuilder {
    pub fn new() -> Self {
        Self {
            factory: None,
            endpoints: Vec::new(),
            config: SchedulerConfig::default(),
            health: None,
            logger: None,
        }
    }

    /// Set how clients are created per endpoint
    pub fn factory(mut self, factory: Arc<dyn GatewayFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Set the endpoint entries, valid or not
    pub fn endpoints(mut self, endpoints: Vec<std::result::Result<EndpointConfig, ConfigError>>) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Set the cycle cadence
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> Result<AnalysisLoop> {
        let factory = self
            .factory
            .ok_or_else(|| anyhow::anyhow!("Gateway factory is required"))?;

        Ok(AnalysisLoop::new(
            factory,
            self.endpoints,
            self.config,
            self.health.unwrap_or_default(),
            self.logger
                .unwrap_or_else(|| StructuredLogger::new("ddu-agent")),
        ))
    }
}

impl Default for AnalysisLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}
