//! Observability infrastructure for the DDU agent
//!
//! Provides:
//! - Prometheus metrics (cycle latency, problems handled, comments posted, endpoint failures)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_gauge, Histogram, IntCounter, IntGauge,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Histogram buckets for cycle durations (in seconds)
const CYCLE_BUCKETS: &[f64] = &[0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AgentMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct AgentMetricsInner {
    cycle_duration_seconds: Histogram,
    configured_endpoints: IntGauge,
    problems_analyzed: IntCounter,
    problems_skipped: IntCounter,
    comments_posted: IntCounter,
    billable_extensions: IntCounter,
    endpoint_failures: IntCounter,
}

impl AgentMetricsInner {
    fn new() -> Self {
        Self {
            cycle_duration_seconds: register_histogram!(
                "ddu_agent_cycle_duration_seconds",
                "Time spent on one analysis cycle over all endpoints",
                CYCLE_BUCKETS.to_vec()
            )
            .expect("Failed to register cycle_duration_seconds"),

            configured_endpoints: register_int_gauge!(
                "ddu_agent_configured_endpoints",
                "Number of endpoints in the activation configuration"
            )
            .expect("Failed to register configured_endpoints"),

            problems_analyzed: register_int_counter!(
                "ddu_agent_problems_analyzed_total",
                "Problems analyzed and commented"
            )
            .expect("Failed to register problems_analyzed"),

            problems_skipped: register_int_counter!(
                "ddu_agent_problems_skipped_total",
                "Problems skipped because they already carry a comment"
            )
            .expect("Failed to register problems_skipped"),

            comments_posted: register_int_counter!(
                "ddu_agent_comments_posted_total",
                "Root-cause comments written to problems"
            )
            .expect("Failed to register comments_posted"),

            billable_extensions: register_int_counter!(
                "ddu_agent_billable_extensions_total",
                "Bill-affecting extension entries reported"
            )
            .expect("Failed to register billable_extensions"),

            endpoint_failures: register_int_counter!(
                "ddu_agent_endpoint_failures_total",
                "Endpoint analyses aborted by an error"
            )
            .expect("Failed to register endpoint_failures"),
        }
    }
}

/// Agent metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct AgentMetrics {
    _private: (),
}

impl Default for AgentMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AgentMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AgentMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_cycle_duration(&self, duration_secs: f64) {
        self.inner().cycle_duration_seconds.observe(duration_secs);
    }

    pub fn set_configured_endpoints(&self, count: i64) {
        self.inner().configured_endpoints.set(count);
    }

    pub fn add_problems_analyzed(&self, count: u64) {
        self.inner().problems_analyzed.inc_by(count);
    }

    pub fn add_problems_skipped(&self, count: u64) {
        self.inner().problems_skipped.inc_by(count);
    }

    pub fn add_comments_posted(&self, count: u64) {
        self.inner().comments_posted.inc_by(count);
    }

    pub fn add_billable_extensions(&self, count: u64) {
        self.inner().billable_extensions.inc_by(count);
    }

    pub fn inc_endpoint_failures(&self) {
        self.inner().endpoint_failures.inc();
    }
}

/// Structured logger for agent events
///
/// Provides consistent JSON-formatted logging for cycles, problems
/// and endpoint failures.
#[derive(Clone)]
pub struct StructuredLogger {
    agent_name: String,
}

impl StructuredLogger {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
        }
    }

    /// Log agent startup
    pub fn log_startup(&self, version: &str, endpoints: usize) {
        info!(
            event = "agent_started",
            agent = %self.agent_name,
            agent_version = %version,
            endpoints = endpoints,
            "DDU agent started"
        );
    }

    /// Log agent shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "agent_shutdown",
            agent = %self.agent_name,
            reason = %reason,
            "DDU agent shutting down"
        );
    }

    pub fn log_cycle_started(&self, endpoints: usize) {
        info!(
            event = "cycle_started",
            agent = %self.agent_name,
            endpoints = endpoints,
            "Analysis cycle started"
        );
    }

    pub fn log_cycle_finished(&self, succeeded: usize, failed: usize, elapsed_ms: u128) {
        info!(
            event = "cycle_finished",
            agent = %self.agent_name,
            endpoints_succeeded = succeeded,
            endpoints_failed = failed,
            elapsed_ms = elapsed_ms,
            "Analysis cycle finished"
        );
    }

    pub fn log_endpoint_started(&self, environment_url: &str, problem_text: &str) {
        info!(
            event = "endpoint_started",
            agent = %self.agent_name,
            environment_url = %environment_url,
            problem_text = %problem_text,
            "Analyzing DDU problems for endpoint"
        );
    }

    pub fn log_problems_found(&self, environment_url: &str, count: usize) {
        info!(
            event = "problems_found",
            agent = %self.agent_name,
            environment_url = %environment_url,
            count = count,
            "Detected problems for analysis"
        );
    }

    pub fn log_problem_skipped(&self, problem_id: &str, comment_count: u64) {
        info!(
            event = "problem_skipped",
            agent = %self.agent_name,
            problem_id = %problem_id,
            comment_count = comment_count,
            "Problem has already been analyzed"
        );
    }

    pub fn log_candidates(&self, problem_id: &str, candidates: usize, threshold: f64) {
        info!(
            event = "candidates_found",
            agent = %self.agent_name,
            problem_id = %problem_id,
            candidates = candidates,
            threshold = threshold,
            "Extensions exceeding the data point increase threshold"
        );
    }

    pub fn log_comment_posted(&self, problem_id: &str, billable_extensions: usize) {
        if billable_extensions > 0 {
            info!(
                event = "comment_posted",
                agent = %self.agent_name,
                problem_id = %problem_id,
                billable_extensions = billable_extensions,
                "Detected bill-affecting extensions, comment added"
            );
        } else {
            info!(
                event = "comment_posted",
                agent = %self.agent_name,
                problem_id = %problem_id,
                billable_extensions = 0,
                "No bill-affecting extensions were detected, comment added"
            );
        }
    }

    /// Log an endpoint failure with the full error chain
    pub fn log_endpoint_failed(&self, endpoint: usize, environment_url: &str, err: &anyhow::Error) {
        error!(
            event = "endpoint_failed",
            agent = %self.agent_name,
            endpoint = endpoint,
            environment_url = %environment_url,
            error = ?err,
            "Error while monitoring DDU problems"
        );
    }

    /// Log an endpoint entry that could not be used
    pub fn log_endpoint_invalid(&self, err: &crate::error::ConfigError) {
        warn!(
            event = "endpoint_invalid",
            agent = %self.agent_name,
            error = %err,
            "Skipping invalid endpoint configuration"
        );
    }
}
