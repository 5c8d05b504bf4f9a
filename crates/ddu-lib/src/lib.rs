//! DDU spike root-cause analysis
//!
//! This crate provides the core functionality for:
//! - Querying ingestion, billing, extension and entity data from the monitoring platform
//! - Folding ingestion and billing series into per-period totals
//! - Attributing data point increases to billed hosts
//! - Commenting open DDU problems with the result
//! - The periodic analysis loop, health checks and observability

pub mod analysis;
pub mod config;
pub mod correlator;
pub mod error;
pub mod gateway;
pub mod health;
pub mod models;
pub mod observability;
pub mod scheduler;

#[cfg(test)]
mod testing;

pub use config::{ActivationConfig, EndpointConfig};
pub use correlator::{EndpointSummary, ProblemCorrelator, ProblemOutcome};
pub use error::{AnalysisError, ConfigError, GatewayError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{AgentMetrics, StructuredLogger};
pub use scheduler::{AnalysisLoop, AnalysisLoopBuilder, CycleSummary, SchedulerConfig};
