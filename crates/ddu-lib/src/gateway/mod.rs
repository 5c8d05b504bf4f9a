//! Monitoring platform API access
//!
//! The analysis only talks to the platform through [`MonitoringApi`]. The
//! HTTP implementation lives in [`GatewayClient`]; tests substitute an
//! in-memory implementation.

mod client;
mod responses;
pub mod selectors;


pub use client::{GatewayClient, HttpGatewayFactory, DEFAULT_REQUEST_TIMEOUT};
pub use responses::{
    CommentRequest, EntitiesPage, ExtensionsPage, MetricQueryResponse, MonitoringConfigurationDto,
    Paged, ProblemsPage,
};

use crate::config::EndpointConfig;
use crate::error::GatewayError;
use crate::models::{MetricSample, Problem, TimeWindow};
use std::collections::HashSet;
use std::sync::Arc;

pub use async_trait::async_trait;

/// Operations the analysis needs from the monitoring platform
#[async_trait]
pub trait MonitoringApi: Send + Sync {
    /// Open problems matching `problem_text` within `window`
    async fn open_problems(
        &self,
        problem_text: &str,
        window: &TimeWindow,
    ) -> Result<Vec<Problem>, GatewayError>;

    /// Run a metric selector over `window`
    async fn query_metric(
        &self,
        metric_selector: &str,
        window: &TimeWindow,
    ) -> Result<Vec<MetricSample>, GatewayError>;

    /// Names of all installed extensions
    async fn extension_names(&self) -> Result<HashSet<String>, GatewayError>;

    /// Raw scope string of a monitoring configuration
    async fn monitoring_scope(
        &self,
        extension_name: &str,
        config_id: &str,
    ) -> Result<String, GatewayError>;

    /// Ids of entities matching an entity selector within `window`
    async fn entity_ids(
        &self,
        entity_selector: &str,
        window: &TimeWindow,
    ) -> Result<Vec<String>, GatewayError>;

    /// Append a comment to a problem
    async fn post_comment(&self, problem_id: &str, message: &str) -> Result<(), GatewayError>;
}

/// Builds an API handle for one endpoint
pub trait GatewayFactory: Send + Sync {
    fn connect(&self, endpoint: &EndpointConfig) -> Result<Arc<dyn MonitoringApi>, GatewayError>;
}
