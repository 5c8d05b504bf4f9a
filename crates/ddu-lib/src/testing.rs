//! In-memory platform used by unit tests

use crate::error::GatewayError;
use crate::gateway::{async_trait, selectors, MonitoringApi};
use crate::models::{consumption_key, MetricSample, Problem, TimeWindow};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

pub fn problem(id: &str, comment_count: u64) -> Problem {
    Problem {
        problem_id: id.to_string(),
        display_id: Some(format!("P-{}", id)),
        title: Some("DDU consumption spike".to_string()),
        status: Some("OPEN".to_string()),
        comment_count,
    }
}

pub fn ingest(source: &str, config_id: &str, value: f64) -> MetricSample {
    let mut dimensions = HashMap::new();
    dimensions.insert(selectors::SOURCE_DIMENSION.to_string(), source.to_string());
    dimensions.insert(selectors::CONFIG_ID_DIMENSION.to_string(), config_id.to_string());
    MetricSample {
        dimensions,
        value,
        timestamp: None,
    }
}

pub fn billed(entity_id: &str, value: f64) -> MetricSample {
    let mut dimensions = HashMap::new();
    dimensions.insert(
        selectors::MONITORED_ENTITY_DIMENSION.to_string(),
        entity_id.to_string(),
    );
    MetricSample {
        dimensions,
        value,
        timestamp: None,
    }
}

/// Scripted platform state; windows ending at `now` are the current period
pub struct MockApi {
    pub now: DateTime<Utc>,
    pub problems: Vec<Problem>,
    pub extensions: HashSet<String>,
    pub ingest_current: Vec<MetricSample>,
    pub ingest_previous: Vec<MetricSample>,
    pub billed_current: Vec<MetricSample>,
    pub billed_previous: Vec<MetricSample>,
    /// `extension|config` to raw scope
    pub scopes: HashMap<String, String>,
    /// Entity selector to matching ids
    pub entities: HashMap<String, Vec<String>>,
    /// Every call fails with an auth error
    pub reject_token: bool,
    /// Posting a comment to this problem fails
    pub fail_comment_for: Option<String>,
    pub calls: Mutex<Vec<String>>,
    pub comments: Mutex<Vec<(String, String)>>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self {
            now: reference_now(),
            problems: Vec::new(),
            extensions: HashSet::new(),
            ingest_current: Vec::new(),
            ingest_previous: Vec::new(),
            billed_current: Vec::new(),
            billed_previous: Vec::new(),
            scopes: HashMap::new(),
            entities: HashMap::new(),
            reject_token: false,
            fail_comment_for: None,
            calls: Mutex::new(Vec::new()),
            comments: Mutex::new(Vec::new()),
        }
    }
}

impl MockApi {
    pub fn with_extensions(mut self, names: &[&str]) -> Self {
        self.extensions = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_scope(mut self, extension: &str, config_id: &str, scope: &str) -> Self {
        self.scopes
            .insert(consumption_key(extension, config_id), scope.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn comments(&self) -> Vec<(String, String)> {
        self.comments.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().push(call.into());
        if self.reject_token {
            return Err(GatewayError::Auth {
                endpoint: "/api/v2".to_string(),
                status: 401,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MonitoringApi for MockApi {
    async fn open_problems(
        &self,
        _problem_text: &str,
        _window: &TimeWindow,
    ) -> Result<Vec<Problem>, GatewayError> {
        self.record("open_problems")?;
        Ok(self.problems.clone())
    }

    async fn query_metric(
        &self,
        metric_selector: &str,
        window: &TimeWindow,
    ) -> Result<Vec<MetricSample>, GatewayError> {
        self.record(format!("query_metric:{}", metric_selector))?;
        let current = window.to == self.now;
        let samples = match (metric_selector == selectors::INGESTED_DATAPOINTS, current) {
            (true, true) => &self.ingest_current,
            (true, false) => &self.ingest_previous,
            (false, true) => &self.billed_current,
            (false, false) => &self.billed_previous,
        };
        Ok(samples.clone())
    }

    async fn extension_names(&self) -> Result<HashSet<String>, GatewayError> {
        self.record("extension_names")?;
        Ok(self.extensions.clone())
    }

    async fn monitoring_scope(
        &self,
        extension_name: &str,
        config_id: &str,
    ) -> Result<String, GatewayError> {
        self.record(format!("monitoring_scope:{}", extension_name))?;
        self.scopes
            .get(&consumption_key(extension_name, config_id))
            .cloned()
            .ok_or_else(|| GatewayError::malformed("monitoringConfigurations", "missing `scope`"))
    }

    async fn entity_ids(
        &self,
        entity_selector: &str,
        _window: &TimeWindow,
    ) -> Result<Vec<String>, GatewayError> {
        self.record(format!("entity_ids:{}", entity_selector))?;
        Ok(self.entities.get(entity_selector).cloned().unwrap_or_default())
    }

    async fn post_comment(&self, problem_id: &str, message: &str) -> Result<(), GatewayError> {
        self.record(format!("post_comment:{}", problem_id))?;
        if self.fail_comment_for.as_deref() == Some(problem_id) {
            return Err(GatewayError::UnexpectedStatus {
                endpoint: format!("/api/v2/problems/{}/comments", problem_id),
                status: 500,
                body: "internal error".to_string(),
            });
        }
        self.comments
            .lock()
            .unwrap()
            .push((problem_id.to_string(), message.to_string()));
        Ok(())
    }
}
