//! Typed response shapes of the platform API
//!
//! Required fields are non-optional so a shape mismatch fails at the parse
//! boundary instead of surfacing later as a missing key.

use crate::error::GatewayError;
use crate::models::{MetricSample, Problem};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;

/// A response that may continue on another page
pub trait Paged: DeserializeOwned {
    type Item;

    /// Split into items and the key of the next page
    fn into_parts(self, endpoint: &str) -> Result<(Vec<Self::Item>, Option<String>), GatewayError>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemsPage {
    pub problems: Vec<ProblemDto>,
    #[serde(default)]
    pub next_page_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDto {
    pub problem_id: String,
    #[serde(default)]
    pub display_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    pub recent_comments: RecentComments,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentComments {
    pub total_count: u64,
}

impl From<ProblemDto> for Problem {
    fn from(dto: ProblemDto) -> Self {
        Problem {
            problem_id: dto.problem_id,
            display_id: dto.display_id,
            title: dto.title,
            status: dto.status,
            comment_count: dto.recent_comments.total_count,
        }
    }
}

impl Paged for ProblemsPage {
    type Item = Problem;

    fn into_parts(self, _endpoint: &str) -> Result<(Vec<Problem>, Option<String>), GatewayError> {
        let problems = self.problems.into_iter().map(Problem::from).collect();
        Ok((problems, self.next_page_key))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricQueryResponse {
    pub result: Vec<MetricSeriesCollection>,
    #[serde(default)]
    pub next_page_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSeriesCollection {
    #[serde(default)]
    pub metric_id: Option<String>,
    pub data: Vec<MetricSeries>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSeries {
    #[serde(default)]
    pub dimension_map: HashMap<String, Option<String>>,
    #[serde(default)]
    pub timestamps: Vec<i64>,
    pub values: Vec<Option<f64>>,
}

impl MetricSeries {
    fn into_sample(self, endpoint: &str) -> Result<MetricSample, GatewayError> {
        let value = match self.values.first() {
            Some(v) => v.unwrap_or(0.0),
            None => return Err(GatewayError::malformed(endpoint, "metric series has no values")),
        };

        let dimensions = self
            .dimension_map
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k, v)))
            .collect();

        Ok(MetricSample {
            dimensions,
            value,
            timestamp: self.timestamps.first().copied(),
        })
    }
}

impl Paged for MetricQueryResponse {
    type Item = MetricSample;

    fn into_parts(self, endpoint: &str) -> Result<(Vec<MetricSample>, Option<String>), GatewayError> {
        let collection = self
            .result
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::malformed(endpoint, "empty `result` array"))?;

        let samples = collection
            .data
            .into_iter()
            .map(|series| series.into_sample(endpoint))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((samples, self.next_page_key))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionsPage {
    pub extensions: Vec<ExtensionDto>,
    #[serde(default)]
    pub next_page_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionDto {
    pub extension_name: String,
    #[serde(default)]
    pub version: Option<String>,
}

impl Paged for ExtensionsPage {
    type Item = String;

    fn into_parts(self, _endpoint: &str) -> Result<(Vec<String>, Option<String>), GatewayError> {
        let names = self.extensions.into_iter().map(|e| e.extension_name).collect();
        Ok((names, self.next_page_key))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringConfigurationDto {
    #[serde(default)]
    pub object_id: Option<String>,
    pub scope: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitiesPage {
    pub entities: Vec<EntityDto>,
    #[serde(default)]
    pub next_page_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDto {
    pub entity_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Paged for EntitiesPage {
    type Item = String;

    fn into_parts(self, _endpoint: &str) -> Result<(Vec<String>, Option<String>), GatewayError> {
        let ids = self.entities.into_iter().map(|e| e.entity_id).collect();
        Ok((ids, self.next_page_key))
    }
}

/// Body of the problem comment write
#[derive(Debug, Clone, Serialize)]
pub struct CommentRequest<'a> {
    pub message: &'a str,
    pub context: &'a str,
}
