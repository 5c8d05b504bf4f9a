//! Activation configuration for the analysis loop
//!
//! The document lists the monitored environments. Each entry is validated on
//! its own so one broken entry never stops the others from running.

use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use url::Url;

/// Validated settings for one monitored environment
#[derive(Clone, PartialEq)]
pub struct EndpointConfig {
    /// Position in the activation document, used in logs
    pub index: usize,
    /// Environment base URL without trailing slash
    pub environment_url: String,
    pub api_token: String,
    /// Text used to select DDU alert problems
    pub problem_text: String,
    /// Minimum data point increase for an extension to be considered
    pub datapoint_delta_threshold: f64,
    pub verify_ssl: bool,
    /// Report each extension once instead of once per billable host
    pub dedupe_report: bool,
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("index", &self.index)
            .field("environment_url", &self.environment_url)
            .field("api_token", &"<redacted>")
            .field("problem_text", &self.problem_text)
            .field("datapoint_delta_threshold", &self.datapoint_delta_threshold)
            .field("verify_ssl", &self.verify_ssl)
            .field("dedupe_report", &self.dedupe_report)
            .finish()
    }
}

/// Endpoint entry as written in the document
#[derive(Debug, Default, Deserialize)]
struct RawEndpoint {
    environment_url: Option<String>,
    api_token: Option<String>,
    problem_text: Option<String>,
    datapoint_delta_threshold: Option<f64>,
    verify_ssl: Option<bool>,
    dedupe_report: Option<bool>,
}

fn required(
    value: Option<String>,
    endpoint: usize,
    field: &'static str,
) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing { endpoint, field }),
    }
}

impl RawEndpoint {
    fn validate(self, index: usize) -> Result<EndpointConfig, ConfigError> {
        let environment_url = required(self.environment_url, index, "environment_url")?;
        let api_token = required(self.api_token, index, "api_token")?;
        let problem_text = required(self.problem_text, index, "problem_text")?;
        let threshold = self
            .datapoint_delta_threshold
            .ok_or(ConfigError::Missing {
                endpoint: index,
                field: "datapoint_delta_threshold",
            })?;

        if !threshold.is_finite() {
            return Err(ConfigError::Invalid {
                endpoint: index,
                reason: format!("datapoint_delta_threshold must be finite, got {}", threshold),
            });
        }

        let parsed = Url::parse(environment_url.trim()).map_err(|e| ConfigError::Invalid {
            endpoint: index,
            reason: format!("environment_url `{}` is not a valid URL: {}", environment_url, e),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                endpoint: index,
                reason: format!("environment_url must use http or https, got `{}`", parsed.scheme()),
            });
        }

        Ok(EndpointConfig {
            index,
            environment_url: environment_url.trim().trim_end_matches('/').to_string(),
            api_token: api_token.trim().to_string(),
            problem_text,
            datapoint_delta_threshold: threshold,
            verify_ssl: self.verify_ssl.unwrap_or(true),
            dedupe_report: self.dedupe_report.unwrap_or(false),
        })
    }
}

/// The activation document handed over by the hosting runtime
#[derive(Debug, Clone, Deserialize)]
pub struct ActivationConfig {
    endpoints: Vec<serde_json::Value>,
}

impl ActivationConfig {
    /// Load from a JSON, YAML or TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?;

        let activation: Self = config.try_deserialize()?;
        activation.non_empty()
    }

    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        let activation: Self =
            serde_json::from_str(document).map_err(|e| ConfigError::Load(e.to_string()))?;
        activation.non_empty()
    }

    fn non_empty(self) -> Result<Self, ConfigError> {
        if self.endpoints.is_empty() {
            return Err(ConfigError::Load("no endpoints configured".to_string()));
        }
        Ok(self)
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Validate every entry independently
    pub fn endpoints(&self) -> Vec<Result<EndpointConfig, ConfigError>> {
        self.endpoints
            .iter()
            .enumerate()
            .map(|(index, value)| {
                let raw: RawEndpoint =
                    serde_json::from_value(value.clone()).map_err(|e| ConfigError::Invalid {
                        endpoint: index,
                        reason: e.to_string(),
                    })?;
                raw.validate(index)
            })
            .collect()
    }
}
