//! Error types for DDU root-cause analysis
//!
//! Gateway failures, configuration failures and the umbrella error the
//! correlator surfaces at the endpoint boundary.

use thiserror::Error;

/// Result type alias using AnalysisError
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Unified error for one endpoint's analysis pass
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Failures talking to the monitoring platform API
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Connection, TLS or timeout failure
    #[error("Transport failure calling {endpoint}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API token was rejected
    #[error("Credential rejected by {endpoint} (HTTP {status})")]
    Auth { endpoint: String, status: u16 },

    /// Any other non-success status
    #[error("Unexpected HTTP {status} from {endpoint}: {body}")]
    UnexpectedStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Response body did not have the expected shape
    #[error("Malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    /// Request URL could not be built
    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl GatewayError {
    pub fn malformed(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        GatewayError::MalformedResponse {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if the failure was a rejected credential
    pub fn is_auth(&self) -> bool {
        matches!(self, GatewayError::Auth { .. })
    }
}

/// Invalid or missing activation configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Endpoint {endpoint}: missing required field `{field}`")]
    Missing { endpoint: usize, field: &'static str },

    #[error("Endpoint {endpoint}: {reason}")]
    Invalid { endpoint: usize, reason: String },

    #[error("Failed to load activation configuration: {0}")]
    Load(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}
