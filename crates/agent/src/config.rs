//! Agent configuration

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Agent configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Path of the activation document listing the endpoints
    #[serde(default = "default_activation_config")]
    pub activation_config: PathBuf,

    /// API server port for health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Analysis cycle interval in seconds
    #[serde(default = "default_cycle_interval")]
    pub cycle_interval_secs: u64,

    /// Timeout for each platform API request in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_activation_config() -> PathBuf {
    PathBuf::from("/etc/ddu-agent/activation.json")
}

fn default_api_port() -> u16 {
    8080
}

fn default_cycle_interval() -> u64 {
    60
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            activation_config: default_activation_config(),
            api_port: default_api_port(),
            cycle_interval_secs: default_cycle_interval(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from `AGENT_*` environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("AGENT").try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
