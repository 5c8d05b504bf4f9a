//! Core data models for DDU root-cause analysis

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Prefix the platform puts in front of management-zone scopes
pub const MANAGEMENT_ZONE_PREFIX: &str = "management_zone-";

/// Half-open query range against the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Shift both bounds back by `offset`, keeping the width
    pub fn shifted_back(&self, offset: chrono::Duration) -> Self {
        Self {
            from: self.from - offset,
            to: self.to - offset,
        }
    }

    /// `from` as an RFC 3339 timestamp with millisecond precision
    pub fn from_param(&self) -> String {
        self.from.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// `to` as an RFC 3339 timestamp with millisecond precision
    pub fn to_param(&self) -> String {
        self.to.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// An open alert problem on the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub problem_id: String,
    pub display_id: Option<String>,
    pub title: Option<String>,
    pub status: Option<String>,
    /// Number of comments already attached
    pub comment_count: u64,
}

impl Problem {
    /// A problem with any comment has already been handled
    pub fn is_analyzed(&self) -> bool {
        self.comment_count > 0
    }

    /// Short label for logs and tables
    pub fn label(&self) -> &str {
        self.display_id.as_deref().unwrap_or(&self.problem_id)
    }
}

/// One row of a metric query result
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    /// Dimensions with a non-null value
    pub dimensions: HashMap<String, String>,
    pub value: f64,
    pub timestamp: Option<i64>,
}

impl MetricSample {
    pub fn dimension(&self, key: &str) -> Option<&str> {
        self.dimensions.get(key).map(String::as_str)
    }
}

/// Map key for an extension configuration
pub fn consumption_key(extension_name: &str, config_id: &str) -> String {
    format!("{}|{}", extension_name, config_id)
}

/// Ingested data points of one extension configuration in both periods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionConsumption {
    pub extension_name: String,
    pub config_id: String,
    pub current_datapoints: f64,
    pub previous_datapoints: f64,
    /// Host entities whose billed units increased
    pub affected_entities: Vec<String>,
}

impl ExtensionConsumption {
    pub fn new(
        extension_name: impl Into<String>,
        config_id: impl Into<String>,
        current_datapoints: f64,
        previous_datapoints: f64,
    ) -> Self {
        Self {
            extension_name: extension_name.into(),
            config_id: config_id.into(),
            current_datapoints,
            previous_datapoints,
            affected_entities: Vec::new(),
        }
    }

    pub fn key(&self) -> String {
        consumption_key(&self.extension_name, &self.config_id)
    }

    pub fn delta(&self) -> f64 {
        self.current_datapoints - self.previous_datapoints
    }
}

/// Billed DDUs of one host entity in both periods
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostBilling {
    pub entity_id: String,
    pub current_billed: f64,
    pub previous_billed: f64,
}

impl HostBilling {
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            ..Default::default()
        }
    }

    pub fn delta(&self) -> f64 {
        self.current_billed - self.previous_billed
    }
}

/// Which of the two compared periods a sample belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Current,
    Previous,
}

/// Scope a monitoring configuration is bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MonitoringScope {
    /// A single host entity id
    Host(String),
    /// Host group entity id; members are resolved through the entity API
    HostGroup(String),
    /// Management zone name with the scope prefix removed
    ManagementZone(String),
    /// Anything else, e.g. an ActiveGate group
    HostIndependent(String),
}

impl MonitoringScope {
    pub fn parse(scope: &str) -> Self {
        if scope.starts_with("HOST_GROUP") {
            MonitoringScope::HostGroup(scope.to_string())
        } else if scope.starts_with("HOST") {
            MonitoringScope::Host(scope.to_string())
        } else if scope.starts_with("management_zone") {
            let name = scope
                .strip_prefix(MANAGEMENT_ZONE_PREFIX)
                .or_else(|| scope.get(MANAGEMENT_ZONE_PREFIX.len()..))
                .unwrap_or_default();
            MonitoringScope::ManagementZone(name.to_string())
        } else {
            MonitoringScope::HostIndependent(scope.to_string())
        }
    }

    /// Whether billed units can be attributed to individual hosts
    pub fn is_host_attributable(&self) -> bool {
        !matches!(self, MonitoringScope::HostIndependent(_))
    }
}

impl fmt::Display for MonitoringScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitoringScope::Host(id) => write!(f, "host {}", id),
            MonitoringScope::HostGroup(id) => write!(f, "host group {}", id),
            MonitoringScope::ManagementZone(name) => write!(f, "management zone {}", name),
            MonitoringScope::HostIndependent(scope) => write!(f, "{}", scope),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_delta_is_current_minus_previous() {
        let ext = ExtensionConsumption::new("A", "c1", 500.0, 100.0);
        assert_eq!(ext.delta(), 400.0);
        assert_eq!(ext.key(), "A|c1");

        let shrinking = ExtensionConsumption::new("B", "c2", 0.0, 30.0);
        assert_eq!(shrinking.delta(), -30.0);
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!(
            MonitoringScope::parse("HOST_GROUP-1234"),
            MonitoringScope::HostGroup("HOST_GROUP-1234".to_string())
        );
        assert_eq!(
            MonitoringScope::parse("HOST-ABCD"),
            MonitoringScope::Host("HOST-ABCD".to_string())
        );
        assert_eq!(
            MonitoringScope::parse("ag_group-default"),
            MonitoringScope::HostIndependent("ag_group-default".to_string())
        );
    }

    #[test]
    fn test_management_zone_prefix_stripped_once() {
        assert_eq!(
            MonitoringScope::parse("management_zone-Production"),
            MonitoringScope::ManagementZone("Production".to_string())
        );
        assert_eq!(
            MonitoringScope::parse("management_zone-management_zone-X"),
            MonitoringScope::ManagementZone("management_zone-X".to_string())
        );
        assert_eq!(
            MonitoringScope::parse("management_zone"),
            MonitoringScope::ManagementZone(String::new())
        );
    }

    #[test]
    fn test_only_host_independent_scope_skips_attribution() {
        assert!(MonitoringScope::parse("HOST-1").is_host_attributable());
        assert!(MonitoringScope::parse("management_zone-Prod").is_host_attributable());
        assert!(!MonitoringScope::parse("environment").is_host_attributable());
    }

    #[test]
    fn test_time_window_params() {
        let to = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let window = TimeWindow::new(to - chrono::Duration::minutes(5), to);

        assert_eq!(window.from_param(), "2024-03-01T11:55:00.000Z");
        assert_eq!(window.to_param(), "2024-03-01T12:00:00.000Z");

        let shifted = window.shifted_back(chrono::Duration::hours(1));
        assert_eq!(shifted.to_param(), "2024-03-01T11:00:00.000Z");
        assert_eq!(shifted.to - shifted.from, window.to - window.from);
    }

    #[test]
    fn test_problem_analyzed_gate() {
        let mut problem = Problem {
            problem_id: "-123_456V2".to_string(),
            display_id: Some("P-42".to_string()),
            title: None,
            status: Some("OPEN".to_string()),
            comment_count: 0,
        };
        assert!(!problem.is_analyzed());
        assert_eq!(problem.label(), "P-42");

        problem.comment_count = 1;
        assert!(problem.is_analyzed());
    }
}
