//! Metric and entity selectors used by the analysis

/// Ingested data points split by extension and monitoring configuration
pub const INGESTED_DATAPOINTS: &str = "dsfm:server.metrics.ingest.external_datapoints:splitBy(source,\"dt.extension.config.id\"):sort(value(auto,descending)):fold(sum)";

/// Billed DDUs split by host entity
pub const BILLED_DDUS_BY_HOST: &str = "builtin:billing.ddu.metrics.byEntity:filter(in(\"dt.entity.monitored_entity\",entitySelector(\"type(~\"HOST~\")\"))):splitBy(\"dt.entity.monitored_entity\"):sort(value(auto,descending)):fold(sum)";

/// Dimension holding the extension name
pub const SOURCE_DIMENSION: &str = "source";

/// Dimension holding the monitoring configuration id
pub const CONFIG_ID_DIMENSION: &str = "dt.extension.config.id";

/// Dimension holding the billed host entity
pub const MONITORED_ENTITY_DIMENSION: &str = "dt.entity.monitored_entity";

/// Open problems whose text matches
pub fn open_problems(problem_text: &str) -> String {
    format!("status(open),text({})", quote(problem_text))
}

/// Hosts that are instances of a host group
pub fn host_group_members(host_group_id: &str) -> String {
    format!(
        "type(HOST),fromRelationships.isInstanceOf(entityId({}))",
        quote(host_group_id)
    )
}

/// Hosts in a management zone
pub fn management_zone_members(zone_name: &str) -> String {
    format!("type(HOST),mzName({})", quote(zone_name))
}

/// Quote a selector value, escaping `~` and `"` with `~`
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '~' || c == '"' {
            quoted.push('~');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
