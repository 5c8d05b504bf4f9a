//! Folding of raw metric series into per-period totals

use crate::gateway::selectors::{CONFIG_ID_DIMENSION, MONITORED_ENTITY_DIMENSION, SOURCE_DIMENSION};
use crate::models::{consumption_key, ExtensionConsumption, HostBilling, MetricSample, Period};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Extension consumption keyed by `extension|configId`
pub type ConsumptionMap = BTreeMap<String, ExtensionConsumption>;

/// Host billing keyed by entity id
pub type HostBillingMap = BTreeMap<String, HostBilling>;

/// Fold ingestion samples of both periods into one record per extension configuration
///
/// Samples whose source is not a known extension are ignored. Samples sharing a
/// key within one period are summed.
pub fn fold_consumption(
    current: &[MetricSample],
    previous: &[MetricSample],
    known_extensions: &HashSet<String>,
) -> ConsumptionMap {
    let mut map = ConsumptionMap::new();
    accumulate_consumption(&mut map, current, known_extensions, Period::Current);
    accumulate_consumption(&mut map, previous, known_extensions, Period::Previous);
    map
}

fn accumulate_consumption(
    map: &mut ConsumptionMap,
    samples: &[MetricSample],
    known_extensions: &HashSet<String>,
    period: Period,
) {
    for sample in samples {
        let Some(source) = sample.dimension(SOURCE_DIMENSION) else {
            continue;
        };
        if !known_extensions.contains(source) {
            continue;
        }
        let Some(config_id) = sample.dimension(CONFIG_ID_DIMENSION) else {
            debug!(extension = %source, "Sample without configuration id ignored");
            continue;
        };

        let record = map
            .entry(consumption_key(source, config_id))
            .or_insert_with(|| ExtensionConsumption::new(source, config_id, 0.0, 0.0));

        match period {
            Period::Current => record.current_datapoints += sample.value,
            Period::Previous => record.previous_datapoints += sample.value,
        }
    }
}

/// Records whose delta strictly exceeds `threshold`
pub fn candidates_above(map: ConsumptionMap, threshold: f64) -> Vec<ExtensionConsumption> {
    map.into_values()
        .filter(|ext| ext.delta() > threshold)
        .collect()
}

/// Fold billed-DDU samples of both periods into one record per host
pub fn fold_host_billing(current: &[MetricSample], previous: &[MetricSample]) -> HostBillingMap {
    let mut map = HostBillingMap::new();
    accumulate_billing(&mut map, current, Period::Current);
    accumulate_billing(&mut map, previous, Period::Previous);
    map
}

fn accumulate_billing(map: &mut HostBillingMap, samples: &[MetricSample], period: Period) {
    for sample in samples {
        let Some(entity_id) = sample.dimension(MONITORED_ENTITY_DIMENSION) else {
            continue;
        };

        let record = map
            .entry(entity_id.to_string())
            .or_insert_with(|| HostBilling::new(entity_id));

        match period {
            Period::Current => record.current_billed += sample.value,
            Period::Previous => record.previous_billed += sample.value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn ingest(source: &str, config_id: &str, value: f64) -> MetricSample {
        let mut dimensions = HashMap::new();
        dimensions.insert(SOURCE_DIMENSION.to_string(), source.to_string());
        dimensions.insert(CONFIG_ID_DIMENSION.to_string(), config_id.to_string());
        MetricSample {
            dimensions,
            value,
            timestamp: None,
        }
    }

    fn billed(entity_id: &str, value: f64) -> MetricSample {
        let mut dimensions = HashMap::new();
        dimensions.insert(MONITORED_ENTITY_DIMENSION.to_string(), entity_id.to_string());
        MetricSample {
            dimensions,
            value,
            timestamp: None,
        }
    }

    fn known(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_duplicate_keys_are_summed() {
        let current = vec![ingest("A", "c1", 300.0), ingest("A", "c1", 200.0)];
        let previous = vec![ingest("A", "c1", 60.0), ingest("A", "c1", 40.0)];

        let map = fold_consumption(&current, &previous, &known(&["A"]));

        let record = &map["A|c1"];
        assert_eq!(record.current_datapoints, 500.0);
        assert_eq!(record.previous_datapoints, 100.0);
        assert_eq!(record.delta(), 400.0);
    }

    #[test]
    fn test_unknown_sources_never_create_records() {
        let current = vec![ingest("oneagent", "c0", 1_000_000.0), ingest("A", "c1", 10.0)];
        let previous = vec![ingest("api", "c9", 5.0)];

        let map = fold_consumption(&current, &previous, &known(&["A"]));

        assert_eq!(map.len(), 1);
        assert!(map.contains_key("A|c1"));
    }

    #[test]
    fn test_extension_present_in_one_period_only() {
        let current = vec![ingest("new", "c1", 80.0)];
        let previous = vec![ingest("gone", "c2", 30.0)];

        let map = fold_consumption(&current, &previous, &known(&["new", "gone"]));

        assert_eq!(map["new|c1"].delta(), 80.0);
        assert_eq!(map["gone|c2"].delta(), -30.0);
    }

    #[test]
    fn test_sample_without_source_or_config_ignored() {
        let mut no_config = ingest("A", "c1", 10.0);
        no_config.dimensions.remove(CONFIG_ID_DIMENSION);
        let mut no_source = ingest("A", "c1", 10.0);
        no_source.dimensions.remove(SOURCE_DIMENSION);

        let map = fold_consumption(&[no_config, no_source], &[], &known(&["A"]));

        assert!(map.is_empty());
    }

    #[test]
    fn test_threshold_is_strict() {
        let current = vec![
            ingest("A", "c1", 150.0),
            ingest("B", "c2", 151.0),
            ingest("C", "c3", 10.0),
        ];
        let previous = vec![ingest("A", "c1", 100.0), ingest("B", "c2", 100.0)];

        let map = fold_consumption(&current, &previous, &known(&["A", "B", "C"]));
        let candidates = candidates_above(map, 50.0);

        let keys: Vec<String> = candidates.iter().map(|c| c.key()).collect();
        assert_eq!(keys, vec!["B|c2"]);
    }

    #[test]
    fn test_host_billing_accumulates() {
        let current = vec![billed("HOST-1", 6.0), billed("HOST-1", 4.0), billed("HOST-2", 1.0)];
        let previous = vec![billed("HOST-1", 2.0), billed("HOST-3", 7.0)];

        let map = fold_host_billing(&current, &previous);

        assert_eq!(map["HOST-1"].current_billed, 10.0);
        assert_eq!(map["HOST-1"].previous_billed, 2.0);
        assert_eq!(map["HOST-1"].delta(), 8.0);
        assert_eq!(map["HOST-2"].delta(), 1.0);
        assert_eq!(map["HOST-3"].delta(), -7.0);
    }
}
