//! Attribution of data point increases to billed hosts
//!
//! An increase only costs money when the hosts in the configuration's scope
//! were billed more DDUs than in the comparison period. Extensions not bound
//! to hosts cannot be attributed and always count as billable.

use super::aggregator::HostBillingMap;
use crate::error::GatewayError;
use crate::gateway::{selectors, MonitoringApi};
use crate::models::{ExtensionConsumption, MonitoringScope, TimeWindow};
use serde::Serialize;
use tracing::debug;

/// An extension configuration whose increase was billed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillableExtension {
    pub consumption: ExtensionConsumption,
    pub scope: MonitoringScope,
}

impl BillableExtension {
    /// How often the extension qualified: once per billed host, or once for
    /// host-independent scopes
    pub fn qualifications(&self) -> usize {
        if self.scope.is_host_attributable() {
            self.consumption.affected_entities.len()
        } else {
            1
        }
    }
}

/// Hosts from `hosts` whose billed DDUs increased
pub fn billable_hosts(hosts: &[String], billing: &HostBillingMap) -> Vec<String> {
    hosts
        .iter()
        .filter(|id| billing.get(id.as_str()).map_or(false, |b| b.delta() > 0.0))
        .cloned()
        .collect()
}

/// Resolves scopes and filters candidates down to billing-affecting ones
pub struct BillingAttributor<'a> {
    api: &'a dyn MonitoringApi,
    /// Range used when resolving scope membership
    entity_window: TimeWindow,
}

impl<'a> BillingAttributor<'a> {
    pub fn new(api: &'a dyn MonitoringApi, entity_window: TimeWindow) -> Self {
        Self { api, entity_window }
    }

    /// Keep the candidates whose increase affected billing
    pub async fn attribute(
        &self,
        candidates: Vec<ExtensionConsumption>,
        billing: &HostBillingMap,
    ) -> Result<Vec<BillableExtension>, GatewayError> {
        let mut billable = Vec::new();

        for mut consumption in candidates {
            let raw_scope = self
                .api
                .monitoring_scope(&consumption.extension_name, &consumption.config_id)
                .await?;
            let scope = MonitoringScope::parse(&raw_scope);

            if !scope.is_host_attributable() {
                debug!(
                    extension = %consumption.extension_name,
                    config_id = %consumption.config_id,
                    scope = %scope,
                    "Host-independent scope, counted as billable"
                );
                billable.push(BillableExtension { consumption, scope });
                continue;
            }

            let hosts = self.resolve_hosts(&scope).await?;
            let affected = billable_hosts(&hosts, billing);

            debug!(
                extension = %consumption.extension_name,
                config_id = %consumption.config_id,
                scope = %scope,
                hosts = hosts.len(),
                billed_hosts = affected.len(),
                "Scope resolved"
            );

            if !affected.is_empty() {
                consumption.affected_entities.extend(affected);
                billable.push(BillableExtension { consumption, scope });
            }
        }

        Ok(billable)
    }

    /// Host entity ids covered by a scope
    pub async fn resolve_hosts(&self, scope: &MonitoringScope) -> Result<Vec<String>, GatewayError> {
        match scope {
            MonitoringScope::Host(id) => Ok(vec![id.clone()]),
            MonitoringScope::HostGroup(id) => {
                self.api
                    .entity_ids(&selectors::host_group_members(id), &self.entity_window)
                    .await
            }
            MonitoringScope::ManagementZone(name) => {
                self.api
                    .entity_ids(&selectors::management_zone_members(name), &self.entity_window)
                    .await
            }
            MonitoringScope::HostIndependent(_) => Ok(Vec::new()),
        }
    }
}
