//! CLI command implementations

pub mod analyze;
pub mod check;
pub mod problems;

use anyhow::bail;
use ddu_lib::gateway::{GatewayFactory, HttpGatewayFactory, MonitoringApi};
use ddu_lib::EndpointConfig;
use std::sync::Arc;

/// Open a gateway to one endpoint with the default request timeout
pub(crate) fn connect(endpoint: &EndpointConfig) -> anyhow::Result<Arc<dyn MonitoringApi>> {
    Ok(HttpGatewayFactory::default().connect(endpoint)?)
}

/// Fail the command once every endpoint has been reported
pub(crate) fn ensure_no_failures(failed: usize, total: usize) -> anyhow::Result<()> {
    if failed > 0 {
        bail!("{} of {} endpoints failed", failed, total);
    }
    Ok(())
}
