//! Root-cause analysis of DDU spikes
//!
//! This module provides:
//! - Query windows for the current and comparison periods
//! - Folding of ingestion and billing series into per-key totals
//! - Attribution of data point increases to billed hosts
//! - Rendering of the problem comment

mod aggregator;
mod attributor;
mod report;
mod window;

pub use aggregator::{
    candidates_above, fold_consumption, fold_host_billing, ConsumptionMap, HostBillingMap,
};
pub use attributor::{billable_hosts, BillableExtension, BillingAttributor};
pub use report::{RootCauseReport, NO_FINDINGS, REPORT_HEADER};
pub use window::AnalysisWindows;
