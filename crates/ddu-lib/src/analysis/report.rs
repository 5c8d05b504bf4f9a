//! Problem comment rendering

use super::attributor::BillableExtension;
use serde::Serialize;
use std::fmt::Write;

/// First line of every comment
pub const REPORT_HEADER: &str = "DDU root cause analysis: \n";

/// Body when nothing billable was found
pub const NO_FINDINGS: &str = "No bill-affecting extensions were detected.";

const ENTRY_SEPARATOR: &str = "====================\n";

/// Outcome of one problem's analysis
#[derive(Debug, Clone, Default, Serialize)]
pub struct RootCauseReport {
    pub extensions: Vec<BillableExtension>,
    /// List each extension once instead of once per billed host
    pub dedupe: bool,
}

impl RootCauseReport {
    pub fn new(extensions: Vec<BillableExtension>, dedupe: bool) -> Self {
        Self { extensions, dedupe }
    }

    /// Entries in the order they appear in the comment
    pub fn entries(&self) -> Vec<&BillableExtension> {
        if self.dedupe {
            return self.extensions.iter().collect();
        }

        self.extensions
            .iter()
            .flat_map(|ext| std::iter::repeat(ext).take(ext.qualifications()))
            .collect()
    }

    /// Number of bill-affecting entries in the comment
    pub fn detected_count(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Comment text posted to the problem
    pub fn render(&self) -> String {
        let mut message = String::from(REPORT_HEADER);

        if self.is_empty() {
            message.push_str(NO_FINDINGS);
            return message;
        }

        for entry in self.entries() {
            let ext = &entry.consumption;
            // Writing to a String cannot fail
            let _ = write!(
                message,
                "Extension: {} \nConfig ID: {} \nData point increase: {} \nAffected Entities: {} \n{}",
                ext.extension_name,
                ext.config_id,
                ext.delta(),
                ext.affected_entities.join(", "),
                ENTRY_SEPARATOR
            );
        }

        message
    }
}
