//! Activation config validation

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

use crate::config::load_entries;
use crate::output::{print_json, print_success, print_table, print_warning, OutputFormat};

/// One endpoint entry and whether it is usable
#[derive(Tabled, Serialize)]
struct EndpointCheckRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Environment")]
    environment_url: String,
    #[tabled(rename = "Problem Text")]
    problem_text: String,
    #[tabled(rename = "Threshold")]
    threshold: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(skip)]
    valid: bool,
}

/// Validate every endpoint entry, optionally contacting each environment
pub async fn check_config(path: &Path, connect: bool, format: OutputFormat) -> Result<()> {
    let entries = load_entries(path)?;
    let mut rows = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let row = match entry {
            Ok(endpoint) => {
                let status = if connect {
                    match super::connect(&endpoint) {
                        Ok(api) => match api.extension_names().await {
                            Ok(names) => Ok(format!("reachable ({} extensions)", names.len())),
                            Err(e) => Err(e.to_string()),
                        },
                        Err(e) => Err(e.to_string()),
                    }
                } else {
                    Ok("valid".to_string())
                };

                EndpointCheckRow {
                    index,
                    environment_url: endpoint.environment_url,
                    problem_text: endpoint.problem_text,
                    threshold: endpoint.datapoint_delta_threshold.to_string(),
                    valid: status.is_ok(),
                    status: status.unwrap_or_else(|e| e),
                }
            }
            Err(e) => EndpointCheckRow {
                index,
                environment_url: "-".to_string(),
                problem_text: "-".to_string(),
                threshold: "-".to_string(),
                status: e.to_string(),
                valid: false,
            },
        };
        rows.push(row);
    }

    let failed = rows.iter().filter(|r| !r.valid).count();

    match format {
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Table => {
            println!("{} {}", "Activation config:".bold(), path.display());
            println!("{}", "=".repeat(60));
            for row in rows.iter_mut().filter(|r| !r.valid) {
                row.status = row.status.red().to_string();
            }
            let total = rows.len();
            print_table(rows);
            println!();

            if failed == 0 {
                print_success(&format!("All {} endpoints are usable", total));
            } else {
                print_warning(&format!("{} of {} endpoints are not usable", failed, total));
            }
        }
    }

    Ok(())
}
