//! Open problem listing

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use ddu_lib::analysis::AnalysisWindows;
use ddu_lib::{EndpointConfig, Problem};
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

use crate::config::{load_entries, select_endpoints};
use crate::output::{
    color_comment_count, print_error, print_info, print_json, print_table, OutputFormat,
};

/// Row for the problems table
#[derive(Tabled)]
struct ProblemRow {
    #[tabled(rename = "Problem")]
    label: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Comments")]
    comments: String,
}

#[derive(Serialize)]
struct EndpointProblems {
    environment_url: String,
    problems: Vec<Problem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// List problems currently matching each endpoint's problem text
///
/// An unreachable endpoint is reported in place and does not hide the
/// others; the command fails after everything was printed.
pub async fn list_problems(path: &Path, only: Option<usize>, format: OutputFormat) -> Result<()> {
    let endpoints = select_endpoints(load_entries(path)?, only)?;
    let windows = AnalysisWindows::ending_at(Utc::now());

    let mut results = Vec::with_capacity(endpoints.len());
    for endpoint in endpoints {
        let (problems, error) = match fetch_problems(&endpoint, &windows).await {
            Ok(problems) => (problems, None),
            Err(e) => (Vec::new(), Some(format!("{:#}", e))),
        };
        results.push(EndpointProblems {
            environment_url: endpoint.environment_url,
            problems,
            error,
        });
    }

    match format {
        OutputFormat::Json => print_json(&results)?,
        OutputFormat::Table => print_results(&results),
    }

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    super::ensure_no_failures(failed, results.len())
}

async fn fetch_problems(endpoint: &EndpointConfig, windows: &AnalysisWindows) -> Result<Vec<Problem>> {
    let api = super::connect(endpoint)?;
    Ok(api
        .open_problems(&endpoint.problem_text, &windows.problems)
        .await?)
}

fn print_results(results: &[EndpointProblems]) {
    for result in results {
        println!("{}", result.environment_url.bold());
        println!("{}", "=".repeat(60));

        if let Some(error) = &result.error {
            print_error(error);
            println!();
            continue;
        }

        if result.problems.is_empty() {
            print_info("No matching open problems");
            println!();
            continue;
        }

        let rows: Vec<ProblemRow> = result
            .problems
            .iter()
            .map(|p| ProblemRow {
                label: p.label().cyan().to_string(),
                title: p.title.clone().unwrap_or_default(),
                status: p.status.clone().unwrap_or_default(),
                comments: color_comment_count(p.comment_count),
            })
            .collect();
        print_table(rows);
        println!();
    }
}
