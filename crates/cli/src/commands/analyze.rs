//! On-demand root-cause analysis

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use ddu_lib::analysis::{AnalysisWindows, RootCauseReport};
use ddu_lib::{EndpointConfig, ProblemCorrelator, ProblemOutcome, StructuredLogger};
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;
use tracing::debug;

use crate::config::{load_entries, select_endpoints};
use crate::output::{
    format_delta, print_error, print_info, print_json, print_success, print_table, OutputFormat,
};

/// Row for the billable extensions table
#[derive(Tabled)]
struct ExtensionRow {
    #[tabled(rename = "Extension")]
    extension: String,
    #[tabled(rename = "Config ID")]
    config_id: String,
    #[tabled(rename = "Scope")]
    scope: String,
    #[tabled(rename = "Data Points")]
    delta: String,
    #[tabled(rename = "Billed Hosts")]
    hosts: String,
}

#[derive(Serialize)]
struct EndpointAnalysis {
    environment_url: String,
    problems: Vec<ProblemAnalysis>,
    /// Why the endpoint stopped early; problems handled before are kept
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct ProblemAnalysis {
    problem_id: String,
    display_id: Option<String>,
    already_analyzed: bool,
    posted: bool,
    report: Option<RootCauseReport>,
    comment: Option<String>,
}

/// Analyze open problems of the selected endpoints
///
/// Without `post` nothing is written back; problems that already carry a
/// comment are listed but not analyzed either way. A failing endpoint is
/// reported with whatever it handled before the failure and the remaining
/// endpoints still run.
pub async fn analyze_problems(
    path: &Path,
    only: Option<usize>,
    post: bool,
    format: OutputFormat,
) -> Result<()> {
    let endpoints = select_endpoints(load_entries(path)?, only)?;
    let windows = AnalysisWindows::ending_at(Utc::now());

    let mut results = Vec::with_capacity(endpoints.len());
    for endpoint in endpoints {
        let mut result = EndpointAnalysis {
            environment_url: endpoint.environment_url.clone(),
            problems: Vec::new(),
            error: None,
        };
        if let Err(e) = analyze_endpoint(endpoint, &windows, post, &mut result.problems).await {
            result.error = Some(format!("{:#}", e));
        }
        results.push(result);
    }

    match format {
        OutputFormat::Json => print_json(&results)?,
        OutputFormat::Table => print_results(&results, post),
    }

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    super::ensure_no_failures(failed, results.len())
}

async fn analyze_endpoint(
    endpoint: EndpointConfig,
    windows: &AnalysisWindows,
    post: bool,
    analyses: &mut Vec<ProblemAnalysis>,
) -> Result<()> {
    let api = super::connect(&endpoint)?;
    let correlator = ProblemCorrelator::new(api, endpoint, StructuredLogger::new("ddu-cli"));

    let problems = correlator.open_problems(windows).await?;
    debug!(
        environment_url = %correlator.endpoint().environment_url,
        count = problems.len(),
        "Fetched problems"
    );

    for problem in problems {
        let report = if post {
            match correlator.handle_problem(&problem, windows).await? {
                ProblemOutcome::AlreadyAnalyzed => None,
                ProblemOutcome::Commented(report) => Some(report),
            }
        } else if problem.is_analyzed() {
            None
        } else {
            Some(correlator.analyze(&problem.problem_id, windows).await?)
        };

        analyses.push(ProblemAnalysis {
            problem_id: problem.problem_id.clone(),
            display_id: problem.display_id.clone(),
            already_analyzed: problem.is_analyzed(),
            posted: post && report.is_some(),
            comment: report.as_ref().map(RootCauseReport::render),
            report,
        });
    }

    Ok(())
}

fn print_results(results: &[EndpointAnalysis], post: bool) {
    for result in results {
        println!("{}", result.environment_url.bold());
        println!("{}", "=".repeat(60));

        if result.problems.is_empty() && result.error.is_none() {
            print_info("No matching open problems");
            println!();
        }

        for analysis in &result.problems {
            print_analysis(analysis, post);
        }

        if let Some(error) = &result.error {
            print_error(error);
            println!();
        }
    }
}

fn print_analysis(analysis: &ProblemAnalysis, post: bool) {
    let label = analysis.display_id.as_deref().unwrap_or(&analysis.problem_id);
    println!("{} {}", "Problem".bold(), label.cyan());
    println!("{}", "-".repeat(60));

    let Some(report) = &analysis.report else {
        print_info("Already commented, skipped");
        println!();
        return;
    };

    if report.is_empty() {
        print_info("No bill-affecting extensions were detected");
    } else {
        let rows: Vec<ExtensionRow> = report
            .entries()
            .into_iter()
            .map(|entry| ExtensionRow {
                extension: entry.consumption.extension_name.clone(),
                config_id: entry.consumption.config_id.clone(),
                scope: entry.scope.to_string(),
                delta: format_delta(entry.consumption.delta()).green().to_string(),
                hosts: entry.consumption.affected_entities.join(", "),
            })
            .collect();
        print_table(rows);
    }

    if post {
        print_success("Comment posted");
    } else if let Some(comment) = &analysis.comment {
        println!();
        println!("{}", "Comment preview".bold());
        println!("{}", comment);
    }
    println!();
}
