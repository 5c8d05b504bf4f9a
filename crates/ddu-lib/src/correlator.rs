//! Per-endpoint problem correlation
//!
//! Drives one endpoint through a cycle: fetch matching open problems, skip
//! the ones that already carry a comment, analyze the rest and write the
//! report back. The first error aborts the endpoint's remaining problems;
//! an unanalyzed problem has no comment and is picked up again next cycle.

use crate::analysis::{
    candidates_above, fold_consumption, fold_host_billing, AnalysisWindows, BillingAttributor,
    RootCauseReport,
};
use crate::config::EndpointConfig;
use crate::error::Result;
use crate::gateway::{selectors, MonitoringApi};
use crate::models::Problem;
use crate::observability::StructuredLogger;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// What happened to one problem
#[derive(Debug, Clone)]
pub enum ProblemOutcome {
    /// Already commented; never analyzed again
    AlreadyAnalyzed,
    /// Analyzed and commented with this report
    Commented(RootCauseReport),
}

/// Counters for one endpoint's pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EndpointSummary {
    pub problems_found: usize,
    pub problems_analyzed: usize,
    pub problems_skipped: usize,
    pub comments_posted: usize,
    pub billable_extensions: usize,
}

/// Correlates DDU problems of one endpoint with extension ingestion
pub struct ProblemCorrelator {
    api: Arc<dyn MonitoringApi>,
    endpoint: EndpointConfig,
    logger: StructuredLogger,
}

impl ProblemCorrelator {
    pub fn new(api: Arc<dyn MonitoringApi>, endpoint: EndpointConfig, logger: StructuredLogger) -> Self {
        Self {
            api,
            endpoint,
            logger,
        }
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    /// Open problems matching the endpoint's problem text
    pub async fn open_problems(&self, windows: &AnalysisWindows) -> Result<Vec<Problem>> {
        Ok(self
            .api
            .open_problems(&self.endpoint.problem_text, &windows.problems)
            .await?)
    }

    /// Run the full cycle for this endpoint with windows ending at `now`
    pub async fn run(&self, now: DateTime<Utc>) -> Result<EndpointSummary> {
        let windows = AnalysisWindows::ending_at(now);
        self.logger
            .log_endpoint_started(&self.endpoint.environment_url, &self.endpoint.problem_text);

        let problems = self.open_problems(&windows).await?;
        self.logger
            .log_problems_found(&self.endpoint.environment_url, problems.len());

        let mut summary = EndpointSummary {
            problems_found: problems.len(),
            ..Default::default()
        };

        for problem in &problems {
            match self.handle_problem(problem, &windows).await? {
                ProblemOutcome::AlreadyAnalyzed => summary.problems_skipped += 1,
                ProblemOutcome::Commented(report) => {
                    summary.problems_analyzed += 1;
                    summary.comments_posted += 1;
                    summary.billable_extensions += report.detected_count();
                }
            }
        }

        info!(
            environment_url = %self.endpoint.environment_url,
            analyzed = summary.problems_analyzed,
            skipped = summary.problems_skipped,
            "Finished analysis of DDU problems"
        );

        Ok(summary)
    }

    /// Analyze and comment one problem unless it was handled before
    pub async fn handle_problem(
        &self,
        problem: &Problem,
        windows: &AnalysisWindows,
    ) -> Result<ProblemOutcome> {
        if problem.is_analyzed() {
            self.logger
                .log_problem_skipped(&problem.problem_id, problem.comment_count);
            return Ok(ProblemOutcome::AlreadyAnalyzed);
        }

        info!(problem_id = %problem.problem_id, "Analyzing problem");
        let report = self.analyze(&problem.problem_id, windows).await?;

        self.api
            .post_comment(&problem.problem_id, &report.render())
            .await?;
        self.logger
            .log_comment_posted(&problem.problem_id, report.detected_count());

        Ok(ProblemOutcome::Commented(report))
    }

    /// Build the root-cause report without writing anything
    pub async fn analyze(&self, problem_id: &str, windows: &AnalysisWindows) -> Result<RootCauseReport> {
        let ingest_current = self
            .api
            .query_metric(selectors::INGESTED_DATAPOINTS, &windows.current)
            .await?;
        let ingest_previous = self
            .api
            .query_metric(selectors::INGESTED_DATAPOINTS, &windows.previous)
            .await?;
        let known_extensions = self.api.extension_names().await?;

        let consumption = fold_consumption(&ingest_current, &ingest_previous, &known_extensions);
        let threshold = self.endpoint.datapoint_delta_threshold;
        let candidates = candidates_above(consumption, threshold);
        self.logger
            .log_candidates(problem_id, candidates.len(), threshold);

        let billed_current = self
            .api
            .query_metric(selectors::BILLED_DDUS_BY_HOST, &windows.current)
            .await?;
        let billed_previous = self
            .api
            .query_metric(selectors::BILLED_DDUS_BY_HOST, &windows.previous)
            .await?;
        let billing = fold_host_billing(&billed_current, &billed_previous);

        let attributor = BillingAttributor::new(self.api.as_ref(), windows.entities);
        let billable = attributor.attribute(candidates, &billing).await?;

        Ok(RootCauseReport::new(billable, self.endpoint.dedupe_report))
    }
}
