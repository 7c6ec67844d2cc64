//! Scrape service
//!
//! The per-group pipeline: fetch, derive statistics, extract and evaluate
//! each criterion, aggregate, store.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::app::evaluator_service::EvaluatorService;
use crate::app::extractor::extract;
use crate::app::snapshot_service::SnapshotService;
use crate::domain::entities::{
    Criterion, CriterionScore, EvaluationRecord, FailureKind, Group, GroupId, RepoStats, RunId,
};
use crate::domain::ports::{EvaluationRepository, GitHubClient, LlmClient};
use crate::error::{AppError, GitHubError};

/// Outcome of one scrape run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub evaluated: usize,
    /// Groups with at least one fallback score
    pub failed: Vec<(GroupId, Vec<FailureKind>)>,
}

/// Service running the evaluation pipeline over roster groups
pub struct ScrapeService<G, L, R>
where
    G: GitHubClient,
    L: LlmClient,
    R: EvaluationRepository,
{
    snapshots: Arc<SnapshotService<G>>,
    evaluator: Arc<EvaluatorService<L>>,
    store: Arc<R>,
    summary_budget: usize,
}

impl<G, L, R> ScrapeService<G, L, R>
where
    G: GitHubClient,
    L: LlmClient,
    R: EvaluationRepository,
{
    pub fn new(
        snapshots: Arc<SnapshotService<G>>,
        evaluator: Arc<EvaluatorService<L>>,
        store: Arc<R>,
        summary_budget: usize,
    ) -> Self {
        Self {
            snapshots,
            evaluator,
            store,
            summary_budget,
        }
    }

    /// Evaluate one group without storing the result.
    ///
    /// Only a rejected GitHub token is an error; every other failure is
    /// folded into the record as fallback scores.
    pub async fn evaluate_group(
        &self,
        group: &Group,
        run_id: RunId,
    ) -> Result<EvaluationRecord, AppError> {
        let snapshot = match self.snapshots.fetch(group).await {
            Ok(snapshot) => snapshot,
            Err(GitHubError::Unauthorized) => return Err(AppError::Auth),
            Err(e) => {
                let failure = e.failure_kind();
                tracing::warn!(group = %group.id, error = %e, %failure, "Fetch failed");
                return Ok(EvaluationRecord::failed(
                    group,
                    run_id,
                    failure,
                    &fetch_failure_note(group, &e),
                ));
            }
        };

        let stats = RepoStats::from_snapshot(&snapshot);

        let mut scores: Vec<CriterionScore> = Vec::with_capacity(Criterion::ALL.len());
        for criterion in Criterion::ALL {
            let summary = extract(&snapshot, criterion, self.summary_budget);
            tracing::debug!(
                group = %group.id,
                %criterion,
                bytes = summary.text.len(),
                files = summary.file_count,
                truncated = summary.truncated,
                "Extracted summary"
            );

            match self.evaluator.evaluate(&summary).await {
                Ok(score) => {
                    tracing::info!(group = %group.id, %criterion, score = score.score, "Scored");
                    scores.push(score);
                }
                Err(e) => {
                    tracing::error!(group = %group.id, %criterion, error = %e, "LLM endpoint failed");
                    let note = format!("Evaluation aborted, LLM endpoint failed: {}", e);
                    for remaining in Criterion::ALL.iter().skip(scores.len()) {
                        scores.push(CriterionScore::lowest(
                            *remaining,
                            FailureKind::Endpoint,
                            note.clone(),
                        ));
                    }
                    break;
                }
            }
        }

        Ok(EvaluationRecord::from_scores(
            group,
            run_id,
            scores,
            Some(stats),
        ))
    }

    /// Evaluate and store every group, up to `concurrency` at a time.
    ///
    /// Aborts on a rejected GitHub token or a store error.
    pub async fn run(&self, groups: &[Group], concurrency: usize) -> Result<RunSummary, AppError> {
        let run_id = RunId::new();
        tracing::info!(%run_id, groups = groups.len(), concurrency, "Starting scrape run");

        let mut results = stream::iter(groups)
            .map(|group| async move { (group.id, self.evaluate_group(group, run_id).await) })
            .buffer_unordered(concurrency.max(1));

        let mut summary = RunSummary {
            run_id,
            evaluated: 0,
            failed: Vec::new(),
        };

        while let Some((group_id, result)) = results.next().await {
            let record = result?;
            self.store.upsert(&record).await?;

            let failures = record.failures();
            if !failures.is_empty() {
                summary.failed.push((group_id, failures));
            }
            summary.evaluated += 1;
            tracing::info!(
                group = %group_id,
                overall = record.overall_score,
                "Group evaluated"
            );
        }

        summary.failed.sort_by_key(|(id, _)| *id);
        tracing::info!(
            %run_id,
            evaluated = summary.evaluated,
            with_failures = summary.failed.len(),
            "Scrape run finished"
        );

        Ok(summary)
    }
}

fn fetch_failure_note(group: &Group, error: &GitHubError) -> String {
    match error {
        GitHubError::InvalidRepoUrl(_) => {
            format!("Repository URL is not a GitHub repository: '{}'", group.repo_url)
        }
        GitHubError::RepoNotFound { owner, repo } => {
            format!("Repository {}/{} not found or not public", owner, repo)
        }
        GitHubError::RateLimited { .. } => {
            "GitHub rate limit still exhausted after retries; repository not fetched".to_string()
        }
        other => format!("GitHub request failed: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::snapshot_service::{RetryPolicy, SnapshotLimits};
    use crate::domain::entities::SCORE_MIN;
    use crate::test_utils::{
        test_group_with_url, InMemoryEvaluationRepository, MockGitHubClient, MockLlmClient,
    };

    const GOOD_REPLY: &str = r#"{"score": 4, "summary": "Solid work.", "confidence": 8}"#;

    fn create_service(
        github: MockGitHubClient,
        llm: MockLlmClient,
        store: Arc<InMemoryEvaluationRepository>,
    ) -> ScrapeService<MockGitHubClient, MockLlmClient, InMemoryEvaluationRepository> {
        ScrapeService::new(
            Arc::new(SnapshotService::new(
                Arc::new(github),
                RetryPolicy::default(),
                SnapshotLimits::default(),
            )),
            Arc::new(EvaluatorService::new(Arc::new(llm))),
            store,
            8_000,
        )
    }

    #[tokio::test]
    async fn evaluates_all_criteria() {
        let store = Arc::new(InMemoryEvaluationRepository::new());
        let service = create_service(
            MockGitHubClient::new().with_python_project("team1", "project"),
            MockLlmClient::new().with_default_reply(GOOD_REPLY),
            store,
        );
        let group = test_group_with_url(1, "https://github.com/team1/project");

        let record = service.evaluate_group(&group, RunId::new()).await.unwrap();

        assert_eq!(record.scores.len(), 3);
        assert!(record.scores.iter().all(|s| s.score == 4));
        assert!(record.failures().is_empty());
        assert!(record.stats.is_some());
        assert_eq!(record.overall_score, 8);
    }

    #[tokio::test]
    async fn unauthorized_aborts() {
        let store = Arc::new(InMemoryEvaluationRepository::new());
        let service = create_service(
            MockGitHubClient::new()
                .with_python_project("team1", "project")
                .with_unauthorized(),
            MockLlmClient::new().with_default_reply(GOOD_REPLY),
            store.clone(),
        );
        let groups = vec![
            test_group_with_url(1, "https://github.com/team1/project"),
            test_group_with_url(2, "https://github.com/team1/project"),
        ];

        let result = service.run(&groups, 1).await;

        assert!(matches!(result, Err(AppError::Auth)));
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn endpoint_failure_keeps_scored_criteria() {
        let store = Arc::new(InMemoryEvaluationRepository::new());
        let service = create_service(
            MockGitHubClient::new().with_python_project("team1", "project"),
            // one scripted reply, then the endpoint errors
            MockLlmClient::new().with_reply(GOOD_REPLY),
            store,
        );
        let group = test_group_with_url(1, "https://github.com/team1/project");

        let record = service.evaluate_group(&group, RunId::new()).await.unwrap();

        let cq = record.score_for(Criterion::CodeQuality).unwrap();
        assert_eq!(cq.score, 4);
        assert!(!cq.is_fallback());
        for criterion in [Criterion::UnitTesting, Criterion::CiCd] {
            let score = record.score_for(criterion).unwrap();
            assert_eq!(score.score, SCORE_MIN);
            assert_eq!(score.failure, Some(FailureKind::Endpoint));
            assert!(score.justification.contains("LLM endpoint failed"));
        }
    }

    #[tokio::test]
    async fn missing_tests_score_lowest_without_error() {
        let store = Arc::new(InMemoryEvaluationRepository::new());
        let llm = Arc::new(MockLlmClient::new().with_default_reply(GOOD_REPLY));
        let service = ScrapeService::new(
            Arc::new(SnapshotService::new(
                Arc::new(MockGitHubClient::new().with_untested_project("team9", "notebook")),
                RetryPolicy::default(),
                SnapshotLimits::default(),
            )),
            Arc::new(EvaluatorService::new(llm.clone())),
            store,
            8_000,
        );
        let group = test_group_with_url(9, "https://github.com/team9/notebook");

        let record = service.evaluate_group(&group, RunId::new()).await.unwrap();

        let ut = record.score_for(Criterion::UnitTesting).unwrap();
        assert_eq!(ut.failure, Some(FailureKind::MissingData));
        assert!(!ut.justification.is_empty());
        // code quality and CI/CD still went to the LLM
        assert_eq!(llm.requests().len(), 2);
    }

    #[tokio::test]
    async fn run_reports_failures_and_stores_everything() {
        let store = Arc::new(InMemoryEvaluationRepository::new());
        let service = create_service(
            MockGitHubClient::new()
                .with_python_project("team1", "project")
                .with_python_project("team3", "project"),
            MockLlmClient::new().with_default_reply(GOOD_REPLY),
            store.clone(),
        );
        let groups = vec![
            test_group_with_url(1, "https://github.com/team1/project"),
            test_group_with_url(2, "https://github.com/team2/missing"),
            test_group_with_url(3, "https://github.com/team3/project"),
        ];

        let summary = service.run(&groups, 2).await.unwrap();

        assert_eq!(summary.evaluated, 3);
        assert_eq!(summary.failed, vec![(GroupId(2), vec![FailureKind::NotFound])]);
        assert_eq!(store.records().len(), 3);
        assert!(store
            .records()
            .iter()
            .all(|r| r.run_id == summary.run_id));
    }

    #[tokio::test]
    async fn store_errors_abort_run() {
        let store = Arc::new(InMemoryEvaluationRepository::failing());
        let service = create_service(
            MockGitHubClient::new().with_python_project("team1", "project"),
            MockLlmClient::new().with_default_reply(GOOD_REPLY),
            store,
        );
        let groups = vec![test_group_with_url(1, "https://github.com/team1/project")];

        let result = service.run(&groups, 1).await;

        assert!(matches!(result, Err(AppError::Domain(_))));
    }
}
