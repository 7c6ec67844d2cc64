//! Leaderboard service
//!
//! Ranks stored evaluation records for display.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::{Criterion, EvaluationRecord, FailureKind, GroupId};
use crate::domain::ports::EvaluationRepository;
use crate::error::AppError;

/// One ranked line of the leaderboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    /// 1-based position
    pub rank: usize,
    pub group: GroupId,
    pub repo_url: String,
    pub group_size: i32,
    pub overall_score: i32,
    pub confidence: i32,
    pub code_quality: i32,
    pub unit_testing: i32,
    pub ci_cd: i32,
    pub failures: Vec<FailureKind>,
    /// Commits per contributor, empty when the repository wasn't fetched
    pub contributions: Vec<u32>,
    /// Default-branch and merged pull request commits
    pub total_commits: Option<u32>,
    /// Commits on the default branch
    pub num_commits: Option<usize>,
    pub actions_passing: Option<bool>,
    pub evaluated_at: DateTime<Utc>,
}

impl LeaderboardRow {
    fn from_record(rank: usize, record: &EvaluationRecord) -> Self {
        let score = |c: Criterion| record.score_for(c).map(|s| s.score).unwrap_or_default();
        let stats = record.stats.as_ref();

        Self {
            rank,
            group: record.group,
            repo_url: record.repo_url.clone(),
            group_size: record.group_size,
            overall_score: record.overall_score,
            confidence: record.confidence,
            code_quality: score(Criterion::CodeQuality),
            unit_testing: score(Criterion::UnitTesting),
            ci_cd: score(Criterion::CiCd),
            failures: record.failures(),
            contributions: stats
                .map(|s| s.contributions_per_contributor.clone())
                .unwrap_or_default(),
            total_commits: stats.map(|s| s.total_commits),
            num_commits: stats.map(|s| s.num_commits),
            actions_passing: stats.and_then(|s| s.actions_passing),
            evaluated_at: record.evaluated_at,
        }
    }
}

/// Sort records by overall score descending, then group ascending, and rank them
pub fn rank(records: &[EvaluationRecord]) -> Vec<LeaderboardRow> {
    let mut sorted: Vec<&EvaluationRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        b.overall_score
            .cmp(&a.overall_score)
            .then_with(|| a.group.cmp(&b.group))
    });

    sorted
        .into_iter()
        .enumerate()
        .map(|(i, record)| LeaderboardRow::from_record(i + 1, record))
        .collect()
}

/// Service for reading the leaderboard
pub struct LeaderboardService<R>
where
    R: EvaluationRepository,
{
    store: Arc<R>,
}

impl<R> LeaderboardService<R>
where
    R: EvaluationRepository,
{
    pub fn new(store: Arc<R>) -> Self {
        Self { store }
    }

    /// All groups, ranked
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardRow>, AppError> {
        let records = self.store.list_all().await?;
        Ok(rank(&records))
    }

    /// Full record of one group
    pub async fn group_detail(&self, group: GroupId) -> Result<EvaluationRecord, AppError> {
        self.store
            .find_by_group(group)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No evaluation for group {}", group)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_record, test_stats, InMemoryEvaluationRepository};

    #[test]
    fn ranks_by_score_then_group() {
        let records = vec![
            test_record(4, [3, 3, 3]),
            test_record(2, [5, 5, 5]),
            test_record(9, [3, 3, 3]),
            test_record(1, [3, 3, 3]),
        ];

        let rows = rank(&records);

        let order: Vec<(usize, i32)> = rows.iter().map(|r| (r.rank, r.group.0)).collect();
        assert_eq!(order, vec![(1, 2), (2, 1), (3, 4), (4, 9)]);
    }

    #[test]
    fn ranking_ignores_input_order() {
        let mut records = vec![
            test_record(1, [2, 4, 1]),
            test_record(2, [4, 2, 5]),
            test_record(3, [4, 2, 5]),
            test_record(4, [1, 1, 1]),
        ];
        let forward = rank(&records);
        records.reverse();
        let backward = rank(&records);

        assert_eq!(forward, backward);
    }

    #[test]
    fn rows_carry_commit_counts() {
        let mut with_stats = test_record(1, [3, 3, 3]);
        with_stats.stats = Some(test_stats());
        let rows = rank(&[with_stats, test_record(2, [1, 1, 1])]);

        assert_eq!(rows[0].total_commits, Some(18));
        assert_eq!(rows[0].num_commits, Some(3));
        assert_eq!(rows[1].total_commits, None);
    }

    #[test]
    fn empty_store_gives_empty_board() {
        assert!(rank(&[]).is_empty());
    }

    #[tokio::test]
    async fn leaderboard_reads_store() {
        let store = Arc::new(
            InMemoryEvaluationRepository::new()
                .with_record(test_record(1, [2, 2, 2]))
                .with_record(test_record(2, [4, 4, 4])),
        );
        let service = LeaderboardService::new(store);

        let rows = service.leaderboard().await.unwrap();

        assert_eq!(rows[0].group, GroupId(2));
        assert_eq!(rows[0].code_quality, 4);
        assert_eq!(rows[1].rank, 2);
    }

    #[tokio::test]
    async fn group_detail_not_found() {
        let service = LeaderboardService::new(Arc::new(InMemoryEvaluationRepository::new()));

        let result = service.group_detail(GroupId(77)).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
