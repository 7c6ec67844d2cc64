//! Evaluation record domain entity
//!
//! The persisted result of evaluating one group.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{
    Criterion, CriterionScore, FailureKind, Group, GroupId, RepoStats, CONFIDENCE_MIN, SCORE_MAX,
    SCORE_MIN,
};

/// Lowest overall score
pub const OVERALL_MIN: i32 = 1;

/// Highest overall score
pub const OVERALL_MAX: i32 = 10;

/// Identifier of one scrape run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// All criterion scores for a group plus derived aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub group: GroupId,
    pub repo_url: String,
    pub group_size: i32,
    pub run_id: RunId,
    /// One entry per criterion, in `Criterion::ALL` order
    pub scores: Vec<CriterionScore>,
    pub overall_score: i32,
    pub confidence: i32,
    pub summary: String,
    pub stats: Option<RepoStats>,
    pub evaluated_at: DateTime<Utc>,
}

impl EvaluationRecord {
    /// Build a record from criterion scores.
    ///
    /// Criteria missing from `scores` get the lowest score with an internal
    /// note so the record always covers every criterion.
    pub fn from_scores(
        group: &Group,
        run_id: RunId,
        scores: Vec<CriterionScore>,
        stats: Option<RepoStats>,
    ) -> Self {
        let scores: Vec<CriterionScore> = Criterion::ALL
            .iter()
            .map(|criterion| {
                scores
                    .iter()
                    .find(|s| s.criterion == *criterion)
                    .cloned()
                    .unwrap_or_else(|| {
                        CriterionScore::lowest(
                            *criterion,
                            FailureKind::Endpoint,
                            format!("{} was not evaluated", criterion.label()),
                        )
                    })
            })
            .collect();

        Self {
            group: group.id,
            repo_url: group.repo_url.clone(),
            group_size: group.group_size() as i32,
            run_id,
            overall_score: overall_score(&scores),
            confidence: mean_confidence(&scores),
            summary: combined_summary(&scores),
            scores,
            stats,
            evaluated_at: Utc::now(),
        }
    }

    /// Record where every criterion failed for the same reason
    pub fn failed(group: &Group, run_id: RunId, failure: FailureKind, note: &str) -> Self {
        let scores = Criterion::ALL
            .iter()
            .map(|c| CriterionScore::lowest(*c, failure, note))
            .collect();
        Self::from_scores(group, run_id, scores, None)
    }

    /// Score for one criterion
    pub fn score_for(&self, criterion: Criterion) -> Option<&CriterionScore> {
        self.scores.iter().find(|s| s.criterion == criterion)
    }

    /// Failure kinds present in this record
    pub fn failures(&self) -> Vec<FailureKind> {
        let mut kinds: Vec<FailureKind> = Vec::new();
        for kind in self.scores.iter().filter_map(|s| s.failure) {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        kinds
    }
}

/// Weighted mean of criterion scores mapped onto `OVERALL_MIN..=OVERALL_MAX`
///
/// The mapping is linear, so all lowest scores give 1 and all highest give 10.
/// The older dashboard used `round((2a + 2b + 1.5c) / 1.1)` clamped to 1..=10
/// instead, which saturates at 10 as soon as every criterion scores 3 or more.
/// Stored overall scores from that formula are not comparable with these.
pub fn overall_score(scores: &[CriterionScore]) -> i32 {
    let total_weight: f64 = scores.iter().map(|s| s.criterion.weight()).sum();
    if total_weight == 0.0 {
        return OVERALL_MIN;
    }

    let weighted: f64 = scores
        .iter()
        .map(|s| s.score as f64 * s.criterion.weight())
        .sum::<f64>()
        / total_weight;

    let span = (SCORE_MAX - SCORE_MIN) as f64;
    let scaled = OVERALL_MIN as f64
        + (weighted - SCORE_MIN as f64) / span * (OVERALL_MAX - OVERALL_MIN) as f64;

    (scaled.round() as i32).clamp(OVERALL_MIN, OVERALL_MAX)
}

/// Rounded mean confidence
pub fn mean_confidence(scores: &[CriterionScore]) -> i32 {
    if scores.is_empty() {
        return CONFIDENCE_MIN;
    }
    let total: i32 = scores.iter().map(|s| s.confidence).sum();
    (total as f64 / scores.len() as f64).round() as i32
}

/// Per-criterion justifications joined into one summary
pub fn combined_summary(scores: &[CriterionScore]) -> String {
    scores
        .iter()
        .map(|s| format!("{}: {}", s.criterion.label(), s.justification))
        .collect::<Vec<_>>()
        .join("\n\n")
}
