//! Repository snapshot domain entity
//!
//! The state of a group's repository at evaluation time, plus the statistics
//! derived from it. Snapshots live for one run only.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{GroupId, RepoRef};
use crate::domain::ports::{
    GitHubCommit, GitHubContributor, GitHubPullRequest, GitHubTreeEntry, GitHubWorkflowRun,
    TreeEntryKind,
};

/// What part of a project a file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileRole {
    /// Python source outside tests and data folders
    Source,
    /// Python test modules
    Test,
    /// Workflows, Dockerfiles, compose and cloudbuild configs
    Ci,
    Other,
}

impl FileRole {
    /// Classify a repository path
    pub fn classify(path: &str) -> Self {
        let lower = path.to_lowercase();
        let file_name = lower.rsplit('/').next().unwrap_or(&lower);
        let dirs: Vec<&str> = lower.split('/').collect();
        let dirs = &dirs[..dirs.len().saturating_sub(1)];

        let is_workflow = lower.starts_with(".github/workflows/")
            && (file_name.ends_with(".yml") || file_name.ends_with(".yaml"));
        let is_docker = file_name.starts_with("dockerfile")
            || file_name.ends_with(".dockerfile")
            || file_name == ".dockerignore"
            || (file_name.starts_with("docker-compose")
                && (file_name.ends_with(".yml") || file_name.ends_with(".yaml")));
        if is_workflow || is_docker || file_name == "cloudbuild.yaml" {
            return FileRole::Ci;
        }

        if !file_name.ends_with(".py") {
            return FileRole::Other;
        }

        let excluded = dirs
            .iter()
            .any(|d| matches!(*d, "data" | "reports" | ".github" | "__pycache__"));
        if excluded {
            return FileRole::Other;
        }

        let in_tests_dir = dirs.iter().any(|d| *d == "tests" || *d == "test");
        let stem = file_name.trim_end_matches(".py");
        let test_word = stem.split('_').any(|w| w == "test" || w == "tests");
        if in_tests_dir || test_word {
            return FileRole::Test;
        }

        FileRole::Source
    }
}

/// Content of a downloaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    pub path: String,
    pub content: String,
}

/// Outcome of CI runs on the head commit of the default branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CiStatus {
    Passing,
    Failing,
    Pending,
    NoRuns,
}

impl CiStatus {
    /// Summarise the workflow runs that targeted `head_sha`
    pub fn from_runs(runs: &[GitHubWorkflowRun], head_sha: Option<&str>) -> Self {
        let Some(head_sha) = head_sha else {
            return CiStatus::NoRuns;
        };
        let head_runs: Vec<&GitHubWorkflowRun> =
            runs.iter().filter(|r| r.head_sha == head_sha).collect();

        if head_runs.is_empty() {
            CiStatus::NoRuns
        } else if head_runs.iter().any(|r| r.status != "completed") {
            CiStatus::Pending
        } else if head_runs
            .iter()
            .all(|r| r.conclusion.as_deref() == Some("success"))
        {
            CiStatus::Passing
        } else {
            CiStatus::Failing
        }
    }
}

impl std::fmt::Display for CiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CiStatus::Passing => write!(f, "passing"),
            CiStatus::Failing => write!(f, "failing"),
            CiStatus::Pending => write!(f, "pending"),
            CiStatus::NoRuns => write!(f, "no runs"),
        }
    }
}

/// Fetched state of a repository
#[derive(Debug, Clone)]
pub struct RepositorySnapshot {
    pub group: GroupId,
    pub repo: RepoRef,
    pub default_branch: String,
    pub size_kb: u64,
    /// Newest first, as returned by the API
    pub commits: Vec<GitHubCommit>,
    pub pull_requests: Vec<GitHubPullRequest>,
    /// Commits of merged pull requests, in pull request order
    pub pr_commits: Vec<GitHubCommit>,
    pub contributors: Vec<GitHubContributor>,
    pub tree: Vec<GitHubTreeEntry>,
    /// The API stopped listing the tree early
    pub tree_truncated: bool,
    /// Contents of the files relevant to the rubric
    pub files: Vec<FileContent>,
    pub readme: Option<String>,
    pub ci_status: CiStatus,
    pub fetched_at: DateTime<Utc>,
}

impl RepositorySnapshot {
    /// Paths of blobs in the tree
    pub fn blob_paths(&self) -> impl Iterator<Item = &str> {
        self.tree
            .iter()
            .filter(|e| e.kind == TreeEntryKind::Blob)
            .map(|e| e.path.as_str())
    }
}

/// Activity matrix window bounds, in weeks from the first commit
pub const ACTIVITY_MIN_WEEKS: i64 = 1;
pub const ACTIVITY_MAX_WEEKS: i64 = 3;

/// Statistics derived from a snapshot, kept for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoStats {
    pub num_contributors: usize,
    /// Default-branch contributions plus credited pull request commits
    pub contributions_per_contributor: Vec<u32>,
    /// Sum of `contributions_per_contributor`
    #[serde(default)]
    pub total_commits: u32,
    pub num_prs: usize,
    pub num_merged_prs: usize,
    /// Commits on the default branch
    pub num_commits: usize,
    #[serde(default)]
    pub average_commit_length_to_main: f64,
    /// Over default-branch and merged pull request commits
    pub average_commit_length: f64,
    pub latest_commit: Option<DateTime<Utc>>,
    /// Commits per (day since first commit, hour of day), pull request commits included
    pub activity_matrix: Vec<Vec<u32>>,
    pub num_docker_files: usize,
    pub num_python_files: usize,
    pub num_workflow_files: usize,
    pub has_requirements_file: bool,
    pub has_cloudbuild: bool,
    pub using_dvc: bool,
    pub repo_size_mb: f64,
    pub readme_words: usize,
    /// None when CI never ran on the head commit
    pub actions_passing: Option<bool>,
}

impl RepoStats {
    pub fn from_snapshot(snapshot: &RepositorySnapshot) -> Self {
        let paths: Vec<&str> = snapshot.blob_paths().collect();
        let file_name = |p: &str| p.rsplit('/').next().unwrap_or(p).to_string();

        let all_commits: Vec<GitHubCommit> = snapshot
            .commits
            .iter()
            .chain(&snapshot.pr_commits)
            .cloned()
            .collect();
        let contributions = credit_pr_commits(&snapshot.contributors, &snapshot.pr_commits);

        let total_bytes: u64 = snapshot.tree.iter().filter_map(|e| e.size).sum();

        Self {
            num_contributors: snapshot.contributors.len(),
            total_commits: contributions.iter().sum(),
            contributions_per_contributor: contributions,
            num_prs: snapshot.pull_requests.len(),
            num_merged_prs: snapshot.pull_requests.iter().filter(|p| p.merged).count(),
            num_commits: snapshot.commits.len(),
            average_commit_length_to_main: average_message_length(&snapshot.commits),
            average_commit_length: average_message_length(&all_commits),
            latest_commit: snapshot.commits.iter().map(|c| c.date).max(),
            activity_matrix: activity_matrix(&all_commits, ACTIVITY_MIN_WEEKS, ACTIVITY_MAX_WEEKS),
            num_docker_files: paths
                .iter()
                .filter(|p| {
                    let name = file_name(p);
                    name.contains("Dockerfile") || name.ends_with(".dockerfile")
                })
                .count(),
            num_python_files: paths.iter().filter(|p| p.ends_with(".py")).count(),
            num_workflow_files: paths
                .iter()
                .filter(|p| {
                    p.starts_with(".github/workflows/")
                        && (p.ends_with(".yml") || p.ends_with(".yaml"))
                })
                .count(),
            has_requirements_file: paths.iter().any(|p| p.contains("requirements.txt")),
            has_cloudbuild: paths.iter().any(|p| file_name(p) == "cloudbuild.yaml"),
            using_dvc: paths.iter().any(|p| p.contains(".dvc")),
            repo_size_mb: total_bytes as f64 / (1024.0 * 1024.0),
            readme_words: snapshot.readme.as_deref().map(count_words).unwrap_or(0),
            actions_passing: match snapshot.ci_status {
                CiStatus::NoRuns => None,
                status => Some(status == CiStatus::Passing),
            },
        }
    }
}

/// Mean commit message length in characters
pub fn average_message_length(commits: &[GitHubCommit]) -> f64 {
    if commits.is_empty() {
        return 0.0;
    }
    let total: usize = commits.iter().map(|c| c.message.chars().count()).sum();
    total as f64 / commits.len() as f64
}

/// Contributions per contributor after crediting pull request commits.
///
/// Each commit goes to the first contributor whose login matches the
/// author or committer account, or their git name ignoring case.
pub fn credit_pr_commits(
    contributors: &[GitHubContributor],
    pr_commits: &[GitHubCommit],
) -> Vec<u32> {
    let mut totals: Vec<u32> = contributors.iter().map(|c| c.contributions).collect();

    for commit in pr_commits {
        let credited = contributors.iter().position(|c| {
            let login = c.login.as_str();
            let same_name = |name: &Option<String>| {
                name.as_deref()
                    .is_some_and(|n| n.to_lowercase() == login.to_lowercase())
            };
            commit.author_login.as_deref() == Some(login)
                || same_name(&commit.author_name)
                || commit.committer_login.as_deref() == Some(login)
                || same_name(&commit.committer_name)
        });
        if let Some(index) = credited {
            totals[index] += 1;
        }
    }

    totals
}

/// Count words in markdown, ignoring tokens made only of markup
pub fn count_words(text: &str) -> usize {
    text.split_whitespace()
        .filter(|token| token.chars().any(|c| c.is_alphanumeric()))
        .count()
}

/// Bucket commits into a days x 24 matrix starting at the first commit.
///
/// The window spans at least `min_weeks` and at most `max_weeks`; commits
/// after the window are ignored.
pub fn activity_matrix(commits: &[GitHubCommit], min_weeks: i64, max_weeks: i64) -> Vec<Vec<u32>> {
    let mut times: Vec<DateTime<Utc>> = commits.iter().map(|c| c.date).collect();
    times.sort();

    let (Some(&start), Some(&latest)) = (times.first(), times.last()) else {
        return Vec::new();
    };

    let end = std::cmp::max(
        start + Duration::weeks(min_weeks),
        std::cmp::min(start + Duration::weeks(max_weeks), latest),
    );
    let num_days = (end - start).num_days() as usize + 1;

    let mut matrix = vec![vec![0u32; 24]; num_days];
    for time in times.iter().filter(|t| **t <= end) {
        let day = (*time - start).num_days() as usize;
        if let Some(row) = matrix.get_mut(day) {
            row[time.hour() as usize] += 1;
        }
    }

    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_commit_at, test_snapshot};
    use chrono::TimeZone;

    #[test]
    fn classify_ci_files() {
        assert_eq!(FileRole::classify(".github/workflows/tests.yaml"), FileRole::Ci);
        assert_eq!(FileRole::classify("dockerfiles/train.dockerfile"), FileRole::Ci);
        assert_eq!(FileRole::classify("Dockerfile"), FileRole::Ci);
        assert_eq!(FileRole::classify("docker-compose.dev.yml"), FileRole::Ci);
        assert_eq!(FileRole::classify("cloudbuild.yaml"), FileRole::Ci);
    }

    #[test]
    fn classify_tests_and_sources() {
        assert_eq!(FileRole::classify("tests/test_model.py"), FileRole::Test);
        assert_eq!(FileRole::classify("src/pkg/data_test.py"), FileRole::Test);
        assert_eq!(FileRole::classify("tests/conftest.py"), FileRole::Test);
        assert_eq!(FileRole::classify("src/pkg/model.py"), FileRole::Source);
        assert_eq!(FileRole::classify("src/pkg/model_test_utils.py"), FileRole::Test);
        assert_eq!(FileRole::classify("src/pkg/latest.py"), FileRole::Source);
        assert_eq!(FileRole::classify("src/pkg/attestation.py"), FileRole::Source);
        assert_eq!(FileRole::classify("src/pkg/testing.py"), FileRole::Source);
        assert_eq!(FileRole::classify("data/make_dataset.py"), FileRole::Other);
        assert_eq!(FileRole::classify("notebooks/eda.ipynb"), FileRole::Other);
        assert_eq!(FileRole::classify("README.md"), FileRole::Other);
    }

    #[test]
    fn ci_status_from_runs() {
        let run = |sha: &str, status: &str, conclusion: Option<&str>| GitHubWorkflowRun {
            name: Some("tests".into()),
            head_sha: sha.into(),
            status: status.into(),
            conclusion: conclusion.map(String::from),
        };

        let runs = vec![
            run("head", "completed", Some("success")),
            run("old", "completed", Some("failure")),
        ];
        assert_eq!(CiStatus::from_runs(&runs, Some("head")), CiStatus::Passing);

        let runs = vec![
            run("head", "completed", Some("success")),
            run("head", "completed", Some("failure")),
        ];
        assert_eq!(CiStatus::from_runs(&runs, Some("head")), CiStatus::Failing);

        let runs = vec![run("head", "in_progress", None)];
        assert_eq!(CiStatus::from_runs(&runs, Some("head")), CiStatus::Pending);

        assert_eq!(CiStatus::from_runs(&runs, Some("other")), CiStatus::NoRuns);
        assert_eq!(CiStatus::from_runs(&runs, None), CiStatus::NoRuns);
    }

    #[test]
    fn activity_matrix_spans_at_least_one_week() {
        let start = Utc.with_ymd_and_hms(2025, 1, 6, 9, 15, 0).unwrap();
        let commits = vec![
            test_commit_at("a", start),
            test_commit_at("b", start + Duration::hours(1)),
            test_commit_at("c", start + Duration::days(2)),
        ];

        let matrix = activity_matrix(&commits, 1, 3);

        assert_eq!(matrix.len(), 8);
        assert!(matrix.iter().all(|row| row.len() == 24));
        assert_eq!(matrix[0][9], 1);
        assert_eq!(matrix[0][10], 1);
        assert_eq!(matrix[2][9], 1);
    }

    #[test]
    fn activity_matrix_caps_window() {
        let start = Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap();
        let commits = vec![
            test_commit_at("a", start),
            test_commit_at("late", start + Duration::weeks(10)),
        ];

        let matrix = activity_matrix(&commits, 1, 3);

        assert_eq!(matrix.len(), 22);
        let total: u32 = matrix.iter().flatten().sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn activity_matrix_empty_history() {
        assert!(activity_matrix(&[], 1, 3).is_empty());
    }

    #[test]
    fn stats_from_snapshot() {
        let snapshot = test_snapshot();
        let stats = RepoStats::from_snapshot(&snapshot);

        assert_eq!(stats.num_contributors, 2);
        // one merged PR commit each for alice and bob
        assert_eq!(stats.contributions_per_contributor, vec![13, 5]);
        assert_eq!(stats.total_commits, 18);
        assert_eq!(stats.num_prs, 2);
        assert_eq!(stats.num_merged_prs, 1);
        assert_eq!(stats.num_commits, 3);
        let total: u32 = stats.activity_matrix.iter().flatten().sum();
        assert_eq!(total, 5);
        assert_eq!(stats.num_workflow_files, 1);
        assert_eq!(stats.num_docker_files, 1);
        assert!(stats.has_requirements_file);
        assert!(!stats.has_cloudbuild);
        assert!(stats.using_dvc);
        assert_eq!(stats.actions_passing, Some(true));
        assert!(stats.readme_words > 0);
        assert!(stats.latest_commit.is_some());
    }

    #[test]
    fn average_lengths_split_main_and_all() {
        let mut snapshot = test_snapshot();
        for commit in snapshot.commits.iter_mut() {
            commit.message = "abcd".into();
        }
        for commit in snapshot.pr_commits.iter_mut() {
            commit.message = "abcdefghij".into();
        }

        let stats = RepoStats::from_snapshot(&snapshot);

        assert_eq!(stats.average_commit_length_to_main, 4.0);
        // (3 * 4 + 2 * 10) / 5
        assert_eq!(stats.average_commit_length, 6.4);
    }

    #[test]
    fn pr_commits_credit_first_matching_contributor() {
        let contributors = vec![
            GitHubContributor {
                login: "alice".into(),
                contributions: 3,
            },
            GitHubContributor {
                login: "Bob".into(),
                contributions: 1,
            },
        ];
        let at = Utc.with_ymd_and_hms(2025, 1, 8, 12, 0, 0).unwrap();
        let mut by_name = test_commit_at("p1", at);
        by_name.author_login = None;
        by_name.author_name = Some("BOB".into());
        let mut by_committer = test_commit_at("p2", at);
        by_committer.author_login = None;
        by_committer.author_name = None;
        by_committer.committer_login = Some("alice".into());
        let mut stranger = test_commit_at("p3", at);
        stranger.author_login = Some("mallory".into());
        stranger.author_name = Some("Mallory".into());

        let totals = credit_pr_commits(&contributors, &[by_name, by_committer, stranger]);

        assert_eq!(totals, vec![4, 2]);
    }

    #[test]
    fn count_words_skips_markup() {
        assert_eq!(count_words("# Title\n\n- item one\n---\n"), 3);
    }
}
