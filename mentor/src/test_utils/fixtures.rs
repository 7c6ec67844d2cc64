//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::domain::entities::{
    CiStatus, Criterion, CriterionScore, EvaluationRecord, FileContent, FileRole, Group, GroupId,
    RepoRef, RepoStats, RepositorySnapshot, RunId,
};
use crate::domain::ports::{
    GitHubCommit, GitHubContributor, GitHubPullRequest, GitHubTree, GitHubTreeEntry,
    GitHubWorkflowRun, TreeEntryKind,
};

pub const PROJECT_README: &str = "# Project\n\nPredicts house prices with a small MLP.\n\n\
## Setup\n\n```\npip install -r requirements.txt\n```\n";

/// Create a test group with three students
pub fn test_group(number: i32) -> Group {
    test_group_with_url(number, &format!("https://github.com/group-{}/project", number))
}

/// Create a test group pointing at a specific URL
pub fn test_group_with_url(number: i32, url: &str) -> Group {
    Group {
        id: GroupId(number),
        students: vec![
            format!("s{}01", number),
            format!("s{}02", number),
            format!("s{}03", number),
        ],
        repo_url: url.to_string(),
    }
}

/// Create a commit at a given time
pub fn test_commit_at(sha: &str, date: DateTime<Utc>) -> GitHubCommit {
    GitHubCommit {
        sha: sha.to_string(),
        message: format!("Commit {}", sha),
        author_login: Some("alice".to_string()),
        author_name: Some("Alice".to_string()),
        committer_login: None,
        committer_name: None,
        date,
    }
}

/// Create a blob tree entry
pub fn test_tree_entry(path: &str, size: u64) -> GitHubTreeEntry {
    GitHubTreeEntry {
        path: path.to_string(),
        kind: TreeEntryKind::Blob,
        size: Some(size),
    }
}

/// Newest-first commits, the shape the API returns
pub fn test_commits() -> Vec<GitHubCommit> {
    let start = Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap();
    vec![
        test_commit_at("c3", start + Duration::days(4)),
        test_commit_at("c2", start + Duration::days(1)),
        test_commit_at("c1", start),
    ]
}

/// Commits of the merged pull request, one by each contributor
pub fn test_pr_commits() -> Vec<GitHubCommit> {
    let start = Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap();
    let mut by_bob = test_commit_at("pr1-b", start + Duration::days(3));
    by_bob.author_login = Some("bob".to_string());
    by_bob.author_name = Some("Bob".to_string());
    vec![test_commit_at("pr1-a", start + Duration::days(2)), by_bob]
}

/// One merged and one open pull request
pub fn test_pull_requests() -> Vec<GitHubPullRequest> {
    let created = Utc.with_ymd_and_hms(2025, 1, 7, 12, 0, 0).unwrap();
    vec![
        GitHubPullRequest {
            number: 1,
            title: "Add data pipeline".to_string(),
            state: "closed".to_string(),
            merged: true,
            author_login: Some("alice".to_string()),
            created_at: created,
        },
        GitHubPullRequest {
            number: 2,
            title: "WIP: training loop".to_string(),
            state: "open".to_string(),
            merged: false,
            author_login: Some("bob".to_string()),
            created_at: created + Duration::days(1),
        },
    ]
}

pub fn test_contributors() -> Vec<GitHubContributor> {
    vec![
        GitHubContributor {
            login: "alice".to_string(),
            contributions: 12,
        },
        GitHubContributor {
            login: "bob".to_string(),
            contributions: 4,
        },
    ]
}

/// File contents of a small cookiecutter-style MLOps project
pub fn python_project_files() -> Vec<FileContent> {
    let file = |path: &str, content: &str| FileContent {
        path: path.to_string(),
        content: content.to_string(),
    };
    vec![
        file(
            "src/project/model.py",
            "import torch\n\n\nclass Model(torch.nn.Module):\n    \"\"\"Two layer MLP.\"\"\"\n\n    def __init__(self, hidden: int = 32) -> None:\n        super().__init__()\n        self.net = torch.nn.Sequential(torch.nn.Linear(8, hidden), torch.nn.ReLU(), torch.nn.Linear(hidden, 1))\n\n    def forward(self, x: torch.Tensor) -> torch.Tensor:\n        return self.net(x)\n",
        ),
        file(
            "src/project/train.py",
            "from project.model import Model\n\n\ndef train(epochs: int = 10) -> Model:\n    model = Model()\n    return model\n",
        ),
        file(
            "tests/test_model.py",
            "import torch\n\nfrom project.model import Model\n\n\ndef test_output_shape():\n    assert Model()(torch.zeros(4, 8)).shape == (4, 1)\n",
        ),
        file(
            ".github/workflows/tests.yaml",
            "name: tests\non: [push]\njobs:\n  test:\n    runs-on: ubuntu-latest\n    steps:\n      - uses: actions/checkout@v4\n      - run: pip install -r requirements.txt\n      - run: pytest\n",
        ),
        file(
            "Dockerfile",
            "FROM python:3.11-slim\nCOPY . /app\nRUN pip install -r /app/requirements.txt\n",
        ),
    ]
}

/// Tree matching `python_project_files` plus non-code files
pub fn python_project_tree() -> GitHubTree {
    let mut entries: Vec<GitHubTreeEntry> = python_project_files()
        .iter()
        .map(|f| test_tree_entry(&f.path, f.content.len() as u64))
        .collect();
    entries.push(test_tree_entry("README.md", PROJECT_README.len() as u64));
    entries.push(test_tree_entry("requirements.txt", 40));
    entries.push(test_tree_entry("data.dvc", 90));
    entries.push(test_tree_entry("notebooks/eda.ipynb", 2_000));
    entries.push(GitHubTreeEntry {
        path: "src/project".to_string(),
        kind: TreeEntryKind::Tree,
        size: None,
    });

    GitHubTree {
        entries,
        truncated: false,
    }
}

/// A successful push run on `head_sha`
pub fn test_workflow_run(head_sha: &str) -> GitHubWorkflowRun {
    GitHubWorkflowRun {
        name: Some("tests".to_string()),
        head_sha: head_sha.to_string(),
        status: "completed".to_string(),
        conclusion: Some("success".to_string()),
    }
}

/// Snapshot of the standard python project
pub fn test_snapshot() -> RepositorySnapshot {
    let commits = test_commits();
    let tree = python_project_tree();

    RepositorySnapshot {
        group: GroupId(1),
        repo: RepoRef {
            owner: "team1".to_string(),
            name: "project".to_string(),
        },
        default_branch: "main".to_string(),
        size_kb: 120,
        commits,
        pull_requests: test_pull_requests(),
        pr_commits: test_pr_commits(),
        contributors: test_contributors(),
        tree: tree.entries,
        tree_truncated: false,
        files: python_project_files(),
        readme: Some(PROJECT_README.to_string()),
        ci_status: CiStatus::Passing,
        fetched_at: Utc::now(),
    }
}

/// Snapshot of a project without any test files
pub fn test_untested_snapshot() -> RepositorySnapshot {
    let mut snapshot = test_snapshot();
    snapshot
        .tree
        .retain(|e| FileRole::classify(&e.path) != FileRole::Test);
    snapshot
        .files
        .retain(|f| FileRole::classify(&f.path) != FileRole::Test);
    snapshot
}

/// Statistics of the standard python project
pub fn test_stats() -> RepoStats {
    RepoStats::from_snapshot(&test_snapshot())
}

/// Record with evaluated scores for code quality, unit testing and CI/CD
pub fn test_record(number: i32, scores: [i32; 3]) -> EvaluationRecord {
    let [code_quality, unit_testing, ci_cd] = scores;
    let scores = vec![
        CriterionScore::evaluated(
            Criterion::CodeQuality,
            code_quality,
            7,
            format!("Code quality scored {}", code_quality),
        ),
        CriterionScore::evaluated(
            Criterion::UnitTesting,
            unit_testing,
            6,
            format!("Unit testing scored {}", unit_testing),
        ),
        CriterionScore::evaluated(
            Criterion::CiCd,
            ci_cd,
            8,
            format!("CI/CD scored {}", ci_cd),
        ),
    ];
    EvaluationRecord::from_scores(&test_group(number), RunId::new(), scores, None)
}
