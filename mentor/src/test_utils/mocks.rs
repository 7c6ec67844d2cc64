//! Mock implementations of port traits
//!
//! These are in-memory implementations that can be configured for testing.
//! They store data in memory and allow tests to verify behavior.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use crate::domain::entities::{EvaluationRecord, GroupId, RepoRef};
use crate::domain::ports::{
    CompletionRequest, EvaluationRepository, GitHubClient, GitHubCommit, GitHubContributor,
    GitHubPullRequest, GitHubRepo, GitHubTree, GitHubWorkflowRun, LlmClient, PER_PAGE,
};
use crate::error::{DomainError, GitHubError, LlmError};
use crate::test_utils::fixtures::{
    python_project_files, python_project_tree, test_commit_at, test_commits, test_contributors,
    test_pr_commits, test_pull_requests, test_untested_snapshot, test_workflow_run,
    PROJECT_README,
};

// ============================================================================
// Mock GitHub Client
// ============================================================================

type RepoKey = (String, String);

/// Everything the mock serves for one repository
#[derive(Clone)]
struct MockRepo {
    repo: GitHubRepo,
    commits: Vec<GitHubCommit>,
    pull_requests: Vec<GitHubPullRequest>,
    /// Commits by pull request number
    pr_commits: HashMap<i64, Vec<GitHubCommit>>,
    contributors: Vec<GitHubContributor>,
    tree: GitHubTree,
    files: HashMap<String, String>,
    readme: Option<String>,
    runs: Vec<GitHubWorkflowRun>,
}

impl MockRepo {
    fn python_project(owner: &str, name: &str) -> Self {
        let commits = test_commits();
        let runs = vec![test_workflow_run(&commits[0].sha)];
        Self {
            repo: GitHubRepo {
                full_name: format!("{}/{}", owner, name),
                default_branch: "main".to_string(),
                size_kb: 120,
                html_url: format!("https://github.com/{}/{}", owner, name),
            },
            commits,
            pull_requests: test_pull_requests(),
            pr_commits: HashMap::from([(1, test_pr_commits())]),
            contributors: test_contributors(),
            tree: python_project_tree(),
            files: python_project_files()
                .into_iter()
                .map(|f| (f.path, f.content))
                .collect(),
            readme: Some(PROJECT_README.to_string()),
            runs,
        }
    }
}

#[derive(Default)]
pub struct MockGitHubClient {
    repos: Arc<RwLock<HashMap<RepoKey, MockRepo>>>,
    /// Calls to `get_repository`, including rate-limited ones
    pub repository_calls: Arc<RwLock<u32>>,
    /// Remaining `get_repository` calls answered with a rate limit
    rate_limited_calls: Arc<RwLock<u32>>,
    unauthorized: Arc<RwLock<bool>>,
    failing_tree: Arc<RwLock<bool>>,
}

impl MockGitHubClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve the standard python project at owner/name
    pub fn with_python_project(self, owner: &str, name: &str) -> Self {
        self.repos.write().unwrap().insert(
            (owner.to_string(), name.to_string()),
            MockRepo::python_project(owner, name),
        );
        self
    }

    /// Serve the python project with its tests removed
    pub fn with_untested_project(self, owner: &str, name: &str) -> Self {
        let untested = test_untested_snapshot();
        let mut repo = MockRepo::python_project(owner, name);
        repo.tree.entries = untested.tree;
        repo.files = untested
            .files
            .into_iter()
            .map(|f| (f.path, f.content))
            .collect();
        self.repos
            .write()
            .unwrap()
            .insert((owner.to_string(), name.to_string()), repo);
        self
    }

    /// Replace a repository's history with `count` hourly commits
    pub fn with_commit_count(self, owner: &str, name: &str, count: usize) -> Self {
        {
            let mut repos = self.repos.write().unwrap();
            if let Some(repo) = repos.get_mut(&(owner.to_string(), name.to_string())) {
                let start = Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap();
                repo.commits = (0..count)
                    .rev()
                    .map(|i| test_commit_at(&format!("c{}", i), start + Duration::hours(i as i64)))
                    .collect();
            }
        }
        self
    }

    /// Answer the first `n` repository lookups with a rate limit
    pub fn with_rate_limited_calls(self, n: u32) -> Self {
        *self.rate_limited_calls.write().unwrap() = n;
        self
    }

    /// Reject every call as if the token were invalid
    pub fn with_unauthorized(self) -> Self {
        *self.unauthorized.write().unwrap() = true;
        self
    }

    /// Fail tree listings with a server error
    pub fn with_failing_tree(self) -> Self {
        *self.failing_tree.write().unwrap() = true;
        self
    }

    fn lookup(&self, repo: &RepoRef) -> Result<MockRepo, GitHubError> {
        if *self.unauthorized.read().unwrap() {
            return Err(GitHubError::Unauthorized);
        }
        self.repos
            .read()
            .unwrap()
            .get(&(repo.owner.clone(), repo.name.clone()))
            .cloned()
            .ok_or_else(|| GitHubError::RepoNotFound {
                owner: repo.owner.clone(),
                repo: repo.name.clone(),
            })
    }
}

fn page_of<T: Clone>(items: &[T], page: u32) -> Vec<T> {
    let per_page = PER_PAGE as usize;
    let start = (page.saturating_sub(1) as usize) * per_page;
    items.iter().skip(start).take(per_page).cloned().collect()
}

#[async_trait]
impl GitHubClient for MockGitHubClient {
    async fn get_repository(&self, repo: &RepoRef) -> Result<GitHubRepo, GitHubError> {
        *self.repository_calls.write().unwrap() += 1;
        {
            let mut remaining = self.rate_limited_calls.write().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(GitHubError::RateLimited { retry_after: None });
            }
        }
        Ok(self.lookup(repo)?.repo)
    }

    async fn list_commits(
        &self,
        repo: &RepoRef,
        _branch: &str,
        page: u32,
    ) -> Result<Vec<GitHubCommit>, GitHubError> {
        Ok(page_of(&self.lookup(repo)?.commits, page))
    }

    async fn list_pull_requests(
        &self,
        repo: &RepoRef,
        page: u32,
    ) -> Result<Vec<GitHubPullRequest>, GitHubError> {
        Ok(page_of(&self.lookup(repo)?.pull_requests, page))
    }

    async fn list_pr_commits(
        &self,
        repo: &RepoRef,
        number: i64,
        page: u32,
    ) -> Result<Vec<GitHubCommit>, GitHubError> {
        let repo = self.lookup(repo)?;
        Ok(repo
            .pr_commits
            .get(&number)
            .map(|commits| page_of(commits, page))
            .unwrap_or_default())
    }

    async fn list_contributors(
        &self,
        repo: &RepoRef,
    ) -> Result<Vec<GitHubContributor>, GitHubError> {
        Ok(self.lookup(repo)?.contributors)
    }

    async fn get_tree(&self, repo: &RepoRef, _branch: &str) -> Result<GitHubTree, GitHubError> {
        if *self.failing_tree.read().unwrap() {
            return Err(GitHubError::Api {
                status: 500,
                message: "Internal Server Error".to_string(),
            });
        }
        Ok(self.lookup(repo)?.tree)
    }

    async fn get_file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        _branch: &str,
    ) -> Result<Option<String>, GitHubError> {
        Ok(self.lookup(repo)?.files.get(path).cloned())
    }

    async fn get_readme(&self, repo: &RepoRef) -> Result<Option<String>, GitHubError> {
        Ok(self.lookup(repo)?.readme)
    }

    async fn list_workflow_runs(
        &self,
        repo: &RepoRef,
        _branch: &str,
    ) -> Result<Vec<GitHubWorkflowRun>, GitHubError> {
        Ok(self.lookup(repo)?.runs)
    }
}

// ============================================================================
// Mock LLM Client
// ============================================================================

/// Scripted LLM: queued replies first, then the default reply.
/// With neither left, calls fail like an unavailable endpoint.
#[derive(Default)]
pub struct MockLlmClient {
    replies: Arc<RwLock<VecDeque<String>>>,
    default_reply: Option<String>,
    requests: Arc<RwLock<Vec<CompletionRequest>>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with a 503
    pub fn failing() -> Self {
        Self::default()
    }

    /// Queue a reply
    pub fn with_reply(self, reply: &str) -> Self {
        self.replies.write().unwrap().push_back(reply.to_string());
        self
    }

    /// Reply used once the queue is empty
    pub fn with_default_reply(mut self, reply: &str) -> Self {
        self.default_reply = Some(reply.to_string());
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.read().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.requests.write().unwrap().push(request.clone());

        if let Some(reply) = self.replies.write().unwrap().pop_front() {
            return Ok(reply);
        }
        self.default_reply.clone().ok_or(LlmError::Api {
            status: 503,
            message: "Service Unavailable".to_string(),
        })
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

// ============================================================================
// In-Memory Evaluation Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryEvaluationRepository {
    records: Arc<RwLock<BTreeMap<GroupId, EvaluationRecord>>>,
    should_fail: bool,
}

impl InMemoryEvaluationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation fails with a database error
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Pre-populate with a record for testing
    pub fn with_record(self, record: EvaluationRecord) -> Self {
        self.records.write().unwrap().insert(record.group, record);
        self
    }

    /// Stored records, by group
    pub fn records(&self) -> Vec<EvaluationRecord> {
        self.records.read().unwrap().values().cloned().collect()
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.should_fail {
            Err(DomainError::Database("database is locked".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EvaluationRepository for InMemoryEvaluationRepository {
    async fn upsert(&self, record: &EvaluationRecord) -> Result<(), DomainError> {
        self.check()?;
        self.records
            .write()
            .unwrap()
            .insert(record.group, record.clone());
        Ok(())
    }

    async fn find_by_group(
        &self,
        group: GroupId,
    ) -> Result<Option<EvaluationRecord>, DomainError> {
        self.check()?;
        Ok(self.records.read().unwrap().get(&group).cloned())
    }

    async fn list_all(&self) -> Result<Vec<EvaluationRecord>, DomainError> {
        self.check()?;
        Ok(self.records())
    }
}
