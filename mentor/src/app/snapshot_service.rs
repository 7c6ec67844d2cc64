//! Snapshot service
//!
//! The repository fetcher: pulls everything the extractor and statistics
//! need from the GitHub API, with rate-limit backoff.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::app::extractor::select_files_to_fetch;
use crate::domain::entities::{CiStatus, FileContent, Group, RepoRef, RepositorySnapshot};
use crate::domain::ports::{GitHubClient, PER_PAGE};
use crate::error::GitHubError;

/// Backoff for rate-limited GitHub calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based).
    ///
    /// A server-suggested delay wins; otherwise exponential from the base.
    /// Both are capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32, suggested_secs: Option<u64>) -> Duration {
        let delay = match suggested_secs {
            Some(secs) => Duration::from_secs(secs),
            None => self.base_delay.saturating_mul(2u32.saturating_pow(attempt)),
        };
        delay.min(self.max_delay)
    }

    /// Run `op`, retrying only on rate limiting
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, GitHubError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GitHubError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Err(GitHubError::RateLimited { retry_after }) if attempt < self.max_retries => {
                    let delay = self.delay_for(attempt, retry_after);
                    tracing::warn!(
                        call = what,
                        attempt = attempt + 1,
                        delay_secs = delay.as_secs(),
                        "GitHub rate limit hit, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

/// Bounds on how much of a repository is fetched
#[derive(Debug, Clone)]
pub struct SnapshotLimits {
    /// Pages of commits, of pull requests and of each pull request's commits
    pub max_history_pages: u32,
    /// Merged pull requests whose commits are fetched
    pub max_merged_prs: usize,
    pub max_files: usize,
    pub max_file_bytes: u64,
}

impl Default for SnapshotLimits {
    fn default() -> Self {
        Self {
            max_history_pages: 10,
            max_merged_prs: 100,
            max_files: 40,
            max_file_bytes: 50_000,
        }
    }
}

/// Service for fetching repository snapshots
pub struct SnapshotService<G>
where
    G: GitHubClient,
{
    github: Arc<G>,
    retry: RetryPolicy,
    limits: SnapshotLimits,
}

impl<G> SnapshotService<G>
where
    G: GitHubClient,
{
    pub fn new(github: Arc<G>, retry: RetryPolicy, limits: SnapshotLimits) -> Self {
        Self {
            github,
            retry,
            limits,
        }
    }

    /// Fetch the snapshot of a group's repository.
    ///
    /// Either every required call succeeds or the first error is returned;
    /// absent optional resources (README, files, CI runs) are left empty.
    pub async fn fetch(&self, group: &Group) -> Result<RepositorySnapshot, GitHubError> {
        let repo = group.repo_ref()?;
        self.fetch_repo(group, &repo).await
    }

    async fn fetch_repo(
        &self,
        group: &Group,
        repo: &RepoRef,
    ) -> Result<RepositorySnapshot, GitHubError> {
        tracing::info!(group = %group.id, repo = %repo, "Fetching repository");
        let github = self.github.as_ref();

        let meta = self
            .retry
            .run("repository", || github.get_repository(repo))
            .await?;
        let branch = meta.default_branch.as_str();

        let mut commits = Vec::new();
        for page in 1..=self.limits.max_history_pages {
            let batch = self
                .retry
                .run("commits", || github.list_commits(repo, branch, page))
                .await?;
            let done = batch.len() < PER_PAGE as usize;
            commits.extend(batch);
            if done {
                break;
            }
        }

        let mut pull_requests = Vec::new();
        for page in 1..=self.limits.max_history_pages {
            let batch = self
                .retry
                .run("pull requests", || github.list_pull_requests(repo, page))
                .await?;
            let done = batch.len() < PER_PAGE as usize;
            pull_requests.extend(batch);
            if done {
                break;
            }
        }

        let merged: Vec<i64> = pull_requests
            .iter()
            .filter(|p| p.merged)
            .map(|p| p.number)
            .take(self.limits.max_merged_prs)
            .collect();
        let mut pr_commits = Vec::new();
        for number in merged {
            for page in 1..=self.limits.max_history_pages {
                let batch = self
                    .retry
                    .run("pull request commits", || {
                        github.list_pr_commits(repo, number, page)
                    })
                    .await?;
                let done = batch.len() < PER_PAGE as usize;
                pr_commits.extend(batch);
                if done {
                    break;
                }
            }
        }

        let contributors = self
            .retry
            .run("contributors", || github.list_contributors(repo))
            .await?;

        let tree = self
            .retry
            .run("tree", || github.get_tree(repo, branch))
            .await?;
        if tree.truncated {
            tracing::warn!(repo = %repo, "Tree listing truncated by GitHub");
        }

        let wanted = select_files_to_fetch(
            &tree.entries,
            self.limits.max_files,
            self.limits.max_file_bytes,
        );
        let mut files = Vec::with_capacity(wanted.len());
        for path in wanted {
            let content = self
                .retry
                .run("file content", || github.get_file_content(repo, &path, branch))
                .await?;
            match content {
                Some(content) => files.push(FileContent { path, content }),
                None => tracing::debug!(repo = %repo, path = %path, "Skipping non-text file"),
            }
        }

        let readme = self
            .retry
            .run("readme", || github.get_readme(repo))
            .await?;

        let runs = self
            .retry
            .run("workflow runs", || github.list_workflow_runs(repo, branch))
            .await?;
        let head_sha = commits.first().map(|c| c.sha.as_str());
        let ci_status = CiStatus::from_runs(&runs, head_sha);

        tracing::debug!(
            repo = %repo,
            commits = commits.len(),
            pull_requests = pull_requests.len(),
            pr_commits = pr_commits.len(),
            files = files.len(),
            %ci_status,
            "Snapshot complete"
        );

        Ok(RepositorySnapshot {
            group: group.id,
            repo: repo.clone(),
            default_branch: meta.default_branch.clone(),
            size_kb: meta.size_kb,
            commits,
            pull_requests,
            pr_commits,
            contributors,
            tree: tree.entries,
            tree_truncated: tree.truncated,
            files,
            readme,
            ci_status,
            fetched_at: Utc::now(),
        })
    }
}
