//! GitHub client port trait
//!
//! Defines the read-only interface the fetcher needs from the hosting API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::RepoRef;
use crate::error::GitHubError;

/// Page size used for paginated listings
pub const PER_PAGE: u32 = 100;

/// Repository metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRepo {
    pub full_name: String,
    pub default_branch: String,
    /// Size reported by GitHub, in kilobytes
    pub size_kb: u64,
    pub html_url: String,
}

/// Commit on a branch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubCommit {
    pub sha: String,
    pub message: String,
    /// GitHub account of the author, when linked
    pub author_login: Option<String>,
    /// Name from the git metadata
    pub author_name: Option<String>,
    pub committer_login: Option<String>,
    pub committer_name: Option<String>,
    pub date: DateTime<Utc>,
}

/// Pull request in any state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubPullRequest {
    pub number: i64,
    pub title: String,
    pub state: String, // "open", "closed"
    pub merged: bool,
    pub author_login: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Contributor with commit count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubContributor {
    pub login: String,
    pub contributions: u32,
}

/// Kind of tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeEntryKind {
    Blob,
    Tree,
    #[serde(other)]
    Other,
}

/// Entry in a recursive git tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubTreeEntry {
    pub path: String,
    pub kind: TreeEntryKind,
    /// Bytes, only present for blobs
    pub size: Option<u64>,
}

/// Recursive listing of a branch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitHubTree {
    pub entries: Vec<GitHubTreeEntry>,
    pub truncated: bool,
}

/// GitHub Actions workflow run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubWorkflowRun {
    pub name: Option<String>,
    pub head_sha: String,
    pub status: String,             // "queued", "in_progress", "completed"
    pub conclusion: Option<String>, // "success", "failure", ...
}

/// Port trait for GitHub API operations
#[async_trait]
pub trait GitHubClient: Send + Sync {
    /// Get repository metadata; fails with `RepoNotFound` on 404
    async fn get_repository(&self, repo: &RepoRef) -> Result<GitHubRepo, GitHubError>;

    /// List one page of commits on a branch, newest first
    async fn list_commits(
        &self,
        repo: &RepoRef,
        branch: &str,
        page: u32,
    ) -> Result<Vec<GitHubCommit>, GitHubError>;

    /// List one page of pull requests in all states
    async fn list_pull_requests(
        &self,
        repo: &RepoRef,
        page: u32,
    ) -> Result<Vec<GitHubPullRequest>, GitHubError>;

    /// List one page of the commits of a pull request
    async fn list_pr_commits(
        &self,
        repo: &RepoRef,
        number: i64,
        page: u32,
    ) -> Result<Vec<GitHubCommit>, GitHubError>;

    /// List contributors with their commit counts
    async fn list_contributors(&self, repo: &RepoRef)
        -> Result<Vec<GitHubContributor>, GitHubError>;

    /// Recursive tree of a branch
    async fn get_tree(&self, repo: &RepoRef, branch: &str) -> Result<GitHubTree, GitHubError>;

    /// Decoded file content, `None` if the file doesn't exist or isn't text
    async fn get_file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        branch: &str,
    ) -> Result<Option<String>, GitHubError>;

    /// Decoded README, `None` if the repository has none
    async fn get_readme(&self, repo: &RepoRef) -> Result<Option<String>, GitHubError>;

    /// Recent push-triggered workflow runs on a branch
    async fn list_workflow_runs(
        &self,
        repo: &RepoRef,
        branch: &str,
    ) -> Result<Vec<GitHubWorkflowRun>, GitHubError>;
}
