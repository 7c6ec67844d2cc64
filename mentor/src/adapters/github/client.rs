//! GitHub API client implementation

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use urlencoding::encode;

use crate::domain::entities::RepoRef;
use crate::domain::ports::{
    GitHubClient, GitHubCommit, GitHubContributor, GitHubPullRequest, GitHubRepo, GitHubTree,
    GitHubTreeEntry, GitHubWorkflowRun, TreeEntryKind, PER_PAGE,
};
use crate::error::GitHubError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("mentor/", env!("CARGO_PKG_VERSION"));

/// Implementation of the GitHub API client
pub struct GitHubClientImpl {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubClientImpl {
    pub fn new(
        base_url: String,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GitHubError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn repo_url(&self, repo: &RepoRef, path: &str) -> String {
        self.api_url(&format!(
            "/repos/{}/{}{}",
            encode(&repo.owner),
            encode(&repo.name),
            path
        ))
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let request = self
            .http
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");

        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Send a request and map error statuses; 404 is returned as `None`
    async fn send(&self, request: RequestBuilder) -> Result<Option<reqwest::Response>, GitHubError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(Some(response))
        } else if status == StatusCode::NOT_FOUND {
            Ok(None)
        } else if status == StatusCode::UNAUTHORIZED {
            Err(GitHubError::Unauthorized)
        } else if is_rate_limited(status, response.headers()) {
            Err(GitHubError::RateLimited {
                retry_after: rate_limit_delay(response.headers(), Utc::now().timestamp()),
            })
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(GitHubError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, GitHubError> {
        response
            .json()
            .await
            .map_err(|e| GitHubError::Deserialization(e.to_string()))
    }

    /// GET a resource that must exist
    async fn get_required<T: for<'de> Deserialize<'de>>(
        &self,
        repo: &RepoRef,
        url: &str,
    ) -> Result<T, GitHubError> {
        match self.send(self.get(url)).await? {
            Some(response) => self.handle_response(response).await,
            None => Err(GitHubError::RepoNotFound {
                owner: repo.owner.clone(),
                repo: repo.name.clone(),
            }),
        }
    }

    /// GET a resource that may be absent
    async fn get_optional<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
    ) -> Result<Option<T>, GitHubError> {
        match self.send(self.get(url)).await? {
            Some(response) if response.status() == StatusCode::NO_CONTENT => Ok(None),
            Some(response) => self.handle_response(response).await.map(Some),
            None => Ok(None),
        }
    }
}

/// 429, or 403 once the quota is spent or a secondary limit tripped
fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }
    status == StatusCode::FORBIDDEN
        && (header_value(headers, "x-ratelimit-remaining") == Some(0)
            || headers.contains_key("retry-after"))
}

/// Seconds to wait, from `retry-after` or the `x-ratelimit-reset` epoch
fn rate_limit_delay(headers: &HeaderMap, now: i64) -> Option<u64> {
    if let Some(seconds) = header_value(headers, "retry-after") {
        return Some(seconds);
    }
    header_value(headers, "x-ratelimit-reset").map(|reset| (reset as i64 - now).max(0) as u64)
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Decode a contents API payload; `None` for binary or unknown encodings
fn decode_content(content: &str, encoding: Option<&str>) -> Option<String> {
    match encoding {
        Some("base64") => {
            let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = STANDARD.decode(compact).ok()?;
            String::from_utf8(bytes).ok()
        }
        Some("") | None => Some(content.to_string()),
        Some(_) => None,
    }
}

/// Response types from GitHub API
#[derive(Deserialize)]
struct RepoResponse {
    full_name: String,
    default_branch: String,
    #[serde(default)]
    size: u64,
    html_url: String,
}

impl From<RepoResponse> for GitHubRepo {
    fn from(r: RepoResponse) -> Self {
        GitHubRepo {
            full_name: r.full_name,
            default_branch: r.default_branch,
            size_kb: r.size,
            html_url: r.html_url,
        }
    }
}

#[derive(Deserialize)]
struct UserRef {
    login: String,
}

#[derive(Deserialize)]
struct CommitResponse {
    sha: String,
    commit: CommitDetail,
    author: Option<UserRef>,
    committer: Option<UserRef>,
}

#[derive(Deserialize)]
struct CommitDetail {
    message: String,
    author: Option<GitSignature>,
    committer: Option<GitSignature>,
}

#[derive(Deserialize)]
struct GitSignature {
    name: Option<String>,
    date: Option<DateTime<Utc>>,
}

impl From<CommitResponse> for GitHubCommit {
    fn from(r: CommitResponse) -> Self {
        let (author_name, date) = match r.commit.author {
            Some(sig) => (sig.name, sig.date),
            None => (None, None),
        };
        GitHubCommit {
            sha: r.sha,
            message: r.commit.message,
            author_login: r.author.map(|a| a.login),
            author_name,
            committer_login: r.committer.map(|c| c.login),
            committer_name: r.commit.committer.and_then(|sig| sig.name),
            date: date.unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct PullRequestResponse {
    number: i64,
    title: String,
    state: String,
    merged_at: Option<DateTime<Utc>>,
    user: Option<UserRef>,
    created_at: DateTime<Utc>,
}

impl From<PullRequestResponse> for GitHubPullRequest {
    fn from(r: PullRequestResponse) -> Self {
        GitHubPullRequest {
            number: r.number,
            title: r.title,
            state: r.state,
            merged: r.merged_at.is_some(),
            author_login: r.user.map(|u| u.login),
            created_at: r.created_at,
        }
    }
}

#[derive(Deserialize)]
struct ContributorResponse {
    // anonymous contributors have no login
    login: Option<String>,
    #[serde(default)]
    name: Option<String>,
    contributions: u32,
}

impl From<ContributorResponse> for GitHubContributor {
    fn from(r: ContributorResponse) -> Self {
        GitHubContributor {
            login: r.login.or(r.name).unwrap_or_else(|| "anonymous".to_string()),
            contributions: r.contributions,
        }
    }
}

#[derive(Deserialize)]
struct TreeResponse {
    tree: Vec<TreeEntryResponse>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct TreeEntryResponse {
    path: String,
    #[serde(rename = "type")]
    kind: TreeEntryKind,
    size: Option<u64>,
}

impl From<TreeResponse> for GitHubTree {
    fn from(r: TreeResponse) -> Self {
        GitHubTree {
            entries: r
                .tree
                .into_iter()
                .map(|e| GitHubTreeEntry {
                    path: e.path,
                    kind: e.kind,
                    size: e.size,
                })
                .collect(),
            truncated: r.truncated,
        }
    }
}

/// The contents endpoint returns an array for directories
#[derive(Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Listing(Vec<serde_json::Value>),
    File {
        content: Option<String>,
        encoding: Option<String>,
    },
}

impl ContentsResponse {
    fn into_text(self) -> Option<String> {
        match self {
            ContentsResponse::File {
                content: Some(content),
                encoding,
            } => decode_content(&content, encoding.as_deref()),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct WorkflowRunsResponse {
    workflow_runs: Vec<WorkflowRunResponse>,
}

#[derive(Deserialize)]
struct WorkflowRunResponse {
    name: Option<String>,
    head_sha: String,
    status: Option<String>,
    conclusion: Option<String>,
}

impl From<WorkflowRunResponse> for GitHubWorkflowRun {
    fn from(r: WorkflowRunResponse) -> Self {
        GitHubWorkflowRun {
            name: r.name,
            head_sha: r.head_sha,
            status: r.status.unwrap_or_else(|| "completed".to_string()),
            conclusion: r.conclusion,
        }
    }
}

#[async_trait]
impl GitHubClient for GitHubClientImpl {
    async fn get_repository(&self, repo: &RepoRef) -> Result<GitHubRepo, GitHubError> {
        let url = self.repo_url(repo, "");
        let response: RepoResponse = self.get_required(repo, &url).await?;
        Ok(response.into())
    }

    async fn list_commits(
        &self,
        repo: &RepoRef,
        branch: &str,
        page: u32,
    ) -> Result<Vec<GitHubCommit>, GitHubError> {
        let url = self.repo_url(
            repo,
            &format!(
                "/commits?sha={}&per_page={}&page={}",
                encode(branch),
                PER_PAGE,
                page
            ),
        );
        // an empty repository answers 409
        let commits: Vec<CommitResponse> = match self.get_required(repo, &url).await {
            Err(GitHubError::Api { status: 409, .. }) => Vec::new(),
            other => other?,
        };
        Ok(commits.into_iter().map(|c| c.into()).collect())
    }

    async fn list_pull_requests(
        &self,
        repo: &RepoRef,
        page: u32,
    ) -> Result<Vec<GitHubPullRequest>, GitHubError> {
        let url = self.repo_url(
            repo,
            &format!("/pulls?state=all&per_page={}&page={}", PER_PAGE, page),
        );
        let pulls: Vec<PullRequestResponse> = self.get_required(repo, &url).await?;
        Ok(pulls.into_iter().map(|p| p.into()).collect())
    }

    async fn list_pr_commits(
        &self,
        repo: &RepoRef,
        number: i64,
        page: u32,
    ) -> Result<Vec<GitHubCommit>, GitHubError> {
        let url = self.repo_url(
            repo,
            &format!("/pulls/{}/commits?per_page={}&page={}", number, PER_PAGE, page),
        );
        let commits: Vec<CommitResponse> = self.get_required(repo, &url).await?;
        Ok(commits.into_iter().map(|c| c.into()).collect())
    }

    async fn list_contributors(
        &self,
        repo: &RepoRef,
    ) -> Result<Vec<GitHubContributor>, GitHubError> {
        let url = self.repo_url(repo, &format!("/contributors?anon=1&per_page={}", PER_PAGE));
        let contributors: Option<Vec<ContributorResponse>> = self.get_optional(&url).await?;
        Ok(contributors
            .unwrap_or_default()
            .into_iter()
            .map(|c| c.into())
            .collect())
    }

    async fn get_tree(&self, repo: &RepoRef, branch: &str) -> Result<GitHubTree, GitHubError> {
        let url = self.repo_url(repo, &format!("/git/trees/{}?recursive=1", encode(branch)));
        let tree: Option<TreeResponse> = match self.get_optional(&url).await {
            Err(GitHubError::Api { status: 409, .. }) => None,
            other => other?,
        };
        Ok(tree.map(|t| t.into()).unwrap_or_default())
    }

    async fn get_file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        branch: &str,
    ) -> Result<Option<String>, GitHubError> {
        let encoded_path = path
            .split('/')
            .map(|s| encode(s).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let url = self.repo_url(
            repo,
            &format!("/contents/{}?ref={}", encoded_path, encode(branch)),
        );
        let contents: Option<ContentsResponse> = self.get_optional(&url).await?;
        Ok(contents.and_then(|c| c.into_text()))
    }

    async fn get_readme(&self, repo: &RepoRef) -> Result<Option<String>, GitHubError> {
        let url = self.repo_url(repo, "/readme");
        let contents: Option<ContentsResponse> = self.get_optional(&url).await?;
        Ok(contents.and_then(|c| c.into_text()))
    }

    async fn list_workflow_runs(
        &self,
        repo: &RepoRef,
        branch: &str,
    ) -> Result<Vec<GitHubWorkflowRun>, GitHubError> {
        let url = self.repo_url(
            repo,
            &format!(
                "/actions/runs?branch={}&event=push&per_page={}",
                encode(branch),
                PER_PAGE
            ),
        );
        let runs: Option<WorkflowRunsResponse> = self.get_optional(&url).await?;
        Ok(runs
            .map(|r| r.workflow_runs.into_iter().map(|w| w.into()).collect())
            .unwrap_or_default())
    }
}
