use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::adapters::github::client::DEFAULT_API_URL;
use crate::adapters::llm::client::DEFAULT_MODEL;
use crate::adapters::LlmProvider;
use crate::app::{RetryPolicy, SnapshotLimits};

#[derive(Clone, Debug)]
pub struct Config {
    /// GitHub token; unauthenticated requests get a much lower rate limit
    pub github_token: Option<String>,
    pub github_api_url: String,
    pub llm_provider: LlmProvider,
    /// Overrides the provider's default base URL
    pub llm_base_url: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    /// Ask the provider for `response_format: json_object`
    pub llm_json_mode: bool,
    pub database_url: String,
    pub roster_path: PathBuf,
    /// Upper bound, in bytes, of each criterion summary sent to the LLM
    pub summary_budget_bytes: usize,
    pub max_file_bytes: u64,
    pub max_fetched_files: usize,
    pub max_history_pages: u32,
    pub max_merged_prs: usize,
    pub http_timeout: Duration,
    pub llm_timeout: Duration,
    pub rate_limit_retries: u32,
    pub rate_limit_backoff: Duration,
    pub rate_limit_max_backoff: Duration,
    pub concurrency: usize,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            github_token: env::var("GH_TOKEN")
                .or_else(|_| env::var("GITHUB_TOKEN"))
                .ok()
                .filter(|t| !t.is_empty()),
            github_api_url: env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            llm_provider: env::var("LLM_PROVIDER")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(LlmProvider::Ollama),
            llm_base_url: env::var("LLM_BASE_URL").ok(),
            llm_api_key: env::var("LLM_API_KEY").ok(),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            llm_json_mode: env::var("LLM_JSON_MODE")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://mentor.db?mode=rwc".to_string()),
            roster_path: env::var("ROSTER_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("group_info.csv")),
            summary_budget_bytes: parse_var("SUMMARY_BUDGET_BYTES", 24_000),
            max_file_bytes: parse_var("MAX_FILE_BYTES", 50_000),
            max_fetched_files: parse_var("MAX_FETCHED_FILES", 40),
            max_history_pages: parse_var("MAX_HISTORY_PAGES", 10),
            max_merged_prs: parse_var("MAX_MERGED_PRS", 100),
            http_timeout: Duration::from_secs(parse_var("HTTP_TIMEOUT_SECS", 30)),
            llm_timeout: Duration::from_secs(parse_var("LLM_TIMEOUT_SECS", 120)),
            rate_limit_retries: parse_var("RATE_LIMIT_RETRIES", 3),
            rate_limit_backoff: Duration::from_secs(parse_var("RATE_LIMIT_BACKOFF_SECS", 5)),
            rate_limit_max_backoff: Duration::from_secs(parse_var(
                "RATE_LIMIT_MAX_BACKOFF_SECS",
                300,
            )),
            concurrency: parse_var("CONCURRENCY", 1),
            port: parse_var("PORT", 8080),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.rate_limit_retries,
            base_delay: self.rate_limit_backoff,
            max_delay: self.rate_limit_max_backoff,
        }
    }

    pub fn snapshot_limits(&self) -> SnapshotLimits {
        SnapshotLimits {
            max_history_pages: self.max_history_pages,
            max_merged_prs: self.max_merged_prs,
            max_files: self.max_fetched_files,
            max_file_bytes: self.max_file_bytes,
        }
    }
}

/// Read and parse a variable, falling back to `default` when unset or invalid
fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
