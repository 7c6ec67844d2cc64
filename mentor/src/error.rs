//! Unified error types for MLOps Mentor
//!
//! This module defines error types for each layer:
//! - `DomainError`: Core business logic and storage errors
//! - `GitHubError`: GitHub API client errors
//! - `LlmError`: LLM provider errors
//! - `ParseError`: Malformed LLM replies
//! - `AppError`: Application layer errors (wraps the above for the CLI and HTTP responses)

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::domain::entities::FailureKind;

/// Domain layer errors - pure business logic errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// GitHub API client errors
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Not a GitHub repository URL: {0}")]
    InvalidRepoUrl(String),

    #[error("Repository not found: {owner}/{repo}")]
    RepoNotFound { owner: String, repo: String },

    /// `retry_after` is the delay in seconds suggested by the API, if any
    #[error("Rate limited")]
    RateLimited { retry_after: Option<u64> },

    #[error("Unauthorized - invalid token")]
    Unauthorized,

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl GitHubError {
    /// How a failed fetch is recorded against a group
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            GitHubError::InvalidRepoUrl(_) | GitHubError::RepoNotFound { .. } => {
                FailureKind::NotFound
            }
            GitHubError::RateLimited { .. } => FailureKind::RateLimited,
            _ => FailureKind::Endpoint,
        }
    }
}

/// LLM provider errors
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Unauthorized - check LLM_API_KEY")]
    Unauthorized,

    #[error("Provider returned no completion")]
    EmptyResponse,

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Errors parsing a structured score out of an LLM reply
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("No JSON object found in reply")]
    NoJsonObject,

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Score {value} outside {min}..={max}")]
    ScoreOutOfRange { value: i64, min: i32, max: i32 },

    #[error("Confidence {value} outside {min}..={max}")]
    ConfidenceOutOfRange { value: i64, min: i32, max: i32 },

    #[error("Empty justification")]
    EmptyJustification,
}

/// Application layer errors - used by the CLI and HTTP handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("GitHub error: {0}")]
    GitHub(#[from] GitHubError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("GitHub rejected the token; set GH_TOKEN to a valid personal access token")]
    Auth,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body for JSON responses
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Domain(DomainError::NotFound(msg)) | AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, "Not found", Some(msg.clone()))
            }
            AppError::Domain(DomainError::Validation(msg)) => (
                StatusCode::BAD_REQUEST,
                "Validation error",
                Some(msg.clone()),
            ),
            AppError::Domain(DomainError::Database(msg))
            | AppError::Domain(DomainError::Internal(msg))
            | AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
            AppError::GitHub(e) => {
                tracing::error!("GitHub error: {}", e);
                (StatusCode::BAD_GATEWAY, "GitHub error", None)
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {}", e);
                (StatusCode::BAD_GATEWAY, "LLM provider error", None)
            }
            AppError::Auth => (StatusCode::UNAUTHORIZED, "Unauthorized", None),
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            details,
        });

        (status, body).into_response()
    }
}
