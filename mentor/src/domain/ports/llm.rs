//! LLM client port trait
//!
//! A single request/response chat completion. The provider behind it
//! (local inference or hosted) is an adapter concern.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// A chat completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Port trait for LLM completions
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a request and return the assistant's text
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;

    /// Model identifier, for logging
    fn model(&self) -> &str;
}
