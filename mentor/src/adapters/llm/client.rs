//! OpenAI-compatible chat completion client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{CompletionRequest, LlmClient};
use crate::error::LlmError;

pub const DEFAULT_MODEL: &str = "ministral-3:8b-32k";

/// Where completions are served from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    /// Local Ollama server, no key needed
    Ollama,
    /// Hosted OpenAI-compatible gateway, needs an API key
    Hosted,
}

impl LlmProvider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            LlmProvider::Ollama => "http://localhost:11434/v1",
            LlmProvider::Hosted => "https://chat.campusai.compute.dtu.dk/api/v1",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, LlmProvider::Hosted)
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::Ollama => write!(f, "ollama"),
            LlmProvider::Hosted => write!(f, "hosted"),
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" | "local" => Ok(LlmProvider::Ollama),
            "hosted" | "litellm" | "openai" => Ok(LlmProvider::Hosted),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

/// Chat completion client for any OpenAI-compatible endpoint
pub struct OpenAiCompatibleClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    json_mode: bool,
}

impl OpenAiCompatibleClient {
    pub fn new(
        provider: LlmProvider,
        base_url: Option<String>,
        api_key: Option<String>,
        model: String,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.filter(|k| !k.is_empty());
        if provider.requires_api_key() && api_key.is_none() {
            return Err(LlmError::Configuration(format!(
                "LLM_API_KEY must be set for the {} provider",
                provider
            )));
        }

        let base_url = base_url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| provider.default_base_url().to_string());
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            json_mode: false,
        })
    }

    /// Ask the provider for a JSON object response format
    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body<'a>(&'a self, request: &'a CompletionRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: 0.0,
            stream: false,
            response_format: self.json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        }
    }
}

/// Request types for the chat completions API
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

/// Response types from the chat completions API
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Result<String, LlmError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let mut builder = self
            .http
            .post(self.completions_url())
            .json(&self.request_body(request));
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            let body: ChatResponse = response
                .json()
                .await
                .map_err(|e| LlmError::Deserialization(e.to_string()))?;
            body.into_text()
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(LlmError::Unauthorized)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(LlmError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}
