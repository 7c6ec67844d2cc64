//! LLM adapter
//!
//! OpenAI-compatible chat completion client, usable against a local Ollama
//! server or a hosted gateway.

pub mod client;

pub use client::{LlmProvider, OpenAiCompatibleClient};
