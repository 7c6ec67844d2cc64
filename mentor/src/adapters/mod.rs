//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod github;
pub mod llm;
pub mod sqlite;

pub use github::GitHubClientImpl;
pub use llm::{LlmProvider, OpenAiCompatibleClient};
pub use sqlite::SqliteEvaluationRepository;
