//! Domain ports (traits)
//!
//! Port traits define interfaces that the domain layer requires.
//! Adapters provide concrete implementations of these traits.

pub mod github;
pub mod llm;
pub mod repositories;

pub use github::{
    GitHubClient, GitHubCommit, GitHubContributor, GitHubPullRequest, GitHubRepo, GitHubTree,
    GitHubTreeEntry, GitHubWorkflowRun, TreeEntryKind, PER_PAGE,
};
pub use llm::{CompletionRequest, LlmClient};
pub use repositories::EvaluationRepository;
