//! Application layer
//!
//! Contains use cases and service orchestration.
//! Services coordinate between domain entities, ports, and external systems.

pub mod evaluator_service;
pub mod extractor;
pub mod leaderboard_service;
pub mod prompts;
pub mod roster;
pub mod scrape_service;
pub mod snapshot_service;

pub use evaluator_service::EvaluatorService;
// Pure pipeline stages, usable without any port
#[allow(unused_imports)]
pub use evaluator_service::parse_criterion_response;
#[allow(unused_imports)]
pub use extractor::{extract, select_files_to_fetch, ExtractedSummary};
#[allow(unused_imports)]
pub use leaderboard_service::rank;
pub use leaderboard_service::{LeaderboardRow, LeaderboardService};
#[allow(unused_imports)]
pub use roster::parse_roster;
pub use roster::load_roster;
#[allow(unused_imports)]
pub use scrape_service::RunSummary;
pub use scrape_service::ScrapeService;
pub use snapshot_service::{RetryPolicy, SnapshotLimits, SnapshotService};
