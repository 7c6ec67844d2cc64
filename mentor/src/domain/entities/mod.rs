//! Domain entities
//!
//! Pure domain models representing core business concepts.
//! These are separate from the SeaORM entities in the `entity` module.

pub mod group;
pub mod record;
pub mod score;
pub mod snapshot;

pub use group::{Group, GroupId, RepoRef, MAX_STUDENTS};
pub use record::{EvaluationRecord, RunId, OVERALL_MAX, OVERALL_MIN};
pub use score::{
    Criterion, CriterionScore, FailureKind, CONFIDENCE_MAX, CONFIDENCE_MIN, DEFAULT_CONFIDENCE,
    SCORE_MAX, SCORE_MIN,
};
pub use snapshot::{CiStatus, FileContent, FileRole, RepoStats, RepositorySnapshot};
