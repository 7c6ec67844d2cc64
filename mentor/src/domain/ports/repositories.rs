//! Repository port traits
//!
//! These traits define the interface for data persistence.
//! Implementations are provided by adapters (e.g., SQLite).

use async_trait::async_trait;

use crate::domain::entities::{EvaluationRecord, GroupId};
use crate::error::DomainError;

/// Repository for EvaluationRecord entities
#[async_trait]
pub trait EvaluationRepository: Send + Sync {
    /// Insert or replace the record for its group, atomically
    async fn upsert(&self, record: &EvaluationRecord) -> Result<(), DomainError>;

    /// Find the record of a group
    async fn find_by_group(&self, group: GroupId)
        -> Result<Option<EvaluationRecord>, DomainError>;

    /// All records, ordered by group id
    async fn list_all(&self) -> Result<Vec<EvaluationRecord>, DomainError>;
}
