//! SQLite adapter for EvaluationRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Schema, Set, TransactionTrait,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::entities::{
    Criterion, CriterionScore, EvaluationRecord, FailureKind, GroupId, RunId,
};
use crate::domain::ports::EvaluationRepository;
use crate::entity::{criterion_scores, evaluations};
use crate::error::DomainError;

/// SQLite implementation of EvaluationRepository
pub struct SqliteEvaluationRepository {
    db: DatabaseConnection,
    /// SQLite allows one writer; serialize upserts in-process
    write_lock: Mutex<()>,
}

impl SqliteEvaluationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            write_lock: Mutex::new(()),
        }
    }
}

/// Create both tables if they don't exist
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DomainError> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut evaluations_table = schema.create_table_from_entity(evaluations::Entity);
    evaluations_table.if_not_exists();
    let mut scores_table = schema.create_table_from_entity(criterion_scores::Entity);
    scores_table.if_not_exists();

    for statement in [backend.build(&evaluations_table), backend.build(&scores_table)] {
        db.execute(statement)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;
    }

    Ok(())
}

#[async_trait]
impl EvaluationRepository for SqliteEvaluationRepository {
    async fn upsert(&self, record: &EvaluationRecord) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock().await;

        let stats = record
            .stats
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        criterion_scores::Entity::delete_many()
            .filter(criterion_scores::Column::GroupNumber.eq(record.group.0))
            .exec(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        evaluations::Entity::delete_by_id(record.group.0)
            .exec(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        evaluations::ActiveModel {
            group_number: Set(record.group.0),
            repo_url: Set(record.repo_url.clone()),
            group_size: Set(record.group_size),
            run_id: Set(record.run_id.0),
            overall_score: Set(record.overall_score),
            confidence: Set(record.confidence),
            summary: Set(record.summary.clone()),
            stats: Set(stats),
            evaluated_at: Set(record.evaluated_at.fixed_offset()),
        }
        .insert(&txn)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        let scores: Vec<criterion_scores::ActiveModel> = record
            .scores
            .iter()
            .map(|s| criterion_scores::ActiveModel {
                id: Set(Uuid::new_v4()),
                group_number: Set(record.group.0),
                criterion: Set(s.criterion.to_string()),
                score: Set(s.score),
                confidence: Set(s.confidence),
                justification: Set(s.justification.clone()),
                failure: Set(s.failure.map(|f| f.to_string())),
            })
            .collect();

        if !scores.is_empty() {
            criterion_scores::Entity::insert_many(scores)
                .exec(&txn)
                .await
                .map_err(|e| DomainError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        tracing::debug!(group = %record.group, run_id = %record.run_id, "Stored evaluation");
        Ok(())
    }

    async fn find_by_group(
        &self,
        group: GroupId,
    ) -> Result<Option<EvaluationRecord>, DomainError> {
        let result = evaluations::Entity::find_by_id(group.0)
            .find_with_related(criterion_scores::Entity)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        result
            .into_iter()
            .next()
            .map(|(model, scores)| to_record(model, scores))
            .transpose()
    }

    async fn list_all(&self) -> Result<Vec<EvaluationRecord>, DomainError> {
        let result = evaluations::Entity::find()
            .order_by_asc(evaluations::Column::GroupNumber)
            .find_with_related(criterion_scores::Entity)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let mut records = result
            .into_iter()
            .map(|(model, scores)| to_record(model, scores))
            .collect::<Result<Vec<_>, _>>()?;
        records.sort_by_key(|r| r.group);

        Ok(records)
    }
}

fn to_record(
    model: evaluations::Model,
    score_models: Vec<criterion_scores::Model>,
) -> Result<EvaluationRecord, DomainError> {
    let mut scores = score_models
        .into_iter()
        .map(to_score)
        .collect::<Result<Vec<_>, _>>()?;
    scores.sort_by_key(|s| Criterion::ALL.iter().position(|c| *c == s.criterion));

    let stats = model
        .stats
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| DomainError::Database(format!("Corrupt stats column: {}", e)))?;

    Ok(EvaluationRecord {
        group: GroupId(model.group_number),
        repo_url: model.repo_url,
        group_size: model.group_size,
        run_id: RunId(model.run_id),
        scores,
        overall_score: model.overall_score,
        confidence: model.confidence,
        summary: model.summary,
        stats,
        evaluated_at: model.evaluated_at.with_timezone(&Utc),
    })
}

fn to_score(model: criterion_scores::Model) -> Result<CriterionScore, DomainError> {
    let criterion: Criterion = model.criterion.parse().map_err(DomainError::Database)?;
    let failure = model
        .failure
        .map(|f| f.parse::<FailureKind>())
        .transpose()
        .map_err(DomainError::Database)?;

    Ok(CriterionScore {
        criterion,
        score: model.score,
        confidence: model.confidence,
        justification: model.justification,
        failure,
    })
}
