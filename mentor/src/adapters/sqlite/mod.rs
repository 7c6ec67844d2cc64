//! SQLite adapters
//!
//! Implementations of repository traits using SeaORM and SQLite.

pub mod evaluation_repo;


pub use evaluation_repo::{ensure_schema, SqliteEvaluationRepository};

use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::error::DomainError;

/// Open the database and create the schema if it's missing
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DomainError> {
    let mut options = ConnectOptions::new(database_url.to_string());
    options.sqlx_logging(false);
    if database_url.contains(":memory:") {
        // every pooled connection would otherwise get its own empty database
        options.max_connections(1);
    }

    let db = Database::connect(options)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;
    ensure_schema(&db).await?;

    Ok(db)
}
