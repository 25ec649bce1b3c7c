//! Database-specific error types and conversions.

use paygrid_core::error::CoreError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("record not found: {entity} with key {key}")]
    NotFound { entity: String, key: String },

    #[error("record already exists: {entity} with key {key}")]
    Conflict { entity: String, key: String },

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<DbError> for CoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, key } => CoreError::NotFound { entity, key },
            DbError::Conflict { entity, key } => CoreError::Conflict { entity, key },
            other => CoreError::Upstream(other.to_string()),
        }
    }
}
