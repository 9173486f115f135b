//! Storage errors for metrics and generated content.

use thiserror::Error;

/// Failure of a query against the metrics or content tables.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("sqlite error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("schema migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A JSON column could not be encoded or decoded
    #[error("json column error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored value is outside its allowed domain
    #[error("invalid stored value: {0}")]
    Decode(String),

    /// No row with the given id.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Insert collided with an existing primary key.
    #[error("{entity} {id} already stored")]
    AlreadyExists { entity: &'static str, id: String },
}

/// Result alias used across the storage modules.
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Map a unique-constraint violation on insert to `AlreadyExists`.
pub(crate) fn map_insert_error(e: sqlx::Error, entity: &'static str, id: &str) -> DatabaseError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return DatabaseError::AlreadyExists {
                entity,
                id: id.to_string(),
            };
        }
    }
    DatabaseError::Sqlx(e)
}
