//! Storage error types for the API storage layer.

use thiserror::Error;

/// Storage operation errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Entity not found
    #[error("{entity_type} not found: {entity_id}")]
    NotFound {
        entity_type: &'static str,
        entity_id: String,
    },
    /// Unique constraint violation
    #[error("{entity_type} already exists")]
    AlreadyExists { entity_type: &'static str },
    /// Foreign key violation (referenced row does not exist)
    #[error("invalid {entity_type} reference")]
    InvalidReference { entity_type: &'static str },
    /// Migration failure at startup
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    /// General storage error
    #[error("storage error: {0}")]
    Other(String),
    /// Underlying database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    pub fn not_found(entity_type: &'static str, entity_id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            entity_id: entity_id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// Map an insert/update error onto the constraint-aware variants.
///
/// Postgres reports unique violations as 23505 and foreign key violations
/// as 23503; everything else passes through as a database error.
pub(crate) fn map_constraint_error(err: sqlx::Error, entity_type: &'static str) -> StorageError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some("23505") => return StorageError::AlreadyExists { entity_type },
            Some("23503") => return StorageError::InvalidReference { entity_type },
            _ => {}
        }
    }
    StorageError::Database(err)
}
