//! Database error conversion helpers.

use sea_orm::{ConnAcquireErr, DbErr, SqlErr};

use crate::domain::error::{DomainError, StorageErrorKind};

/// Storage class of a SeaORM error.
#[must_use]
pub fn classify(e: &DbErr) -> StorageErrorKind {
    match e {
        DbErr::ConnectionAcquire(ConnAcquireErr::Timeout) => StorageErrorKind::Timeout,
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => StorageErrorKind::Connection,
        DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => StorageErrorKind::NotFound,
        other => match other.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => StorageErrorKind::UniqueViolation,
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => StorageErrorKind::ForeignKeyViolation,
            _ => StorageErrorKind::Other,
        },
    }
}

/// Convert a SeaORM error into `DomainError::Storage`, keeping its classification.
pub fn db_err(e: DbErr) -> DomainError {
    let kind = classify(&e);
    tracing::error!(%kind, error = %e, "database operation failed");
    DomainError::storage(kind, e.to_string())
}
