use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use user_admin_sdk::ErrorCode;
use uuid::Uuid;

use crate::domain::security::{Action, Resource};

/// Classification of storage failures, used to decide whether a batch can continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageErrorKind {
    Connection,
    Timeout,
    UniqueViolation,
    ForeignKeyViolation,
    NotFound,
    Other,
}

impl fmt::Display for StorageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connection => "connection",
            Self::Timeout => "timeout",
            Self::UniqueViolation => "unique_violation",
            Self::ForeignKeyViolation => "foreign_key_violation",
            Self::NotFound => "not_found",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// One rejected field of a create or update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
    pub code: ErrorCode,
}

impl FieldError {
    #[must_use]
    pub fn new(field: &'static str, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
            code,
        }
    }
}

/// Domain-specific errors using thiserror
#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("User not found: {id}")]
    UserNotFound { id: Uuid },

    #[error("Invalid user id: '{id}'")]
    InvalidUserId { id: String },

    #[error("Invalid role: '{role}'")]
    InvalidRole { role: String },

    #[error("User with email '{email}' already exists")]
    EmailAlreadyExists { email: String },

    #[error("Invalid email format: '{email}'")]
    InvalidEmail { email: String },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Validation failed for {} field(s)", .errors.len())]
    InvalidFields { errors: Vec<FieldError> },

    #[error("You cannot ban your own account")]
    CannotBanSelf,

    #[error("You cannot modify your own account: {reason}")]
    CannotModifySelf { reason: String },

    #[error("You cannot delete your own account")]
    CannotDeleteSelf,

    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("Permission denied: cannot {action} {resource}")]
    Forbidden { action: Action, resource: Resource },

    #[error("Too many users selected: {count} (max: {max})")]
    TooManyUsersSelected { count: usize, max: usize },

    #[error("File too large: {size} bytes (max: {max})")]
    FileTooLarge { size: usize, max: usize },

    #[error("Unsupported file format: {detail}")]
    UnsupportedFileFormat { detail: String },

    #[error("Invalid import file: {detail}")]
    ImportFileInvalid { detail: String },

    #[error("Invalid import data: {detail}")]
    ImportDataInvalid { detail: String },

    #[error("Export limit exceeded: {total} records match (max: {max})")]
    ExportLimitExceeded { total: u64, max: u64 },

    #[error("Invalid export format: '{format}'")]
    InvalidExportFormat { format: String },

    #[error("Export failed: {detail}")]
    ExportFailed { detail: String },

    #[error("Storage error ({kind}): {message}")]
    Storage {
        kind: StorageErrorKind,
        message: String,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn user_not_found(id: Uuid) -> Self {
        Self::UserNotFound { id }
    }

    pub fn invalid_user_id(id: impl Into<String>) -> Self {
        Self::InvalidUserId { id: id.into() }
    }

    pub fn invalid_role(role: impl Into<String>) -> Self {
        Self::InvalidRole { role: role.into() }
    }

    pub fn email_already_exists(email: impl Into<String>) -> Self {
        Self::EmailAlreadyExists {
            email: email.into(),
        }
    }

    pub fn invalid_email(email: impl Into<String>) -> Self {
        Self::InvalidEmail {
            email: email.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn cannot_modify_self(reason: impl Into<String>) -> Self {
        Self::CannotModifySelf {
            reason: reason.into(),
        }
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    pub fn forbidden(action: Action, resource: Resource) -> Self {
        Self::Forbidden { action, resource }
    }

    pub fn unsupported_file_format(detail: impl Into<String>) -> Self {
        Self::UnsupportedFileFormat {
            detail: detail.into(),
        }
    }

    pub fn import_file_invalid(detail: impl Into<String>) -> Self {
        Self::ImportFileInvalid {
            detail: detail.into(),
        }
    }

    pub fn import_data_invalid(detail: impl Into<String>) -> Self {
        Self::ImportDataInvalid {
            detail: detail.into(),
        }
    }

    pub fn export_failed(detail: impl Into<String>) -> Self {
        Self::ExportFailed {
            detail: detail.into(),
        }
    }

    pub fn storage(kind: StorageErrorKind, message: impl Into<String>) -> Self {
        Self::Storage {
            kind,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Storage classification, if this error came from the storage layer.
    #[must_use]
    pub fn storage_kind(&self) -> Option<StorageErrorKind> {
        match self {
            Self::Storage { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Taxonomy code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UserNotFound { .. }
            | Self::Storage {
                kind: StorageErrorKind::NotFound,
                ..
            } => ErrorCode::UserNotFound,
            Self::InvalidUserId { .. } => ErrorCode::InvalidUserId,
            Self::InvalidRole { .. } => ErrorCode::InvalidRole,
            Self::EmailAlreadyExists { .. }
            | Self::Storage {
                kind: StorageErrorKind::UniqueViolation,
                ..
            } => ErrorCode::EmailAlreadyExists,
            Self::InvalidEmail { .. } => ErrorCode::InvalidEmailFormat,
            Self::Validation { .. } | Self::InvalidFields { .. } => ErrorCode::ValidationError,
            Self::CannotBanSelf => ErrorCode::CannotBanSelf,
            Self::CannotModifySelf { .. } => ErrorCode::CannotModifySelf,
            Self::CannotDeleteSelf => ErrorCode::CannotDeleteSelf,
            Self::Unauthorized { .. } => ErrorCode::Unauthorized,
            Self::Forbidden { .. } => ErrorCode::InsufficientPermissions,
            Self::TooManyUsersSelected { .. } => ErrorCode::TooManyUsersSelected,
            Self::FileTooLarge { .. } => ErrorCode::FileTooLarge,
            Self::UnsupportedFileFormat { .. } => ErrorCode::UnsupportedFileFormat,
            Self::ImportFileInvalid { .. } => ErrorCode::ImportFileInvalid,
            Self::ImportDataInvalid { .. } => ErrorCode::ImportDataInvalid,
            Self::ExportLimitExceeded { .. } => ErrorCode::ExportLimitExceeded,
            Self::InvalidExportFormat { .. } => ErrorCode::InvalidExportFormat,
            Self::ExportFailed { .. } => ErrorCode::ExportFailed,
            Self::Storage { .. } => ErrorCode::DatabaseError,
            Self::Internal { .. } => ErrorCode::InternalServerError,
        }
    }
}
