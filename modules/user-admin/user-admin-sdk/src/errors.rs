//! Error taxonomy for the `user-admin` module.
//!
//! Codes are stable identifiers exposed on the wire; every batch error record and
//! every error envelope carries exactly one of them.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Closed set of machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Unauthorized,
    InsufficientPermissions,
    ValidationError,
    InvalidEmailFormat,
    WeakPassword,
    InvalidUserId,
    InvalidRole,
    RoleNotFound,
    UserNotFound,
    EmailAlreadyExists,
    DuplicateImportData,
    CannotDeleteSelf,
    CannotBanSelf,
    CannotModifySelf,
    TooManyUsersSelected,
    BulkOperationFailed,
    FileTooLarge,
    UnsupportedFileFormat,
    ImportFileInvalid,
    ImportDataInvalid,
    ExportLimitExceeded,
    InvalidExportFormat,
    ExportFailed,
    DatabaseError,
    InternalServerError,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 25] = [
        Self::Unauthorized,
        Self::InsufficientPermissions,
        Self::ValidationError,
        Self::InvalidEmailFormat,
        Self::WeakPassword,
        Self::InvalidUserId,
        Self::InvalidRole,
        Self::RoleNotFound,
        Self::UserNotFound,
        Self::EmailAlreadyExists,
        Self::DuplicateImportData,
        Self::CannotDeleteSelf,
        Self::CannotBanSelf,
        Self::CannotModifySelf,
        Self::TooManyUsersSelected,
        Self::BulkOperationFailed,
        Self::FileTooLarge,
        Self::UnsupportedFileFormat,
        Self::ImportFileInvalid,
        Self::ImportDataInvalid,
        Self::ExportLimitExceeded,
        Self::InvalidExportFormat,
        Self::ExportFailed,
        Self::DatabaseError,
        Self::InternalServerError,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidEmailFormat => "INVALID_EMAIL_FORMAT",
            Self::WeakPassword => "WEAK_PASSWORD",
            Self::InvalidUserId => "INVALID_USER_ID",
            Self::InvalidRole => "INVALID_ROLE",
            Self::RoleNotFound => "ROLE_NOT_FOUND",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            Self::DuplicateImportData => "DUPLICATE_IMPORT_DATA",
            Self::CannotDeleteSelf => "CANNOT_DELETE_SELF",
            Self::CannotBanSelf => "CANNOT_BAN_SELF",
            Self::CannotModifySelf => "CANNOT_MODIFY_SELF",
            Self::TooManyUsersSelected => "TOO_MANY_USERS_SELECTED",
            Self::BulkOperationFailed => "BULK_OPERATION_FAILED",
            Self::FileTooLarge => "FILE_TOO_LARGE",
            Self::UnsupportedFileFormat => "UNSUPPORTED_FILE_FORMAT",
            Self::ImportFileInvalid => "IMPORT_FILE_INVALID",
            Self::ImportDataInvalid => "IMPORT_DATA_INVALID",
            Self::ExportLimitExceeded => "EXPORT_LIMIT_EXCEEDED",
            Self::InvalidExportFormat => "INVALID_EXPORT_FORMAT",
            Self::ExportFailed => "EXPORT_FAILED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a wire string does not name a known enum variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

impl FromStr for ErrorCode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("error code", s))
    }
}
