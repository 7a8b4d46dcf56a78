//! Error catalog: HTTP status, default user message and severity for every [`ErrorCode`].

use admin_errors::{ErrDef, Severity};
use user_admin_sdk::ErrorCode;

const fn def(status: u16, code: ErrorCode, message: &'static str, severity: Severity) -> ErrDef {
    ErrDef {
        status,
        code: code.as_str(),
        message,
        severity,
    }
}

const UNAUTHORIZED: ErrDef = def(
    401,
    ErrorCode::Unauthorized,
    "You are not authorized to access this resource",
    Severity::Medium,
);
const INSUFFICIENT_PERMISSIONS: ErrDef = def(
    403,
    ErrorCode::InsufficientPermissions,
    "You do not have permission to perform this action",
    Severity::Medium,
);
const VALIDATION_ERROR: ErrDef = def(
    400,
    ErrorCode::ValidationError,
    "Validation error occurred",
    Severity::Low,
);
const INVALID_EMAIL_FORMAT: ErrDef = def(
    400,
    ErrorCode::InvalidEmailFormat,
    "Invalid email format",
    Severity::Low,
);
const WEAK_PASSWORD: ErrDef = def(
    400,
    ErrorCode::WeakPassword,
    "Password does not meet security requirements",
    Severity::Low,
);
const INVALID_USER_ID: ErrDef = def(
    400,
    ErrorCode::InvalidUserId,
    "Invalid user ID provided",
    Severity::Low,
);
const INVALID_ROLE: ErrDef = def(
    400,
    ErrorCode::InvalidRole,
    "Selected role is invalid",
    Severity::Low,
);
const ROLE_NOT_FOUND: ErrDef = def(404, ErrorCode::RoleNotFound, "Role not found", Severity::Low);
const USER_NOT_FOUND: ErrDef = def(404, ErrorCode::UserNotFound, "User not found", Severity::Low);
const EMAIL_ALREADY_EXISTS: ErrDef = def(
    409,
    ErrorCode::EmailAlreadyExists,
    "Email address is already in use",
    Severity::Low,
);
const DUPLICATE_IMPORT_DATA: ErrDef = def(
    409,
    ErrorCode::DuplicateImportData,
    "Duplicate data found in import file",
    Severity::Low,
);
const CANNOT_DELETE_SELF: ErrDef = def(
    400,
    ErrorCode::CannotDeleteSelf,
    "You cannot delete your own account",
    Severity::Medium,
);
const CANNOT_BAN_SELF: ErrDef = def(
    400,
    ErrorCode::CannotBanSelf,
    "You cannot ban your own account",
    Severity::Medium,
);
const CANNOT_MODIFY_SELF: ErrDef = def(
    400,
    ErrorCode::CannotModifySelf,
    "You cannot modify your own account in this way",
    Severity::Medium,
);
const TOO_MANY_USERS_SELECTED: ErrDef = def(
    400,
    ErrorCode::TooManyUsersSelected,
    "Too many users selected for bulk operation",
    Severity::Low,
);
const BULK_OPERATION_FAILED: ErrDef = def(
    500,
    ErrorCode::BulkOperationFailed,
    "Bulk operation failed",
    Severity::High,
);
const FILE_TOO_LARGE: ErrDef = def(
    413,
    ErrorCode::FileTooLarge,
    "File size exceeds maximum limit",
    Severity::Low,
);
const UNSUPPORTED_FILE_FORMAT: ErrDef = def(
    415,
    ErrorCode::UnsupportedFileFormat,
    "Unsupported file format",
    Severity::Low,
);
const IMPORT_FILE_INVALID: ErrDef = def(
    400,
    ErrorCode::ImportFileInvalid,
    "Invalid import file",
    Severity::Low,
);
const IMPORT_DATA_INVALID: ErrDef = def(
    400,
    ErrorCode::ImportDataInvalid,
    "Invalid data in import file",
    Severity::Low,
);
const EXPORT_LIMIT_EXCEEDED: ErrDef = def(
    400,
    ErrorCode::ExportLimitExceeded,
    "Export exceeds the maximum number of records",
    Severity::Low,
);
const INVALID_EXPORT_FORMAT: ErrDef = def(
    400,
    ErrorCode::InvalidExportFormat,
    "Invalid export format",
    Severity::Low,
);
const EXPORT_FAILED: ErrDef = def(
    500,
    ErrorCode::ExportFailed,
    "Export operation failed",
    Severity::High,
);
const DATABASE_ERROR: ErrDef = def(
    500,
    ErrorCode::DatabaseError,
    "Database error occurred",
    Severity::High,
);
const INTERNAL_SERVER_ERROR: ErrDef = def(
    500,
    ErrorCode::InternalServerError,
    "Internal server error",
    Severity::Critical,
);

/// Catalog entry for `code`.
#[must_use]
pub const fn err_def(code: ErrorCode) -> &'static ErrDef {
    match code {
        ErrorCode::Unauthorized => &UNAUTHORIZED,
        ErrorCode::InsufficientPermissions => &INSUFFICIENT_PERMISSIONS,
        ErrorCode::ValidationError => &VALIDATION_ERROR,
        ErrorCode::InvalidEmailFormat => &INVALID_EMAIL_FORMAT,
        ErrorCode::WeakPassword => &WEAK_PASSWORD,
        ErrorCode::InvalidUserId => &INVALID_USER_ID,
        ErrorCode::InvalidRole => &INVALID_ROLE,
        ErrorCode::RoleNotFound => &ROLE_NOT_FOUND,
        ErrorCode::UserNotFound => &USER_NOT_FOUND,
        ErrorCode::EmailAlreadyExists => &EMAIL_ALREADY_EXISTS,
        ErrorCode::DuplicateImportData => &DUPLICATE_IMPORT_DATA,
        ErrorCode::CannotDeleteSelf => &CANNOT_DELETE_SELF,
        ErrorCode::CannotBanSelf => &CANNOT_BAN_SELF,
        ErrorCode::CannotModifySelf => &CANNOT_MODIFY_SELF,
        ErrorCode::TooManyUsersSelected => &TOO_MANY_USERS_SELECTED,
        ErrorCode::BulkOperationFailed => &BULK_OPERATION_FAILED,
        ErrorCode::FileTooLarge => &FILE_TOO_LARGE,
        ErrorCode::UnsupportedFileFormat => &UNSUPPORTED_FILE_FORMAT,
        ErrorCode::ImportFileInvalid => &IMPORT_FILE_INVALID,
        ErrorCode::ImportDataInvalid => &IMPORT_DATA_INVALID,
        ErrorCode::ExportLimitExceeded => &EXPORT_LIMIT_EXCEEDED,
        ErrorCode::InvalidExportFormat => &INVALID_EXPORT_FORMAT,
        ErrorCode::ExportFailed => &EXPORT_FAILED,
        ErrorCode::DatabaseError => &DATABASE_ERROR,
        ErrorCode::InternalServerError => &INTERNAL_SERVER_ERROR,
    }
}
