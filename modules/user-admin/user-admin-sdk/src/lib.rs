//! User Admin SDK
//!
//! Public contract of the `user-admin` module:
//! - Model types for users, roles, single-account changes, bulk operations, imports and exports
//! - `ErrorCode`, the closed error taxonomy shared by every endpoint

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod errors;
pub mod models;

pub use errors::{ErrorCode, ParseEnumError};
pub use models::{
    ActivityStatus, AuditInfo, BulkItemError, BulkItemWarning, BulkOperationKind,
    BulkOperationRequest, BulkOperationResult, ChangeNote, ExportFile, ExportFilters,
    ExportFormat, ExportRequest, ImportError, ImportOptions, ImportPreview, ImportPreviewRow,
    ImportReport, ImportSummary, ImportWarning, NewUser, PasswordSource, RawRow, Role,
    StatusFilter, User, UserDetails, UserPatch, UserUpdate,
};
