//! User Admin Module
//!
//! Administrative user management behind a REST API: bulk operations over
//! selected users, CSV/Excel import with validation and preview, filtered
//! export to CSV, XLSX, PDF or JSON, and email availability checks.
//!
//! ## Public API
//!
//! Contract types live in the `user-admin-sdk` crate and are re-exported here.
//! [`UserAdmin`] is the composition root used by the server binary.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
// === PUBLIC API (from SDK) ===
pub use user_admin_sdk::{
    BulkOperationKind, BulkOperationRequest, BulkOperationResult, ErrorCode, ExportFormat,
    ExportRequest, ImportOptions, ImportReport, User,
};

// === ERROR CATALOG ===
pub mod errors;

// === MODULE DEFINITION ===
pub mod module;
pub use module::UserAdmin;

// === INTERNAL MODULES ===
// WARNING: exposed for integration tests and the server binary only.
// External consumers should stick to the SDK types.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;

#[cfg(test)]
mod test_support;
