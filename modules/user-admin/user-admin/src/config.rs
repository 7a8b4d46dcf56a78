use serde::{Deserialize, Serialize};

use crate::domain::error::StorageErrorKind;

/// Configuration for the `user-admin` module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserAdminConfig {
    /// Upper bound on identifiers accepted by one bulk request.
    #[serde(default = "default_max_bulk_selection")]
    pub max_bulk_selection: usize,
    /// Upper bound on the raw upload size, in bytes.
    #[serde(default = "default_import_max_file_size")]
    pub import_max_file_size: usize,
    #[serde(default = "default_import_max_records")]
    pub import_max_records: usize,
    /// Rows returned by the import preview endpoint.
    #[serde(default = "default_import_preview_rows")]
    pub import_preview_rows: usize,
    /// Rows echoed back by a validate-only import.
    #[serde(default = "default_validate_only_preview_rows")]
    pub validate_only_preview_rows: usize,
    #[serde(default = "default_export_max_records")]
    pub export_max_records: u64,
    #[serde(default = "default_generated_password_length")]
    pub generated_password_length: usize,
    /// Storage error classes that abort the remainder of a batch.
    #[serde(default = "default_fatal_storage_errors")]
    pub fatal_storage_errors: Vec<StorageErrorKind>,
}

impl Default for UserAdminConfig {
    fn default() -> Self {
        Self {
            max_bulk_selection: default_max_bulk_selection(),
            import_max_file_size: default_import_max_file_size(),
            import_max_records: default_import_max_records(),
            import_preview_rows: default_import_preview_rows(),
            validate_only_preview_rows: default_validate_only_preview_rows(),
            export_max_records: default_export_max_records(),
            generated_password_length: default_generated_password_length(),
            fatal_storage_errors: default_fatal_storage_errors(),
        }
    }
}

impl UserAdminConfig {
    #[must_use]
    pub fn is_fatal(&self, kind: StorageErrorKind) -> bool {
        self.fatal_storage_errors.contains(&kind)
    }
}

fn default_max_bulk_selection() -> usize {
    1000
}

fn default_import_max_file_size() -> usize {
    10 * 1024 * 1024
}

fn default_import_max_records() -> usize {
    5000
}

fn default_import_preview_rows() -> usize {
    10
}

fn default_validate_only_preview_rows() -> usize {
    5
}

fn default_export_max_records() -> u64 {
    10_000
}

fn default_generated_password_length() -> usize {
    12
}

fn default_fatal_storage_errors() -> Vec<StorageErrorKind> {
    vec![StorageErrorKind::Connection, StorageErrorKind::Timeout]
}
