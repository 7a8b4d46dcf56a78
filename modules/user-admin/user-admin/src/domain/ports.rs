//! Outbound collaborators the domain calls through.

use async_trait::async_trait;
use user_admin_sdk::ExportFormat;

use crate::domain::error::DomainError;
use crate::domain::export::{ExportMetadata, ExportTable};
use crate::domain::import::upload::{ParsedSheet, UploadKind};

/// Password hashing collaborator. Implementations may be CPU-heavy and are awaited.
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, plain: String) -> Result<String, DomainError>;
}

/// Turns an uploaded file into header-keyed rows.
pub trait TabularReader: Send + Sync {
    /// # Errors
    /// [`DomainError::ImportFileInvalid`] when the bytes cannot be read as `kind`.
    fn read(&self, kind: UploadKind, bytes: &[u8]) -> Result<ParsedSheet, DomainError>;
}

/// Renders an export table into the bytes of one file format.
pub trait ExportRenderer: Send + Sync {
    /// # Errors
    /// [`DomainError::ExportFailed`] when the formatting library fails.
    fn render(
        &self,
        format: ExportFormat,
        table: &ExportTable,
        metadata: &ExportMetadata,
    ) -> Result<Vec<u8>, DomainError>;
}
