//! Export renderers, one per output format.
//!
//! Renderers are synchronous and CPU-bound; the service calls them from
//! `spawn_blocking`. Each receives the already-projected [`ExportTable`] and
//! returns the complete file body.

mod csv;
mod json;
mod pdf;
mod xlsx;

use user_admin_sdk::ExportFormat;

use crate::domain::error::DomainError;
use crate::domain::export::{ExportMetadata, ExportTable};
use crate::domain::ports::ExportRenderer;

/// [`ExportRenderer`] dispatching on the requested format.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatRenderer;

impl ExportRenderer for FormatRenderer {
    fn render(
        &self,
        format: ExportFormat,
        table: &ExportTable,
        metadata: &ExportMetadata,
    ) -> Result<Vec<u8>, DomainError> {
        let bytes = match format {
            ExportFormat::Csv => csv::render(table),
            ExportFormat::Excel => xlsx::render(table),
            ExportFormat::Pdf => pdf::render(table, metadata),
            ExportFormat::Json => json::render(table, metadata),
        }?;
        tracing::debug!(
            format = format.extension(),
            rows = table.records.len(),
            bytes = bytes.len(),
            "export rendered"
        );
        Ok(bytes)
    }
}
