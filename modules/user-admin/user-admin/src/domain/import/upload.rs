//! Uploaded import files: size and format checks before parsing.

use std::path::Path;

use user_admin_sdk::RawRow;

use crate::domain::error::DomainError;

pub const CSV_MIME: &str = "text/csv";
pub const XLS_MIME: &str = "application/vnd.ms-excel";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Parser family for an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Csv,
    /// `.xls` or `.xlsx`; the reader tells them apart by magic bytes.
    Spreadsheet,
}

/// A file received for import or preview.
#[derive(Debug, Clone, Default)]
pub struct ImportUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImportUpload {
    /// Fail with `FileTooLarge` when the upload exceeds `max` bytes.
    ///
    /// # Errors
    /// [`DomainError::FileTooLarge`].
    pub fn ensure_size(&self, max: usize) -> Result<(), DomainError> {
        if self.bytes.len() > max {
            return Err(DomainError::FileTooLarge {
                size: self.bytes.len(),
                max,
            });
        }
        Ok(())
    }

    /// Decide the parser from the file extension, falling back to the declared content type.
    ///
    /// # Errors
    /// [`DomainError::UnsupportedFileFormat`] when neither is recognized.
    pub fn kind(&self) -> Result<UploadKind, DomainError> {
        let extension = self
            .file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("csv") => return Ok(UploadKind::Csv),
            Some("xls" | "xlsx") => return Ok(UploadKind::Spreadsheet),
            _ => {}
        }

        let mime = self
            .content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase());

        match mime.as_deref() {
            Some(CSV_MIME) => Ok(UploadKind::Csv),
            Some(XLS_MIME | XLSX_MIME) => Ok(UploadKind::Spreadsheet),
            _ => Err(DomainError::unsupported_file_format(format!(
                "expected CSV or Excel, got {} ({})",
                self.file_name.as_deref().unwrap_or("unnamed file"),
                self.content_type.as_deref().unwrap_or("no content type"),
            ))),
        }
    }
}

/// Rows read from an upload, keyed by the header row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSheet {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}
