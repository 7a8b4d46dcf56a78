//! Upload parsing: CSV through `csv`, Excel workbooks through `calamine`.
//!
//! Both readers produce a [`ParsedSheet`]: the first row supplies the headers and
//! every following non-blank row becomes a map from header to cell value. Empty
//! cells are left out of the map so the row validator sees them as missing.

mod csv_reader;
mod xlsx_reader;

pub use xlsx_reader::ExcelFormat;

use crate::domain::error::DomainError;
use crate::domain::import::upload::{ParsedSheet, UploadKind};
use crate::domain::ports::TabularReader;

/// [`TabularReader`] dispatching on the upload kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadsheetReader;

impl TabularReader for SpreadsheetReader {
    fn read(&self, kind: UploadKind, bytes: &[u8]) -> Result<ParsedSheet, DomainError> {
        let sheet = match kind {
            UploadKind::Csv => csv_reader::read_csv(bytes)?,
            UploadKind::Spreadsheet => xlsx_reader::read_workbook(bytes)?,
        };
        tracing::debug!(
            ?kind,
            headers = sheet.headers.len(),
            rows = sheet.rows.len(),
            "upload parsed"
        );
        Ok(sheet)
    }
}
