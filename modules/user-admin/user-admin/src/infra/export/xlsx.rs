use std::io::Cursor;

use umya_spreadsheet::{new_file_empty_worksheet, writer};

use crate::domain::error::DomainError;
use crate::domain::export::ExportTable;

const SHEET_NAME: &str = "Users";

/// Header row in bold, one row per record, or a "No data available" line.
pub(super) fn render(table: &ExportTable) -> Result<Vec<u8>, DomainError> {
    let mut book = new_file_empty_worksheet();
    let sheet = book
        .new_sheet(SHEET_NAME)
        .map_err(|e| DomainError::export_failed(format!("XLSX sheet: {e}")))?;

    for (col, header) in (1u32..).zip(table.headers()) {
        sheet.get_cell_mut((col, 1)).set_value(header);
        sheet.get_style_mut((col, 1)).get_font_mut().set_bold(true);
    }

    if table.is_empty() {
        sheet.get_cell_mut((1, 2)).set_value("No data available");
    } else {
        for (row, cells) in (2u32..).zip(table.text_rows()) {
            for (col, text) in (1u32..).zip(cells) {
                sheet.get_cell_mut((col, row)).set_value(text);
            }
        }
    }

    let mut out = Cursor::new(Vec::new());
    writer::xlsx::write_writer(&book, &mut out)
        .map_err(|e| DomainError::export_failed(format!("XLSX write: {e}")))?;
    Ok(out.into_inner())
}
