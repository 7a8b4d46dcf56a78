use crate::domain::error::DomainError;
use crate::domain::export::ExportTable;

pub(super) fn render(table: &ExportTable) -> Result<Vec<u8>, DomainError> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer
        .write_record(table.headers())
        .map_err(|e| DomainError::export_failed(format!("CSV header: {e}")))?;
    for row in table.text_rows() {
        writer
            .write_record(&row)
            .map_err(|e| DomainError::export_failed(format!("CSV row: {e}")))?;
    }
    writer
        .into_inner()
        .map_err(|e| DomainError::export_failed(format!("CSV flush: {e}")))
}
