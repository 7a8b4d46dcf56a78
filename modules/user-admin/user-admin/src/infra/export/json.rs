use serde_json::{Value, json};
use time::format_description::well_known::Rfc3339;

use crate::domain::error::DomainError;
use crate::domain::export::{ExportMetadata, ExportTable};

pub(super) fn render(table: &ExportTable, metadata: &ExportMetadata) -> Result<Vec<u8>, DomainError> {
    let export_date = metadata
        .export_date
        .format(&Rfc3339)
        .map_err(|e| DomainError::export_failed(format!("export date: {e}")))?;

    let body = json!({
        "data": table.records.iter().cloned().map(Value::Object).collect::<Vec<_>>(),
        "metadata": {
            "totalRecords": metadata.total_records,
            "exportedRecords": metadata.exported_records,
            "exportDate": export_date,
            "filters": metadata.filters,
            "fields": metadata.fields,
        },
    });

    serde_json::to_vec_pretty(&body).map_err(|e| DomainError::export_failed(format!("JSON: {e}")))
}
