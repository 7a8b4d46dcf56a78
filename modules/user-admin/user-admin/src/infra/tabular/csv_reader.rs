use csv::{ReaderBuilder, Trim};
use serde_json::Value;
use user_admin_sdk::RawRow;

use crate::domain::error::DomainError;
use crate::domain::import::upload::ParsedSheet;

pub(super) fn read_csv(bytes: &[u8]) -> Result<ParsedSheet, DomainError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| DomainError::import_file_invalid(format!("unreadable CSV header: {e}")))?
        .iter()
        .map(str::to_owned)
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(DomainError::import_file_invalid("CSV file has no header row"));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| {
            let line = e.position().map_or(0, |p| p.line());
            DomainError::import_file_invalid(format!("malformed CSV at line {line}: {e}"))
        })?;

        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .filter(|(header, cell)| !header.is_empty() && !cell.is_empty())
            .map(|(header, cell)| (header.clone(), Value::String(cell.to_owned())))
            .collect();

        if !row.is_empty() {
            rows.push(row);
        }
    }

    Ok(ParsedSheet { headers, rows })
}
