use std::io::Cursor;

use calamine::{Data, Range, Reader, Xls, Xlsx};
use serde_json::{Number, Value};
use time::{Date, Duration, Month, PrimitiveDateTime, Time};
use user_admin_sdk::RawRow;

use crate::domain::error::DomainError;
use crate::domain::import::upload::ParsedSheet;

/// OLE Compound Document magic bytes (used by .xls)
const OLE_MAGIC: [u8; 4] = [0xD0, 0xCF, 0x11, 0xE0];
/// ZIP archive magic bytes (used by .xlsx)
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Workbook container, told apart by content rather than by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcelFormat {
    Xls,
    Xlsx,
}

impl ExcelFormat {
    #[must_use]
    pub fn from_magic_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes.get(..4)? {
            magic if magic == OLE_MAGIC => Some(Self::Xls),
            magic if magic == ZIP_MAGIC => Some(Self::Xlsx),
            _ => None,
        }
    }
}

pub(super) fn read_workbook(bytes: &[u8]) -> Result<ParsedSheet, DomainError> {
    let format = ExcelFormat::from_magic_bytes(bytes)
        .ok_or_else(|| DomainError::import_file_invalid("not an Excel workbook"))?;

    let range = match format {
        ExcelFormat::Xls => {
            let mut workbook: Xls<_> = Xls::new(Cursor::new(bytes))
                .map_err(|e| DomainError::import_file_invalid(format!("failed to open XLS: {e}")))?;
            first_sheet(&mut workbook)?
        }
        ExcelFormat::Xlsx => {
            let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).map_err(|e| {
                DomainError::import_file_invalid(format!("failed to open XLSX: {e}"))
            })?;
            first_sheet(&mut workbook)?
        }
    };

    Ok(range_to_sheet(&range))
}

fn first_sheet<RS, R>(workbook: &mut R) -> Result<Range<Data>, DomainError>
where
    RS: std::io::Read + std::io::Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let name = workbook
        .sheet_names()
        .into_iter()
        .next()
        .ok_or_else(|| DomainError::import_file_invalid("workbook has no sheets"))?;
    workbook
        .worksheet_range(&name)
        .map_err(|e| DomainError::import_file_invalid(format!("failed to read sheet '{name}': {e}")))
}

fn range_to_sheet(range: &Range<Data>) -> ParsedSheet {
    let mut rows_iter = range.rows();
    let Some(header_row) = rows_iter.next() else {
        return ParsedSheet::default();
    };

    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| match cell_value(cell) {
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        })
        .collect();

    let rows = rows_iter
        .map(|cells| {
            headers
                .iter()
                .zip(cells)
                .filter(|(header, _)| !header.is_empty())
                .filter_map(|(header, cell)| cell_value(cell).map(|v| (header.clone(), v)))
                .collect::<RawRow>()
        })
        .filter(|row| !row.is_empty())
        .collect();

    ParsedSheet { headers, rows }
}

/// JSON value of one cell; `None` for empty cells.
fn cell_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty => None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| Value::String(s.to_owned()))
        }
        Data::Int(i) => Some(Value::from(*i)),
        Data::Float(f) => Some(float_value(*f)),
        Data::Bool(b) => Some(Value::Bool(*b)),
        Data::DateTime(dt) => Some(Value::String(excel_serial_to_text(dt.as_f64()))),
        Data::Error(e) => Some(Value::String(format!("#ERROR: {e:?}"))),
    }
}

/// Whole floats become integers so `12345678.0` reads back as `12345678`.
#[allow(clippy::cast_possible_truncation)]
fn float_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        Value::from(f as i64)
    } else {
        Number::from_f64(f).map_or(Value::Null, Value::Number)
    }
}

/// Excel serial dates count days from 1899-12-30.
#[allow(clippy::cast_possible_truncation)]
fn excel_serial_to_text(serial: f64) -> String {
    let epoch = Date::from_calendar_date(1899, Month::December, 30)
        .map(|d| PrimitiveDateTime::new(d, Time::MIDNIGHT));
    let Ok(epoch) = epoch else {
        return serial.to_string();
    };

    let seconds = (serial * 86_400.0).round() as i64;
    let Some(stamp) = epoch.checked_add(Duration::seconds(seconds)) else {
        return serial.to_string();
    };

    if stamp.time() == Time::MIDNIGHT {
        stamp.date().to_string()
    } else {
        let (h, m, s) = stamp.time().as_hms();
        format!("{}T{h:02}:{m:02}:{s:02}", stamp.date())
    }
}
