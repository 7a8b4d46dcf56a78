//! A plain Helvetica text table, built object by object with `lopdf`.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use time::macros::format_description;

use crate::domain::error::DomainError;
use crate::domain::export::{ExportMetadata, ExportTable};

const TITLE: &str = "User Export Report";
const MARGIN: f32 = 40.0;
const ROW_HEIGHT: f32 = 14.0;
const CELL_FONT_SIZE: f32 = 8.0;
const CELL_MAX_CHARS: usize = 30;
/// More columns than this switch the page to landscape.
const PORTRAIT_MAX_FIELDS: usize = 6;

#[derive(Debug, Clone, Copy)]
struct PageGeometry {
    width: f32,
    height: f32,
}

impl PageGeometry {
    fn for_fields(count: usize) -> Self {
        if count > PORTRAIT_MAX_FIELDS {
            Self {
                width: 842.0,
                height: 595.0,
            }
        } else {
            Self {
                width: 595.0,
                height: 842.0,
            }
        }
    }

    /// Table rows that fit below the page header and above the footer.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn rows_per_page(self, first_page: bool) -> usize {
        let header_space = if first_page { 90.0 } else { 30.0 };
        let usable = self.height - 2.0 * MARGIN - header_space - ROW_HEIGHT;
        ((usable / ROW_HEIGHT).floor() as usize).max(1)
    }
}

/// Cell text longer than the column allows is cut to 27 chars plus "...".
fn truncate(text: &str) -> String {
    if text.chars().count() > CELL_MAX_CHARS {
        let mut cut: String = text.chars().take(CELL_MAX_CHARS - 3).collect();
        cut.push_str("...");
        cut
    } else {
        text.to_owned()
    }
}

/// Standard fonts only cover Latin-1; anything else prints as '?'.
fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

fn text_at(ops: &mut Vec<Operation>, font: &str, size: f32, x: f32, y: f32, text: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::string_literal(latin1(text))],
    ));
    ops.push(Operation::new("ET", vec![]));
}

fn rule(ops: &mut Vec<Operation>, x1: f32, x2: f32, y: f32) {
    ops.push(Operation::new("w", vec![0.5f32.into()]));
    ops.push(Operation::new("m", vec![x1.into(), y.into()]));
    ops.push(Operation::new("l", vec![x2.into(), y.into()]));
    ops.push(Operation::new("S", vec![]));
}

struct PageInput<'a> {
    number: usize,
    count: usize,
    rows: &'a [Vec<String>],
    generated_on: &'a str,
    total: u64,
}

fn page_operations(geo: PageGeometry, headers: &[String], page: &PageInput<'_>) -> Vec<Operation> {
    let mut ops = Vec::new();
    let left = MARGIN;
    let right = geo.width - MARGIN;
    let mut y = geo.height - MARGIN;

    if page.number == 1 {
        text_at(&mut ops, "F2", 16.0, left, y - 16.0, TITLE);
        y -= 36.0;
        text_at(
            &mut ops,
            "F1",
            9.0,
            left,
            y,
            &format!("Generated on: {}", page.generated_on),
        );
        y -= 14.0;
        text_at(
            &mut ops,
            "F1",
            9.0,
            left,
            y,
            &format!("Total records: {}", page.total),
        );
        y -= 40.0;
    } else {
        y -= 30.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let column_width = (right - left) / headers.len().max(1) as f32;

    let mut x = left;
    for header in headers {
        text_at(&mut ops, "F2", CELL_FONT_SIZE, x, y, &truncate(header));
        x += column_width;
    }
    rule(&mut ops, left, right, y - 4.0);
    y -= ROW_HEIGHT;

    if page.rows.is_empty() && page.number == 1 {
        text_at(&mut ops, "F1", CELL_FONT_SIZE + 2.0, left, y, "No data available");
    }

    for row in page.rows {
        let mut x = left;
        for cell in row {
            text_at(&mut ops, "F1", CELL_FONT_SIZE, x, y, &truncate(cell));
            x += column_width;
        }
        y -= ROW_HEIGHT;
    }

    text_at(
        &mut ops,
        "F1",
        8.0,
        right - 60.0,
        MARGIN / 2.0,
        &format!("Page {} of {}", page.number, page.count),
    );
    ops
}

/// Split rows into page-sized chunks; the first page holds fewer rows.
fn paginate(rows: &[Vec<String>], geo: PageGeometry) -> Vec<&[Vec<String>]> {
    let first = geo.rows_per_page(true).min(rows.len());
    let (head, rest) = rows.split_at(first);
    let mut pages = vec![head];
    pages.extend(rest.chunks(geo.rows_per_page(false)));
    pages
}

pub(super) fn render(table: &ExportTable, metadata: &ExportMetadata) -> Result<Vec<u8>, DomainError> {
    let headers = table.headers();
    let rows: Vec<Vec<String>> = table.text_rows().collect();
    let geo = PageGeometry::for_fields(headers.len());
    let generated_on = metadata
        .export_date
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second] UTC"
        ))
        .map_err(|e| DomainError::export_failed(format!("PDF date: {e}")))?;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });

    let chunks = paginate(&rows, geo);
    let mut kids: Vec<Object> = Vec::with_capacity(chunks.len());
    for (index, chunk) in chunks.iter().enumerate() {
        let page = PageInput {
            number: index + 1,
            count: chunks.len(),
            rows: chunk,
            generated_on: &generated_on,
            total: metadata.total_records,
        };
        let content = Content {
            operations: page_operations(geo, &headers, &page),
        };
        let encoded = content
            .encode()
            .map_err(|e| DomainError::export_failed(format!("PDF content: {e}")))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = i64::try_from(kids.len())
        .map_err(|e| DomainError::export_failed(format!("PDF page count: {e}")))?;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::from(geo.width),
                Object::from(geo.height),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| DomainError::export_failed(format!("PDF write: {e}")))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::export::fixtures;

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|w| w == needle.as_bytes())
    }

    #[test]
    fn long_cells_are_truncated() {
        let long = "a".repeat(40);
        let cut = truncate(&long);
        assert_eq!(cut.chars().count(), 30);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate("short"), "short");
        assert_eq!(truncate(&"b".repeat(30)), "b".repeat(30));
    }

    #[test]
    fn wide_tables_go_landscape() {
        let portrait = PageGeometry::for_fields(6);
        let landscape = PageGeometry::for_fields(7);
        assert!(portrait.height > portrait.width);
        assert!(landscape.width > landscape.height);
    }

    #[test]
    fn single_page_report_carries_title_and_rows() {
        let table = fixtures::table(3);
        let bytes = render(&table, &fixtures::metadata(&table)).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        assert!(contains(&bytes, "(User Export Report)"));
        assert!(contains(&bytes, "(Generated on: 2024-05-01 10:30:00 UTC)"));
        assert!(contains(&bytes, "(user2@example.com)"));
    }

    #[test]
    fn many_rows_paginate() {
        let table = fixtures::table(200);
        let bytes = render(&table, &fixtures::metadata(&table)).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() > 1);
        assert!(contains(&bytes, "(user199@example.com)"));
    }

    #[test]
    fn empty_export_still_renders_one_page() {
        let table = fixtures::table(0);
        let bytes = render(&table, &fixtures::metadata(&table)).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        assert!(contains(&bytes, "(No data available)"));
    }
}
