use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::info;

use super::ApiResult;
use crate::api::rest::dto::{ImportOptionsDto, ImportPreviewDto, ImportReportDto};
use crate::domain::error::DomainError;
use crate::domain::import::upload::ImportUpload;
use crate::domain::security::{Action, Resource, SecurityContext};
use crate::domain::service::Service;

/// Parts of an import form that the handlers understand.
#[derive(Default)]
struct ImportForm {
    file: Option<ImportUpload>,
    options: Option<String>,
    field_mapping: Option<String>,
}

fn multipart_err(e: &MultipartError, max: usize) -> DomainError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        DomainError::FileTooLarge {
            size: max.saturating_add(1),
            max,
        }
    } else {
        DomainError::validation("file", format!("Malformed multipart body: {}", e.body_text()))
    }
}

async fn read_form(mut multipart: Multipart, max_size: usize) -> Result<ImportForm, DomainError> {
    let mut form = ImportForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_err(&e, max_size))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await.map_err(|e| multipart_err(&e, max_size))?;
                form.file = Some(ImportUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            Some("options") => {
                form.options = Some(field.text().await.map_err(|e| multipart_err(&e, max_size))?);
            }
            Some("fieldMapping") => {
                form.field_mapping =
                    Some(field.text().await.map_err(|e| multipart_err(&e, max_size))?);
            }
            other => tracing::debug!(field = ?other, "ignoring multipart field"),
        }
    }
    Ok(form)
}

fn parse_options(raw: Option<&str>) -> Result<ImportOptionsDto, DomainError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(ImportOptionsDto::default()),
        Some(text) => serde_json::from_str(text)
            .map_err(|e| DomainError::validation("options", format!("Invalid import options: {e}"))),
    }
}

fn parse_mapping(raw: Option<&str>) -> Result<HashMap<String, String>, DomainError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(HashMap::new()),
        Some(text) => serde_json::from_str(text)
            .map_err(|e| DomainError::validation("fieldMapping", format!("Invalid field mapping: {e}"))),
    }
}

pub(super) async fn import_users(
    ctx: SecurityContext,
    svc: Arc<Service>,
    multipart: Multipart,
) -> ApiResult<Response> {
    // Reject before the upload is buffered.
    ctx.ensure(Action::Create, Resource::User)?;
    let form = read_form(multipart, svc.config().import_max_file_size).await?;
    let upload = form
        .file
        .ok_or_else(|| DomainError::validation("file", "No file provided"))?;
    let options = parse_options(form.options.as_deref())?;

    let report = svc.import_users(&ctx, upload, options.into()).await?;
    info!(
        total = report.summary.total_rows,
        created = report.summary.created,
        updated = report.summary.updated,
        skipped = report.summary.skipped,
        errors = report.errors.len(),
        "import finished"
    );

    Ok(Json(ImportReportDto::from(report)).into_response())
}

pub(super) async fn preview_import(
    ctx: SecurityContext,
    svc: Arc<Service>,
    multipart: Multipart,
) -> ApiResult<Response> {
    // Reject before the upload is buffered.
    ctx.ensure(Action::Create, Resource::User)?;
    let form = read_form(multipart, svc.config().import_max_file_size).await?;
    let upload = form
        .file
        .ok_or_else(|| DomainError::validation("file", "No file provided"))?;
    let mapping = parse_mapping(form.field_mapping.as_deref())?;

    let preview = svc.preview_import(&ctx, upload, mapping).await?;
    Ok(Json(ImportPreviewDto::from(preview)).into_response())
}
