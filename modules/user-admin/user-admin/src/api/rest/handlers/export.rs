use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use tracing::info;
use user_admin_sdk::ExportRequest;

use super::ApiResult;
use crate::api::rest::dto::ExportQuery;
use crate::domain::error::DomainError;
use crate::domain::security::{Action, Resource, SecurityContext};
use crate::domain::service::Service;

pub const X_EXPORT_TIME: HeaderName = HeaderName::from_static("x-export-time");
pub const X_EXPORT_RECORDS: HeaderName = HeaderName::from_static("x-export-records");

fn header_value(value: String) -> Result<HeaderValue, DomainError> {
    HeaderValue::try_from(value).map_err(|e| DomainError::internal(format!("bad header value: {e}")))
}

pub(super) async fn export_users(
    ctx: SecurityContext,
    svc: Arc<Service>,
    query: ExportQuery,
) -> ApiResult<Response> {
    ctx.ensure(Action::Read, Resource::User)?;
    let request = ExportRequest::try_from(query)?;
    let file = svc.export_users(&ctx, request).await?;

    info!(
        filename = %file.filename,
        records = file.records,
        bytes = file.bytes.len(),
        "export ready"
    );

    let mut resp = file.bytes.into_response();
    let headers = resp.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(file.content_type));
    headers.insert(
        header::CONTENT_DISPOSITION,
        header_value(format!("attachment; filename=\"{}\"", file.filename))?,
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(X_EXPORT_TIME, header_value(file.elapsed.as_millis().to_string())?);
    headers.insert(X_EXPORT_RECORDS, header_value(file.records.to_string())?);

    Ok(resp)
}
