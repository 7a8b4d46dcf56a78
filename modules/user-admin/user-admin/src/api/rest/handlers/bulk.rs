use std::sync::Arc;

use axum::Json;
use axum::response::{IntoResponse, Response};
use tracing::info;
use user_admin_sdk::BulkOperationRequest;

use super::ApiResult;
use crate::api::rest::dto::{BulkOperationReq, BulkOperationResultDto};
use crate::domain::security::SecurityContext;
use crate::domain::service::Service;

pub(super) async fn bulk_operation(
    ctx: SecurityContext,
    svc: Arc<Service>,
    req_body: BulkOperationReq,
) -> ApiResult<Response> {
    let request = BulkOperationRequest::try_from(req_body)?;
    let result = svc.bulk_operation(&ctx, request).await?;

    info!(
        operation = %result.operation,
        total = result.total,
        success = result.success,
        failed = result.failed,
        skipped = result.skipped,
        "bulk operation completed"
    );

    // Per-user failures are part of the body; the request itself succeeded.
    Ok(Json(BulkOperationResultDto::from(result)).into_response())
}
