use std::sync::Arc;

use axum::Extension;
use axum::extract::{Multipart, Path, Query};
use axum::response::Response;
use tracing::field::Empty;

use crate::api::rest::dto::{
    BulkOperationReq, CheckEmailQuery, CreateUserReq, DeleteUserDto, ExportQuery, PatchUserDto,
    UpdateUserDto, UpdateUserReq, UserDetailDto, UserListDto,
};
use crate::domain::security::SecurityContext;
use crate::domain::service::Service;

use admin_errors::ErrorEnvelope;
use axum::Json;

mod bulk;
mod export;
mod import;
mod users;

pub type ApiResult<T> = Result<T, ErrorEnvelope>;

// ==================== Bulk Handlers ====================

/// Apply ban, unban, delete or role assignment to many users at once
#[tracing::instrument(
    skip(svc, ctx, req_body),
    fields(
        operation = %req_body.operation,
        count = req_body.selected_user_ids.len(),
        request_id = Empty,
        requester.id = %ctx.subject_id()
    )
)]
pub async fn bulk_operation(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    Json(req_body): Json<BulkOperationReq>,
) -> ApiResult<Response> {
    bulk::bulk_operation(ctx, svc, req_body).await
}

// ==================== Import Handlers ====================

/// Import users from an uploaded CSV or Excel file
#[tracing::instrument(
    skip(svc, ctx, multipart),
    fields(request_id = Empty, requester.id = %ctx.subject_id())
)]
pub async fn import_users(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    multipart: Multipart,
) -> ApiResult<Response> {
    import::import_users(ctx, svc, multipart).await
}

/// Preview an upload: headers, first rows, validation and a suggested mapping
#[tracing::instrument(
    skip(svc, ctx, multipart),
    fields(request_id = Empty, requester.id = %ctx.subject_id())
)]
pub async fn preview_import(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    multipart: Multipart,
) -> ApiResult<Response> {
    import::preview_import(ctx, svc, multipart).await
}

// ==================== Export Handlers ====================

/// Export the filtered user list as CSV, Excel, PDF or JSON
#[tracing::instrument(
    skip(svc, ctx, query),
    fields(
        format = query.format.as_deref().unwrap_or("csv"),
        request_id = Empty,
        requester.id = %ctx.subject_id()
    )
)]
pub async fn export_users(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    export::export_users(ctx, svc, query).await
}

// ==================== User Handlers ====================

/// List every account with its role
#[tracing::instrument(
    skip(svc, ctx),
    fields(request_id = Empty, requester.id = %ctx.subject_id())
)]
pub async fn list_users(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
) -> ApiResult<Json<UserListDto>> {
    users::list_users(ctx, svc).await
}

/// Get one account and what the caller may do with it
#[tracing::instrument(
    skip(svc, ctx),
    fields(user.id = %id, request_id = Empty, requester.id = %ctx.subject_id())
)]
pub async fn get_user(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserDetailDto>> {
    users::get_user(ctx, svc, &id).await
}

/// Create an account
#[tracing::instrument(
    skip(svc, ctx, req_body),
    fields(request_id = Empty, requester.id = %ctx.subject_id())
)]
pub async fn create_user(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    Json(req_body): Json<CreateUserReq>,
) -> ApiResult<Response> {
    users::create_user(ctx, svc, req_body).await
}

/// Replace the editable fields of an account
#[tracing::instrument(
    skip(svc, ctx, req_body),
    fields(user.id = %id, request_id = Empty, requester.id = %ctx.subject_id())
)]
pub async fn update_user(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
    Json(req_body): Json<UpdateUserReq>,
) -> ApiResult<Json<UpdateUserDto>> {
    users::update_user(ctx, svc, &id, req_body).await
}

/// Change a few fields of an account, with an audit label
#[tracing::instrument(
    skip(svc, ctx, req_body),
    fields(user.id = %id, request_id = Empty, requester.id = %ctx.subject_id())
)]
pub async fn patch_user(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
    Json(req_body): Json<UpdateUserReq>,
) -> ApiResult<Json<PatchUserDto>> {
    users::patch_user(ctx, svc, &id, req_body).await
}

/// Delete an account other than the caller's
#[tracing::instrument(
    skip(svc, ctx),
    fields(user.id = %id, request_id = Empty, requester.id = %ctx.subject_id())
)]
pub async fn delete_user(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteUserDto>> {
    users::delete_user(ctx, svc, &id).await
}

/// Check whether an email address is free
#[tracing::instrument(
    skip(svc, ctx, query),
    fields(request_id = Empty, requester.id = %ctx.subject_id())
)]
pub async fn check_email(
    Extension(ctx): Extension<SecurityContext>,
    Extension(svc): Extension<Arc<Service>>,
    Query(query): Query<CheckEmailQuery>,
) -> ApiResult<Response> {
    users::check_email(ctx, svc, query).await
}
