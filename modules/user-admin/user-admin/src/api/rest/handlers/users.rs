use std::sync::Arc;

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use time::OffsetDateTime;
use tracing::info;
use user_admin_sdk::{ChangeNote, NewUser};
use uuid::Uuid;

use super::ApiResult;
use crate::api::rest::dto::{
    CheckEmailDto, CheckEmailQuery, CreateUserReq, DeleteUserDto, PatchUserDto, UpdateUserDto,
    UpdateUserReq, UserAbilitiesDto, UserBodyDto, UserDetailDto, UserDto, UserListDto,
};
use crate::domain::error::DomainError;
use crate::domain::security::{Action, Resource, SecurityContext};
use crate::domain::service::Service;

const NO_STORE: &str = "no-cache, no-store, must-revalidate";

fn parse_user_id(raw: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(raw.trim()).map_err(|_| DomainError::invalid_user_id(raw))
}

pub(super) async fn list_users(
    ctx: SecurityContext,
    svc: Arc<Service>,
) -> ApiResult<Json<UserListDto>> {
    let users = svc.list_users(&ctx).await?;
    let now = OffsetDateTime::now_utc();
    Ok(Json(UserListDto {
        users: users.into_iter().map(|u| UserDto::at(u, now)).collect(),
    }))
}

pub(super) async fn get_user(
    ctx: SecurityContext,
    svc: Arc<Service>,
    id: &str,
) -> ApiResult<Json<UserDetailDto>> {
    ctx.ensure(Action::Read, Resource::User)?;
    let id = parse_user_id(id)?;
    let details = svc.get_user(&ctx, id).await?;

    let is_self = ctx.subject_id() == id;
    let can_edit = ctx.can(Action::Update, Resource::User);
    let metadata = UserAbilitiesDto {
        can_edit,
        can_delete: ctx.can(Action::Delete, Resource::User) && !is_self,
        can_toggle_status: can_edit && !is_self,
    };
    Ok(Json(UserDetailDto {
        user: UserDto::from(details),
        metadata,
    }))
}

pub(super) async fn create_user(
    ctx: SecurityContext,
    svc: Arc<Service>,
    req_body: CreateUserReq,
) -> ApiResult<Response> {
    ctx.ensure(Action::Create, Resource::User)?;
    let new_user = NewUser::try_from(req_body)?;
    let details = svc.create_user(&ctx, new_user).await?;

    info!(user_id = %details.user.id, "user created");
    let body = UserBodyDto {
        user: UserDto::from(details),
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// Full-form edit. Any `action` or `reason` in the body is ignored.
pub(super) async fn update_user(
    ctx: SecurityContext,
    svc: Arc<Service>,
    id: &str,
    req_body: UpdateUserReq,
) -> ApiResult<Json<UpdateUserDto>> {
    ctx.ensure(Action::Update, Resource::User)?;
    let id = parse_user_id(id)?;
    let (patch, _) = req_body.into_parts()?;
    let update = svc
        .update_user(&ctx, id, patch, ChangeNote::default())
        .await?;

    info!(
        user_id = %id,
        email_changed = update.email_changed(),
        role_changed = update.role_changed(),
        status_changed = update.status_changed(),
        "user updated"
    );
    Ok(Json(UpdateUserDto::from(update)))
}

/// Quick change, typically a status toggle, labelled for the audit trail.
pub(super) async fn patch_user(
    ctx: SecurityContext,
    svc: Arc<Service>,
    id: &str,
    req_body: UpdateUserReq,
) -> ApiResult<Json<PatchUserDto>> {
    ctx.ensure(Action::Update, Resource::User)?;
    let id = parse_user_id(id)?;
    let (patch, note) = req_body.into_parts()?;
    let update = svc.update_user(&ctx, id, patch, note).await?;
    Ok(Json(PatchUserDto::from(update)))
}

pub(super) async fn delete_user(
    ctx: SecurityContext,
    svc: Arc<Service>,
    id: &str,
) -> ApiResult<Json<DeleteUserDto>> {
    ctx.ensure(Action::Delete, Resource::User)?;
    let id = parse_user_id(id)?;
    let user = svc.delete_user(&ctx, id).await?;

    info!(user_id = %id, "user deleted");
    Ok(Json(DeleteUserDto::from(user)))
}

pub(super) async fn check_email(
    ctx: SecurityContext,
    svc: Arc<Service>,
    query: CheckEmailQuery,
) -> ApiResult<Response> {
    let email = query
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| DomainError::validation("email", "Email is required"))?;

    let exclude = match query.exclude_user_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(Uuid::parse_str(raw).map_err(|_| {
            DomainError::validation("excludeUserId", format!("Invalid user id '{raw}'"))
        })?),
    };

    let availability = svc.check_email(&ctx, &email, exclude).await?;

    let mut resp = Json(CheckEmailDto::from(availability)).into_response();
    resp.headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
    Ok(resp)
}
