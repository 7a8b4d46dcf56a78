use std::collections::HashMap;

use time::macros::format_description;
use time::{Date, OffsetDateTime};
use user_admin_sdk::{
    AuditInfo, ChangeNote, ErrorCode, NewUser, Role, User, UserDetails, UserPatch, UserUpdate,
};
use uuid::Uuid;

use super::Service;
use crate::domain::error::{DomainError, FieldError};
use crate::domain::import::schema::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MIN_PASSWORD_LEN, is_valid_email, normalize_email,
};
use crate::domain::repos::{NewUserRecord, UserChanges, UserQuery};
use crate::domain::security::{Action, Resource, SecurityContext};

const MAX_EMAIL_LEN: usize = 255;
const MAX_PASSWORD_LEN: usize = 128;
const MAX_WEBHOOK_LEN: usize = 500;

/// Starting balance of accounts created by an administrator.
const DEFAULT_COIN: i64 = 1000;
const DEFAULT_LOCALE: &str = "en";
const DEFAULT_GROUP_ID: i32 = 1;

/// Answer to an email availability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailAvailability {
    Available { email: String },
    Taken { email: String },
    InvalidFormat { email: String },
}

impl EmailAvailability {
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }

    #[must_use]
    pub fn email(&self) -> &str {
        match self {
            Self::Available { email } | Self::Taken { email } | Self::InvalidFormat { email } => {
                email
            }
        }
    }
}

pub(super) async fn check_email(
    svc: &Service,
    ctx: &SecurityContext,
    email: &str,
    exclude: Option<Uuid>,
) -> Result<EmailAvailability, DomainError> {
    ctx.ensure(Action::Read, Resource::User)?;

    let email = normalize_email(email);
    if email.is_empty() {
        return Err(DomainError::validation("email", "Email is required"));
    }
    if !is_valid_email(&email) {
        return Ok(EmailAvailability::InvalidFormat { email });
    }

    let taken = svc.users.email_taken(&email, exclude).await?;
    tracing::debug!(taken, "email availability checked");
    Ok(if taken {
        EmailAvailability::Taken { email }
    } else {
        EmailAvailability::Available { email }
    })
}

// ==================== Field checks ====================

fn check_email_field(raw: &str, errors: &mut Vec<FieldError>) -> String {
    let email = normalize_email(raw);
    if email.is_empty() {
        errors.push(FieldError::new("email", ErrorCode::ValidationError, "Email is required"));
    } else if !is_valid_email(&email) {
        errors.push(FieldError::new(
            "email",
            ErrorCode::InvalidEmailFormat,
            "Invalid email format",
        ));
    } else if email.chars().count() > MAX_EMAIL_LEN {
        errors.push(FieldError::new(
            "email",
            ErrorCode::ValidationError,
            format!("Email must be at most {MAX_EMAIL_LEN} characters"),
        ));
    }
    email
}

fn check_name(
    field: &'static str,
    label: &str,
    raw: &str,
    errors: &mut Vec<FieldError>,
) -> String {
    let name = raw.trim().to_owned();
    if name.is_empty() {
        errors.push(FieldError::new(
            field,
            ErrorCode::ValidationError,
            format!("{label} is required"),
        ));
    } else if name.chars().count() > MAX_NAME_LEN {
        errors.push(FieldError::new(
            field,
            ErrorCode::ValidationError,
            format!("{label} must be at most {MAX_NAME_LEN} characters"),
        ));
    }
    name
}

/// Length is an error; missing character classes only warn.
fn check_password(password: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        errors.push(FieldError::new(
            "password",
            ErrorCode::WeakPassword,
            format!(
                "Password must be between {MIN_PASSWORD_LEN} and {MAX_PASSWORD_LEN} characters"
            ),
        ));
        return None;
    }
    let has = |class: fn(char) -> bool| password.chars().any(class);
    let mixed =
        has(char::is_uppercase) && has(char::is_lowercase) && has(|c: char| c.is_ascii_digit());
    (!mixed).then(|| {
        "Password should contain uppercase and lowercase letters and a digit".to_owned()
    })
}

fn check_len(
    field: &'static str,
    label: &str,
    value: Option<&str>,
    max: usize,
    errors: &mut Vec<FieldError>,
) {
    if value.is_some_and(|v| v.chars().count() > max) {
        errors.push(FieldError::new(
            field,
            ErrorCode::ValidationError,
            format!("{label} must be at most {max} characters"),
        ));
    }
}

fn check_birthday(value: Option<&str>, errors: &mut Vec<FieldError>) {
    let Some(raw) = value else {
        return;
    };
    if Date::parse(raw, format_description!("[year]-[month]-[day]")).is_err() {
        errors.push(FieldError::new(
            "birthday",
            ErrorCode::ValidationError,
            "Birthday must be a YYYY-MM-DD date",
        ));
    }
}

// ==================== Lookups ====================

async fn with_role(svc: &Service, user: User) -> Result<UserDetails, DomainError> {
    let role = match user.role_id {
        Some(role_id) => svc.roles.find_by_id(role_id).await?,
        None => None,
    };
    Ok(UserDetails { user, role })
}

async fn existing_role(svc: &Service, role_id: Uuid) -> Result<Role, DomainError> {
    svc.roles
        .find_by_id(role_id)
        .await?
        .ok_or_else(|| DomainError::invalid_role(role_id.to_string()))
}

async fn existing_user(svc: &Service, id: Uuid) -> Result<User, DomainError> {
    svc.users
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::user_not_found(id))
}

// ==================== Operations ====================

pub(super) async fn list_users(
    svc: &Service,
    ctx: &SecurityContext,
) -> Result<Vec<UserDetails>, DomainError> {
    ctx.ensure(Action::Read, Resource::User)?;

    let users = svc.users.list(&UserQuery::default()).await?;
    let roles: HashMap<Uuid, Role> = svc
        .roles
        .list()
        .await?
        .into_iter()
        .map(|r| (r.id, r))
        .collect();

    tracing::debug!(count = users.len(), "Listed users");
    Ok(users
        .into_iter()
        .map(|user| {
            let role = user.role_id.and_then(|id| roles.get(&id).cloned());
            UserDetails { user, role }
        })
        .collect())
}

pub(super) async fn get_user(
    svc: &Service,
    ctx: &SecurityContext,
    id: Uuid,
) -> Result<UserDetails, DomainError> {
    ctx.ensure(Action::Read, Resource::User)?;
    let user = existing_user(svc, id).await?;
    with_role(svc, user).await
}

pub(super) async fn create_user(
    svc: &Service,
    ctx: &SecurityContext,
    new_user: NewUser,
) -> Result<UserDetails, DomainError> {
    ctx.ensure(Action::Create, Resource::User)?;

    let mut errors = Vec::new();
    let email = check_email_field(&new_user.email, &mut errors);
    let first_name = check_name("first_name", "First name", &new_user.first_name, &mut errors);
    let last_name = check_name("last_name", "Last name", &new_user.last_name, &mut errors);
    if let Some(warning) = check_password(&new_user.password, &mut errors) {
        tracing::debug!(%warning, "accepting weak password");
    }
    check_len(
        "address",
        "Address",
        new_user.address.as_deref(),
        MAX_ADDRESS_LEN,
        &mut errors,
    );
    check_len(
        "slack_webhook_url",
        "Slack webhook URL",
        new_user.slack_webhook_url.as_deref(),
        MAX_WEBHOOK_LEN,
        &mut errors,
    );
    check_birthday(new_user.birthday.as_deref(), &mut errors);
    if !errors.is_empty() {
        return Err(DomainError::InvalidFields { errors });
    }

    if svc.users.email_taken(&email, None).await? {
        return Err(DomainError::email_already_exists(email));
    }
    if let Some(role_id) = new_user.role_id {
        existing_role(svc, role_id).await?;
    }

    tracing::info!("Creating new user");
    let password_hash = svc.hasher.hash(new_user.password).await?;
    let record = NewUserRecord {
        id: Uuid::new_v4(),
        email,
        password_hash,
        first_name,
        last_name,
        is_active: new_user.is_active.unwrap_or(true),
        role_id: new_user.role_id,
        sex: new_user.sex,
        birthday: new_user.birthday,
        address: new_user.address,
        locale: Some(
            new_user
                .locale
                .unwrap_or_else(|| DEFAULT_LOCALE.to_owned()),
        ),
        group_id: Some(new_user.group_id.unwrap_or(DEFAULT_GROUP_ID)),
        slack_webhook_url: new_user.slack_webhook_url,
        coin: DEFAULT_COIN,
    };
    let user = svc.users.create(record).await?;

    tracing::info!(user_id = %user.id, "Successfully created user");
    with_role(svc, user).await
}

/// Validate every supplied field of `patch` before any lookup.
fn check_patch(patch: &UserPatch, errors: &mut Vec<FieldError>) -> (Option<String>, Vec<String>) {
    let email = patch.email.as_deref().map(|e| check_email_field(e, errors));
    if let Some(name) = &patch.first_name {
        check_name("first_name", "First name", name, errors);
    }
    if let Some(name) = &patch.last_name {
        check_name("last_name", "Last name", name, errors);
    }
    let warnings = patch
        .password
        .as_deref()
        .and_then(|p| check_password(p, errors))
        .into_iter()
        .collect();
    check_len(
        "address",
        "Address",
        patch.address.as_ref().and_then(Option::as_deref),
        MAX_ADDRESS_LEN,
        errors,
    );
    check_len(
        "slack_webhook_url",
        "Slack webhook URL",
        patch.slack_webhook_url.as_ref().and_then(Option::as_deref),
        MAX_WEBHOOK_LEN,
        errors,
    );
    check_birthday(patch.birthday.as_ref().and_then(Option::as_deref), errors);
    if patch.coin.is_some_and(|c| c < 0) {
        errors.push(FieldError::new(
            "coin",
            ErrorCode::ValidationError,
            "Coin balance cannot be negative",
        ));
    }
    (email, warnings)
}

pub(super) async fn update_user(
    svc: &Service,
    ctx: &SecurityContext,
    id: Uuid,
    patch: UserPatch,
    note: ChangeNote,
) -> Result<UserUpdate, DomainError> {
    ctx.ensure(Action::Update, Resource::User)?;

    let is_self = ctx.subject_id() == id;
    if is_self && note.action.as_deref() == Some("ban") {
        return Err(DomainError::CannotBanSelf);
    }
    if is_self && patch.is_active == Some(false) {
        return Err(DomainError::cannot_modify_self("an account cannot deactivate itself"));
    }

    let mut errors = Vec::new();
    let (email, warnings) = check_patch(&patch, &mut errors);
    if !errors.is_empty() {
        return Err(DomainError::InvalidFields { errors });
    }

    let previous = existing_user(svc, id).await?;

    if let Some(email) = &email
        && *email != previous.email
        && svc.users.email_taken(email, Some(id)).await?
    {
        return Err(DomainError::email_already_exists(email.clone()));
    }
    if let Some(Some(role_id)) = patch.role_id
        && previous.role_id != Some(role_id)
    {
        existing_role(svc, role_id).await?;
    }

    let password_hash = match patch.password {
        Some(plain) => Some(svc.hasher.hash(plain).await?),
        None => None,
    };
    let changes = UserChanges {
        email,
        password_hash,
        first_name: patch.first_name.map(|n| n.trim().to_owned()),
        last_name: patch.last_name.map(|n| n.trim().to_owned()),
        is_active: patch.is_active,
        role_id: patch.role_id,
        locale: patch.locale,
        sex: patch.sex,
        birthday: patch.birthday,
        address: patch.address,
        avatar: patch.avatar,
        group_id: patch.group_id,
        slack_webhook_url: patch.slack_webhook_url,
        coin: patch.coin,
    };
    let user = svc.users.update(id, changes).await?;

    let audit = AuditInfo {
        action: note.action.unwrap_or_else(|| "update".to_owned()),
        reason: note.reason.unwrap_or_else(|| "User updated".to_owned()),
        performed_by: ctx.subject_id(),
        timestamp: OffsetDateTime::now_utc(),
    };
    if user.is_active != previous.is_active {
        tracing::info!(
            user_id = %id,
            performed_by = %audit.performed_by,
            action = %audit.action,
            reason = %audit.reason,
            is_active = user.is_active,
            "User status changed"
        );
    }
    tracing::info!(user_id = %id, "Successfully updated user");

    Ok(UserUpdate {
        details: with_role(svc, user).await?,
        previous,
        warnings,
        audit,
    })
}

/// Delete one account and return it as it was.
pub(super) async fn delete_user(
    svc: &Service,
    ctx: &SecurityContext,
    id: Uuid,
) -> Result<User, DomainError> {
    ctx.ensure(Action::Delete, Resource::User)?;
    if ctx.subject_id() == id {
        return Err(DomainError::CannotDeleteSelf);
    }

    let user = existing_user(svc, id).await?;
    svc.users.delete(id).await?;

    tracing::info!(user_id = %id, "Successfully deleted user");
    Ok(user)
}
