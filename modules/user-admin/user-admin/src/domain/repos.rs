use std::collections::HashSet;

use async_trait::async_trait;
use time::OffsetDateTime;
use user_admin_sdk::{ActivityStatus, Role, StatusFilter, User};
use uuid::Uuid;

use crate::domain::error::DomainError;

/// Data for inserting a user. The password is already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub role_id: Option<Uuid>,
    pub sex: Option<bool>,
    pub birthday: Option<String>,
    pub address: Option<String>,
    pub locale: Option<String>,
    pub group_id: Option<i32>,
    pub slack_webhook_url: Option<String>,
    pub coin: i64,
}

/// Column changes for one account. `None` leaves a column untouched; for nullable
/// columns `Some(None)` stores NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(clippy::option_option)] // set-to-null and not-set are distinct
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: Option<bool>,
    pub role_id: Option<Option<Uuid>>,
    pub locale: Option<Option<String>>,
    pub sex: Option<Option<bool>>,
    pub birthday: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub avatar: Option<Option<String>>,
    pub group_id: Option<Option<i32>>,
    pub slack_webhook_url: Option<Option<String>>,
    pub coin: Option<i64>,
}

/// Fields overwritten when an import row updates an existing account.
/// `None` password hash keeps the stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserImportPatch {
    pub password_hash: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub role_id: Option<Uuid>,
    pub sex: Option<bool>,
    pub birthday: Option<String>,
    pub address: Option<String>,
    pub locale: Option<String>,
    pub group_id: Option<i32>,
    pub slack_webhook_url: Option<String>,
}

/// Storage-level user filter with every reference already resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    pub search: Option<String>,
    pub role_id: Option<Uuid>,
    pub status: StatusFilter,
    /// Inclusive lower bound on `created_at`.
    pub created_from: Option<OffsetDateTime>,
    /// Exclusive upper bound on `created_at`.
    pub created_before: Option<OffsetDateTime>,
    pub has_avatar: Option<bool>,
    pub locale: Option<String>,
    pub group_id: Option<i32>,
    /// Activity filter evaluated against this instant.
    pub activity: Option<(ActivityStatus, OffsetDateTime)>,
}

/// Repository trait for user persistence.
///
/// Emails handed to and returned by the repository are normalized (trimmed, lowercase).
/// Mutations of a missing row fail with [`DomainError::UserNotFound`].
#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;

    /// Every stored email, for one-shot duplicate detection.
    async fn list_emails(&self) -> Result<HashSet<String>, DomainError>;

    /// Whether another account (not `exclude`) already uses `email`.
    async fn email_taken(&self, email: &str, exclude: Option<Uuid>) -> Result<bool, DomainError>;

    async fn set_active(&self, id: Uuid, active: bool) -> Result<(), DomainError>;

    async fn set_role(&self, id: Uuid, role_id: Uuid) -> Result<(), DomainError>;

    async fn delete(&self, id: Uuid) -> Result<(), DomainError>;

    async fn create(&self, user: NewUserRecord) -> Result<User, DomainError>;

    /// Apply `changes` to one account and return the stored result.
    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User, DomainError>;

    async fn update_by_email(
        &self,
        email: &str,
        patch: UserImportPatch,
    ) -> Result<User, DomainError>;

    async fn count(&self, query: &UserQuery) -> Result<u64, DomainError>;

    /// Matching users, newest first.
    async fn list(&self, query: &UserQuery) -> Result<Vec<User>, DomainError>;
}

/// Repository trait for role lookups.
#[async_trait]
pub trait RolesRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Role>, DomainError>;

    async fn list(&self) -> Result<Vec<Role>, DomainError>;
}
