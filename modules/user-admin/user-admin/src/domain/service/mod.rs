//! Domain service layer - business logic and rules.
//!
//! ## Layout
//!
//! One facade, [`Service`], with per-operation submodules:
//! - `bulk` - ban/unban/delete/assign-role over a list of users
//! - `import` - upload validation, row pipeline and the write phase
//! - `export` - filter resolution, record-count guard and rendering
//! - `users` - single-account administration and email availability
//!
//! ## Layering Rules
//!
//! The domain layer:
//! - **MAY** import: `user_admin_sdk` (contract types), `domain::*`
//! - **MUST NOT** import: `api::*` or `infra::*`; storage, hashing, parsing and
//!   rendering are reached through the traits in `domain::repos` and `domain::ports`
//!
//! Every public entry point takes the caller's [`SecurityContext`] and checks its
//! ability before touching storage.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::instrument;
use user_admin_sdk::{
    BulkOperationRequest, BulkOperationResult, ChangeNote, ExportFile, ExportRequest,
    ImportOptions, ImportPreview, ImportReport, NewUser, User, UserDetails, UserPatch, UserUpdate,
};
use uuid::Uuid;

use crate::config::UserAdminConfig;
use crate::domain::error::DomainError;
use crate::domain::import::upload::ImportUpload;
use crate::domain::ports::{ExportRenderer, PasswordHasher, TabularReader};
use crate::domain::repos::{RolesRepository, UsersRepository};
use crate::domain::security::SecurityContext;

mod bulk;
mod export;
mod import;
mod users;

pub use users::EmailAvailability;

/// Domain service with business rules for user administration.
#[derive(Clone)]
pub struct Service {
    users: Arc<dyn UsersRepository>,
    roles: Arc<dyn RolesRepository>,
    hasher: Arc<dyn PasswordHasher>,
    reader: Arc<dyn TabularReader>,
    renderer: Arc<dyn ExportRenderer>,
    config: UserAdminConfig,
}

impl Service {
    /// Create a service with dependencies.
    pub fn new(
        users: Arc<dyn UsersRepository>,
        roles: Arc<dyn RolesRepository>,
        hasher: Arc<dyn PasswordHasher>,
        reader: Arc<dyn TabularReader>,
        renderer: Arc<dyn ExportRenderer>,
        config: UserAdminConfig,
    ) -> Self {
        Self {
            users,
            roles,
            hasher,
            reader,
            renderer,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &UserAdminConfig {
        &self.config
    }

    /// Apply one operation to every requested user.
    ///
    /// # Errors
    /// Only request-level failures (permission, empty or oversized selection, bad role);
    /// per-user failures are data in the returned result.
    #[instrument(skip(self, ctx, request), fields(operation = %request.operation, count = request.user_ids.len()))]
    pub async fn bulk_operation(
        &self,
        ctx: &SecurityContext,
        request: BulkOperationRequest,
    ) -> Result<BulkOperationResult, DomainError> {
        bulk::run(self, ctx, request).await
    }

    /// Validate an uploaded file and create or update its users.
    ///
    /// # Errors
    /// Permission, file-level and option failures; row failures are reported in the result.
    #[instrument(skip(self, ctx, upload, options), fields(file = upload.file_name.as_deref().unwrap_or_default(), size = upload.bytes.len()))]
    pub async fn import_users(
        &self,
        ctx: &SecurityContext,
        upload: ImportUpload,
        options: ImportOptions,
    ) -> Result<ImportReport, DomainError> {
        import::import_users(self, ctx, upload, options).await
    }

    /// Inspect an upload without writing: headers, first rows, suggested mapping.
    ///
    /// # Errors
    /// Permission and file-level failures.
    #[instrument(skip(self, ctx, upload, field_mapping), fields(file = upload.file_name.as_deref().unwrap_or_default()))]
    pub async fn preview_import(
        &self,
        ctx: &SecurityContext,
        upload: ImportUpload,
        field_mapping: HashMap<String, String>,
    ) -> Result<ImportPreview, DomainError> {
        import::preview_import(self, ctx, upload, field_mapping).await
    }

    /// Render the filtered user list in the requested format.
    ///
    /// # Errors
    /// Permission, filter validation, the record-count guard and rendering failures.
    #[instrument(skip(self, ctx, request), fields(format = request.format.extension()))]
    pub async fn export_users(
        &self,
        ctx: &SecurityContext,
        request: ExportRequest,
    ) -> Result<ExportFile, DomainError> {
        export::export_users(self, ctx, request).await
    }

    /// Every account with its role, newest first.
    ///
    /// # Errors
    /// Permission and storage failures.
    #[instrument(skip(self, ctx))]
    pub async fn list_users(&self, ctx: &SecurityContext) -> Result<Vec<UserDetails>, DomainError> {
        users::list_users(self, ctx).await
    }

    /// # Errors
    /// [`DomainError::UserNotFound`] when no account has `id`.
    #[instrument(skip(self, ctx))]
    pub async fn get_user(
        &self,
        ctx: &SecurityContext,
        id: Uuid,
    ) -> Result<UserDetails, DomainError> {
        users::get_user(self, ctx, id).await
    }

    /// Create one account after validating every field.
    ///
    /// # Errors
    /// Permission, field validation, a taken email or an unknown role.
    #[instrument(skip(self, ctx, new_user))]
    pub async fn create_user(
        &self,
        ctx: &SecurityContext,
        new_user: NewUser,
    ) -> Result<UserDetails, DomainError> {
        users::create_user(self, ctx, new_user).await
    }

    /// Apply a partial update to one account.
    ///
    /// The caller cannot deactivate or ban their own account.
    ///
    /// # Errors
    /// Permission, self-modification, field validation, a missing account, a taken
    /// email or an unknown role.
    #[instrument(skip(self, ctx, patch, note))]
    pub async fn update_user(
        &self,
        ctx: &SecurityContext,
        id: Uuid,
        patch: UserPatch,
        note: ChangeNote,
    ) -> Result<UserUpdate, DomainError> {
        users::update_user(self, ctx, id, patch, note).await
    }

    /// Delete one account other than the caller's and return it.
    ///
    /// # Errors
    /// Permission, self-deletion and a missing account.
    #[instrument(skip(self, ctx))]
    pub async fn delete_user(&self, ctx: &SecurityContext, id: Uuid) -> Result<User, DomainError> {
        users::delete_user(self, ctx, id).await
    }

    /// Whether `email` is free, ignoring the account `exclude`.
    ///
    /// # Errors
    /// Permission and storage failures.
    #[instrument(skip(self, ctx, email))]
    pub async fn check_email(
        &self,
        ctx: &SecurityContext,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<EmailAvailability, DomainError> {
        users::check_email(self, ctx, email, exclude).await
    }

    /// Whether a failure must stop the rest of the batch.
    fn is_fatal(&self, err: &DomainError) -> bool {
        err.storage_kind().is_some_and(|k| self.config.is_fatal(k))
    }
}
