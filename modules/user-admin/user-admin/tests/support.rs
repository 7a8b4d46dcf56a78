#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Test support utilities for `user-admin` integration tests.
//!
//! Provides an in-memory `SQLite` database with migrations applied, seeding helpers,
//! security contexts and a users repository that fails on demand.

#![allow(dead_code)] // Support module provides utilities that may not all be used

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, EntityTrait, Set};
use time::OffsetDateTime;
use uuid::Uuid;

use user_admin::UserAdmin;
use user_admin::config::UserAdminConfig;
use user_admin::domain::error::{DomainError, StorageErrorKind};
use user_admin::domain::repos::{
    NewUserRecord, UserChanges, UserImportPatch, UserQuery, UsersRepository,
};
use user_admin::domain::security::SecurityContext;
use user_admin::domain::service::Service;
use user_admin::infra::export::FormatRenderer;
use user_admin::infra::password::Argon2Hasher;
use user_admin::infra::storage::entity::{role, user};
use user_admin::infra::storage::{OrmRolesRepository, OrmUsersRepository};
use user_admin::infra::tabular::SpreadsheetReader;
use user_admin_sdk::User;

/// Admin context with a random subject id.
#[must_use]
pub fn admin_ctx() -> SecurityContext {
    admin_ctx_as(Uuid::new_v4())
}

#[must_use]
pub fn admin_ctx_as(subject_id: Uuid) -> SecurityContext {
    SecurityContext::builder()
        .subject_id(subject_id)
        .email("admin@example.com")
        .role("ADMIN")
        .build()
}

/// Non-admin context holding exactly `permissions` (e.g. `"user:read"`).
#[must_use]
pub fn ctx_with(permissions: &[&str]) -> SecurityContext {
    SecurityContext::builder()
        .subject_id(Uuid::new_v4())
        .role("MANAGER")
        .permissions(permissions.iter().map(|p| p.parse().unwrap()).collect())
        .build()
}

/// Create a fresh in-memory `SQLite` database with migrations applied.
pub async fn inmem_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    UserAdmin::migrate(&db)
        .await
        .expect("Failed to run migrations");
    db
}

pub async fn seed_role(db: &DatabaseConnection, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    role::ActiveModel {
        id: Set(id),
        name: Set(name.to_owned()),
        description: Set(None),
    }
    .insert(db)
    .await
    .expect("Failed to seed role");
    id
}

/// Seed options for a user row. `created_at` defaults to now.
#[derive(Clone)]
pub struct UserSeed {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub role_id: Option<Uuid>,
    pub avatar: Option<String>,
    pub locale: Option<String>,
    pub group_id: Option<i32>,
    pub last_login: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl UserSeed {
    pub fn new(email: &str) -> Self {
        Self {
            email: email.to_owned(),
            first_name: "Test".to_owned(),
            last_name: "User".to_owned(),
            is_active: true,
            role_id: None,
            avatar: None,
            locale: None,
            group_id: None,
            last_login: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

pub async fn seed(db: &DatabaseConnection, s: UserSeed) -> Uuid {
    let id = Uuid::new_v4();
    user::ActiveModel {
        id: Set(id),
        email: Set(s.email),
        password_hash: Set("$argon2id$seeded".to_owned()),
        first_name: Set(s.first_name),
        last_name: Set(s.last_name),
        is_active: Set(s.is_active),
        role_id: Set(s.role_id),
        avatar: Set(s.avatar),
        locale: Set(s.locale),
        birthday: Set(None),
        sex: Set(None),
        address: Set(None),
        group_id: Set(s.group_id),
        slack_webhook_url: Set(None),
        coin: Set(0),
        last_login: Set(s.last_login),
        last_logout: Set(None),
        created_at: Set(s.created_at),
        updated_at: Set(s.created_at),
    }
    .insert(db)
    .await
    .expect("Failed to seed user");
    id
}

pub async fn seed_user(db: &DatabaseConnection, email: &str, is_active: bool) -> Uuid {
    seed(
        db,
        UserSeed {
            is_active,
            ..UserSeed::new(email)
        },
    )
    .await
}

pub async fn fetch(db: &DatabaseConnection, id: Uuid) -> Option<user::Model> {
    user::Entity::find_by_id(id).one(db).await.unwrap()
}

pub async fn fetch_by_email(db: &DatabaseConnection, email: &str) -> Option<user::Model> {
    use sea_orm::{ColumnTrait, QueryFilter};
    user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
        .unwrap()
}

/// Database plus the module wired over it.
pub struct TestContext {
    pub db: DatabaseConnection,
    pub module: UserAdmin,
    pub service: Arc<Service>,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_config(UserAdminConfig::default()).await
    }

    pub async fn with_config(cfg: UserAdminConfig) -> Self {
        let db = inmem_db().await;
        let module = UserAdmin::new(db.clone(), cfg);
        let service = module.service();
        Self {
            db,
            module,
            service,
        }
    }

    /// Service whose users repository fails for the listed targets.
    pub fn failing_service(&self, failures: FailurePlan) -> Service {
        Service::new(
            Arc::new(FailingUsersRepository::new(
                OrmUsersRepository::new(self.db.clone()),
                failures,
            )),
            Arc::new(OrmRolesRepository::new(self.db.clone())),
            Arc::new(Argon2Hasher),
            Arc::new(SpreadsheetReader),
            Arc::new(FormatRenderer),
            self.service.config().clone(),
        )
    }
}

/// Which calls a [`FailingUsersRepository`] should fail, and how.
#[derive(Default, Clone)]
pub struct FailurePlan {
    pub by_id: HashMap<Uuid, StorageErrorKind>,
    pub by_email: HashMap<String, StorageErrorKind>,
}

impl FailurePlan {
    pub fn id(mut self, id: Uuid, kind: StorageErrorKind) -> Self {
        self.by_id.insert(id, kind);
        self
    }

    pub fn email(mut self, email: &str, kind: StorageErrorKind) -> Self {
        self.by_email.insert(email.to_owned(), kind);
        self
    }
}

/// Delegates to the real repository except for planned failures.
/// Records every email passed to `create` so tests can see where a batch stopped.
pub struct FailingUsersRepository {
    inner: OrmUsersRepository,
    plan: FailurePlan,
    pub create_calls: Mutex<Vec<String>>,
}

impl FailingUsersRepository {
    pub fn new(inner: OrmUsersRepository, plan: FailurePlan) -> Self {
        Self {
            inner,
            plan,
            create_calls: Mutex::new(Vec::new()),
        }
    }

    fn check_id(&self, id: Uuid) -> Result<(), DomainError> {
        match self.plan.by_id.get(&id) {
            Some(kind) => Err(DomainError::storage(*kind, "injected failure")),
            None => Ok(()),
        }
    }

    fn check_email(&self, email: &str) -> Result<(), DomainError> {
        match self.plan.by_email.get(email) {
            Some(kind) => Err(DomainError::storage(*kind, "injected failure")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl UsersRepository for FailingUsersRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        self.inner.find_by_id(id).await
    }

    async fn list_emails(&self) -> Result<HashSet<String>, DomainError> {
        self.inner.list_emails().await
    }

    async fn email_taken(&self, email: &str, exclude: Option<Uuid>) -> Result<bool, DomainError> {
        self.inner.email_taken(email, exclude).await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<(), DomainError> {
        self.check_id(id)?;
        self.inner.set_active(id, active).await
    }

    async fn set_role(&self, id: Uuid, role_id: Uuid) -> Result<(), DomainError> {
        self.check_id(id)?;
        self.inner.set_role(id, role_id).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        self.check_id(id)?;
        self.inner.delete(id).await
    }

    async fn create(&self, user: NewUserRecord) -> Result<User, DomainError> {
        self.create_calls.lock().unwrap().push(user.email.clone());
        self.check_email(&user.email)?;
        self.inner.create(user).await
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User, DomainError> {
        self.check_id(id)?;
        self.inner.update(id, changes).await
    }

    async fn update_by_email(
        &self,
        email: &str,
        patch: UserImportPatch,
    ) -> Result<User, DomainError> {
        self.check_email(email)?;
        self.inner.update_by_email(email, patch).await
    }

    async fn count(&self, query: &UserQuery) -> Result<u64, DomainError> {
        self.inner.count(query).await
    }

    async fn list(&self, query: &UserQuery) -> Result<Vec<User>, DomainError> {
        self.inner.list(query).await
    }
}

/// Build a CSV upload named `users.csv`.
pub fn csv_upload(text: &str) -> user_admin::domain::import::upload::ImportUpload {
    user_admin::domain::import::upload::ImportUpload {
        file_name: Some("users.csv".to_owned()),
        content_type: Some("text/csv".to_owned()),
        bytes: text.as_bytes().to_vec(),
    }
}
