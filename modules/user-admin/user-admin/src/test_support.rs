#![allow(clippy::unwrap_used, clippy::expect_used)]

//! In-memory collaborators for service unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;
use user_admin_sdk::{ActivityStatus, ExportFormat, Role, StatusFilter, User};
use uuid::Uuid;

use crate::config::UserAdminConfig;
use crate::domain::error::{DomainError, StorageErrorKind};
use crate::domain::export::{ExportMetadata, ExportTable};
use crate::domain::import::upload::ImportUpload;
use crate::domain::ports::{ExportRenderer, PasswordHasher};
use crate::domain::repos::{
    NewUserRecord, RolesRepository, UserChanges, UserImportPatch, UserQuery, UsersRepository,
};
use crate::domain::security::SecurityContext;
use crate::domain::service::Service;
use crate::infra::export::FormatRenderer;
use crate::infra::tabular::SpreadsheetReader;

#[must_use]
pub fn admin_ctx() -> SecurityContext {
    SecurityContext::builder()
        .subject_id(Uuid::new_v4())
        .email("admin@example.com")
        .role("ADMIN")
        .build()
}

#[must_use]
pub fn ctx_with(permissions: &[&str]) -> SecurityContext {
    SecurityContext::builder()
        .subject_id(Uuid::new_v4())
        .role("MANAGER")
        .permissions(permissions.iter().map(|p| p.parse().unwrap()).collect())
        .build()
}

#[must_use]
pub fn csv_upload(text: &str) -> ImportUpload {
    ImportUpload {
        file_name: Some("users.csv".to_owned()),
        content_type: Some("text/csv".to_owned()),
        bytes: text.as_bytes().to_vec(),
    }
}

#[derive(Default)]
struct Store {
    users: Vec<(User, String)>,
    roles: Vec<Role>,
    mutation_failures: HashMap<Uuid, StorageErrorKind>,
    create_failures: HashMap<String, StorageErrorKind>,
    clock: i64,
}

impl Store {
    fn tick(&mut self) -> OffsetDateTime {
        self.clock += 1;
        OffsetDateTime::UNIX_EPOCH + time::Duration::days(19_000) + time::Duration::seconds(self.clock)
    }

    fn position(&self, id: Uuid) -> Result<usize, DomainError> {
        if let Some(kind) = self.mutation_failures.get(&id) {
            return Err(DomainError::storage(*kind, "injected failure"));
        }
        self.users
            .iter()
            .position(|(u, _)| u.id == id)
            .ok_or_else(|| DomainError::user_not_found(id))
    }
}

fn matches(user: &User, q: &UserQuery) -> bool {
    let search_ok = q.search.as_deref().is_none_or(|s| {
        let s = s.to_lowercase();
        [&user.first_name, &user.last_name, &user.email]
            .iter()
            .any(|f| f.to_lowercase().contains(&s))
    });
    let status_ok = match q.status {
        StatusFilter::All => true,
        StatusFilter::Active => user.is_active,
        StatusFilter::Inactive => !user.is_active,
    };
    search_ok
        && status_ok
        && q.role_id.is_none_or(|r| user.role_id == Some(r))
        && q.created_from.is_none_or(|t| user.created_at >= t)
        && q.created_before.is_none_or(|t| user.created_at < t)
        && q.has_avatar.is_none_or(|a| user.avatar.is_some() == a)
        && q.locale.as_deref().is_none_or(|l| user.locale.as_deref() == Some(l))
        && q.group_id.is_none_or(|g| user.group_id == Some(g))
        && q.activity
            .is_none_or(|(status, now): (ActivityStatus, OffsetDateTime)| ActivityStatus::of(user, now) == status)
}

#[derive(Clone)]
struct MemUsers(Arc<Mutex<Store>>);

#[async_trait]
impl UsersRepository for MemUsers {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let store = self.0.lock().unwrap();
        Ok(store.users.iter().find(|(u, _)| u.id == id).map(|(u, _)| u.clone()))
    }

    async fn list_emails(&self) -> Result<HashSet<String>, DomainError> {
        let store = self.0.lock().unwrap();
        Ok(store.users.iter().map(|(u, _)| u.email.clone()).collect())
    }

    async fn email_taken(&self, email: &str, exclude: Option<Uuid>) -> Result<bool, DomainError> {
        let store = self.0.lock().unwrap();
        Ok(store
            .users
            .iter()
            .any(|(u, _)| u.email == email && Some(u.id) != exclude))
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<(), DomainError> {
        let mut store = self.0.lock().unwrap();
        let i = store.position(id)?;
        store.users[i].0.is_active = active;
        Ok(())
    }

    async fn set_role(&self, id: Uuid, role_id: Uuid) -> Result<(), DomainError> {
        let mut store = self.0.lock().unwrap();
        let i = store.position(id)?;
        store.users[i].0.role_id = Some(role_id);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let mut store = self.0.lock().unwrap();
        let i = store.position(id)?;
        store.users.remove(i);
        Ok(())
    }

    async fn create(&self, user: NewUserRecord) -> Result<User, DomainError> {
        let mut store = self.0.lock().unwrap();
        if let Some(kind) = store.create_failures.get(&user.email) {
            return Err(DomainError::storage(*kind, "injected failure"));
        }
        if store.users.iter().any(|(u, _)| u.email == user.email) {
            return Err(DomainError::storage(
                StorageErrorKind::UniqueViolation,
                "users.email",
            ));
        }
        let now = store.tick();
        let created = User {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_active: user.is_active,
            role_id: user.role_id,
            avatar: None,
            locale: user.locale,
            birthday: user.birthday,
            sex: user.sex,
            address: user.address,
            group_id: user.group_id,
            slack_webhook_url: user.slack_webhook_url,
            coin: user.coin,
            last_login: None,
            last_logout: None,
            created_at: now,
            updated_at: now,
        };
        store.users.push((created.clone(), user.password_hash));
        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User, DomainError> {
        let mut store = self.0.lock().unwrap();
        let i = store.position(id)?;
        let clash = changes
            .email
            .as_ref()
            .is_some_and(|email| store.users.iter().any(|(u, _)| u.id != id && &u.email == email));
        if clash {
            return Err(DomainError::storage(
                StorageErrorKind::UniqueViolation,
                "users.email",
            ));
        }
        let now = store.tick();
        let (user, hash) = &mut store.users[i];
        if let Some(v) = changes.email {
            user.email = v;
        }
        if let Some(v) = changes.password_hash {
            *hash = v;
        }
        if let Some(v) = changes.first_name {
            user.first_name = v;
        }
        if let Some(v) = changes.last_name {
            user.last_name = v;
        }
        if let Some(v) = changes.is_active {
            user.is_active = v;
        }
        if let Some(v) = changes.role_id {
            user.role_id = v;
        }
        if let Some(v) = changes.locale {
            user.locale = v;
        }
        if let Some(v) = changes.sex {
            user.sex = v;
        }
        if let Some(v) = changes.birthday {
            user.birthday = v;
        }
        if let Some(v) = changes.address {
            user.address = v;
        }
        if let Some(v) = changes.avatar {
            user.avatar = v;
        }
        if let Some(v) = changes.group_id {
            user.group_id = v;
        }
        if let Some(v) = changes.slack_webhook_url {
            user.slack_webhook_url = v;
        }
        if let Some(v) = changes.coin {
            user.coin = v;
        }
        user.updated_at = now;
        Ok(user.clone())
    }

    async fn update_by_email(
        &self,
        email: &str,
        patch: UserImportPatch,
    ) -> Result<User, DomainError> {
        let mut store = self.0.lock().unwrap();
        let now = store.tick();
        let (user, hash) = store
            .users
            .iter_mut()
            .find(|(u, _)| u.email == email)
            .ok_or_else(|| DomainError::storage(StorageErrorKind::NotFound, email))?;
        user.first_name = patch.first_name;
        user.last_name = patch.last_name;
        user.is_active = patch.is_active;
        user.role_id = patch.role_id;
        user.sex = patch.sex;
        user.birthday = patch.birthday;
        user.address = patch.address;
        user.locale = patch.locale;
        user.group_id = patch.group_id;
        user.slack_webhook_url = patch.slack_webhook_url;
        user.updated_at = now;
        if let Some(h) = patch.password_hash {
            *hash = h;
        }
        Ok(user.clone())
    }

    async fn count(&self, query: &UserQuery) -> Result<u64, DomainError> {
        let store = self.0.lock().unwrap();
        Ok(store.users.iter().filter(|(u, _)| matches(u, query)).count() as u64)
    }

    async fn list(&self, query: &UserQuery) -> Result<Vec<User>, DomainError> {
        let store = self.0.lock().unwrap();
        let mut users: Vec<User> = store
            .users
            .iter()
            .filter(|(u, _)| matches(u, query))
            .map(|(u, _)| u.clone())
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }
}

#[derive(Clone)]
struct MemRoles(Arc<Mutex<Store>>);

#[async_trait]
impl RolesRepository for MemRoles {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Role>, DomainError> {
        let store = self.0.lock().unwrap();
        Ok(store.roles.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Role>, DomainError> {
        Ok(self.0.lock().unwrap().roles.clone())
    }
}

/// Deterministic stand-in for argon2.
pub struct FakeHasher;

#[async_trait]
impl PasswordHasher for FakeHasher {
    async fn hash(&self, plain: String) -> Result<String, DomainError> {
        Ok(format!("hashed:{plain}"))
    }
}

struct CountingRenderer {
    inner: FormatRenderer,
    calls: Arc<AtomicUsize>,
}

impl ExportRenderer for CountingRenderer {
    fn render(
        &self,
        format: ExportFormat,
        table: &ExportTable,
        metadata: &ExportMetadata,
    ) -> Result<Vec<u8>, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.render(format, table, metadata)
    }
}

/// A service over in-memory storage plus handles to inspect and sabotage it.
#[derive(Default)]
pub struct Harness {
    store: Arc<Mutex<Store>>,
    rendered: Arc<AtomicUsize>,
    config: UserAdminConfig,
}

impl Harness {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, f: impl FnOnce(&mut UserAdminConfig)) -> Self {
        f(&mut self.config);
        self
    }

    #[must_use]
    pub fn service(&self) -> Service {
        Service::new(
            Arc::new(MemUsers(Arc::clone(&self.store))),
            Arc::new(MemRoles(Arc::clone(&self.store))),
            Arc::new(FakeHasher),
            Arc::new(SpreadsheetReader),
            Arc::new(CountingRenderer {
                inner: FormatRenderer,
                calls: Arc::clone(&self.rendered),
            }),
            self.config.clone(),
        )
    }

    pub fn add_user(&self, email: &str, active: bool) -> Uuid {
        let mut store = self.store.lock().unwrap();
        let now = store.tick();
        let id = Uuid::new_v4();
        let (first, last) = email.split_once('@').unwrap_or((email, ""));
        store.users.push((
            User {
                id,
                email: email.to_owned(),
                first_name: first.to_owned(),
                last_name: last.to_owned(),
                is_active: active,
                role_id: None,
                avatar: None,
                locale: None,
                birthday: None,
                sex: None,
                address: None,
                group_id: None,
                slack_webhook_url: None,
                coin: 0,
                last_login: None,
                last_logout: None,
                created_at: now,
                updated_at: now,
            },
            "seed-hash".to_owned(),
        ));
        id
    }

    pub fn add_role(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.store.lock().unwrap().roles.push(Role {
            id,
            name: name.to_owned(),
            description: None,
        });
        id
    }

    pub fn set_role(&self, user: Uuid, role: Uuid) {
        let mut store = self.store.lock().unwrap();
        let entry = store.users.iter_mut().find(|(u, _)| u.id == user).unwrap();
        entry.0.role_id = Some(role);
    }

    #[must_use]
    pub fn user(&self, id: Uuid) -> Option<User> {
        let store = self.store.lock().unwrap();
        store.users.iter().find(|(u, _)| u.id == id).map(|(u, _)| u.clone())
    }

    #[must_use]
    pub fn user_by_email(&self, email: &str) -> Option<User> {
        let store = self.store.lock().unwrap();
        store
            .users
            .iter()
            .find(|(u, _)| u.email == email)
            .map(|(u, _)| u.clone())
    }

    #[must_use]
    pub fn password_hash_of(&self, id: Uuid) -> Option<String> {
        let store = self.store.lock().unwrap();
        store.users.iter().find(|(u, _)| u.id == id).map(|(_, h)| h.clone())
    }

    /// Every later mutation of `id` fails with a storage error of `kind`.
    pub fn fail_mutation_for(&self, id: Uuid, kind: StorageErrorKind) {
        self.store.lock().unwrap().mutation_failures.insert(id, kind);
    }

    /// Creating a user with `email` fails with a storage error of `kind`.
    pub fn fail_create_for(&self, email: &str, kind: StorageErrorKind) {
        self.store
            .lock()
            .unwrap()
            .create_failures
            .insert(email.to_owned(), kind);
    }

    #[must_use]
    pub fn rendered_count(&self) -> usize {
        self.rendered.load(Ordering::SeqCst)
    }
}
