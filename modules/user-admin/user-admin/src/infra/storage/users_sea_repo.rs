use std::collections::HashSet;

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use time::OffsetDateTime;
use user_admin_sdk::{ActivityStatus, StatusFilter, User};
use uuid::Uuid;

use crate::domain::error::{DomainError, StorageErrorKind};
use crate::domain::import::schema::normalize_email;
use crate::domain::repos::{
    NewUserRecord, UserChanges, UserImportPatch, UserQuery, UsersRepository,
};
use crate::infra::storage::db::db_err;
use crate::infra::storage::entity::{
    ActiveModel as UserAM, Column as UserColumn, Entity as UserEntity,
};

/// SeaORM implementation of [`UsersRepository`].
#[derive(Clone)]
pub struct OrmUsersRepository {
    db: DatabaseConnection,
}

impl OrmUsersRepository {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// `%`, `_` and the escape character itself match literally.
fn like_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '%' | '_' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            c => out.push(c),
        }
    }
    out
}

fn lower_like(column: UserColumn, needle: &str) -> Condition {
    let pattern = format!("%{}%", like_escape(&needle.to_lowercase()));
    Condition::all().add(
        Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(pattern).escape('\\')),
    )
}

fn activity_condition(status: ActivityStatus, now: OffsetDateTime) -> Condition {
    let window_start = now - ActivityStatus::ONLINE_WINDOW;
    let online = Condition::all()
        .add(UserColumn::LastLogin.gte(window_start))
        .add(
            Condition::any()
                .add(UserColumn::LastLogout.is_null())
                .add(Expr::col(UserColumn::LastLogout).lt(Expr::col(UserColumn::LastLogin))),
        );

    match status {
        ActivityStatus::Never => Condition::all().add(UserColumn::LastLogin.is_null()),
        ActivityStatus::Online => online,
        ActivityStatus::Offline => Condition::all()
            .add(UserColumn::LastLogin.is_not_null())
            .add(
                Condition::any()
                    .add(UserColumn::LastLogin.lt(window_start))
                    .add(Expr::col(UserColumn::LastLogout).gte(Expr::col(UserColumn::LastLogin))),
            ),
    }
}

fn filtered(query: &UserQuery) -> Select<UserEntity> {
    let mut cond = Condition::all();

    if let Some(search) = &query.search {
        cond = cond.add(
            Condition::any()
                .add(lower_like(UserColumn::FirstName, search))
                .add(lower_like(UserColumn::LastName, search))
                .add(lower_like(UserColumn::Email, search)),
        );
    }
    if let Some(role_id) = query.role_id {
        cond = cond.add(UserColumn::RoleId.eq(role_id));
    }
    match query.status {
        StatusFilter::All => {}
        StatusFilter::Active => cond = cond.add(UserColumn::IsActive.eq(true)),
        StatusFilter::Inactive => cond = cond.add(UserColumn::IsActive.eq(false)),
    }
    if let Some(from) = query.created_from {
        cond = cond.add(UserColumn::CreatedAt.gte(from));
    }
    if let Some(before) = query.created_before {
        cond = cond.add(UserColumn::CreatedAt.lt(before));
    }
    match query.has_avatar {
        Some(true) => {
            cond = cond
                .add(UserColumn::Avatar.is_not_null())
                .add(UserColumn::Avatar.ne(""));
        }
        Some(false) => {
            cond = cond.add(
                Condition::any()
                    .add(UserColumn::Avatar.is_null())
                    .add(UserColumn::Avatar.eq("")),
            );
        }
        None => {}
    }
    if let Some(locale) = &query.locale {
        cond = cond.add(UserColumn::Locale.eq(locale.as_str()));
    }
    if let Some(group_id) = query.group_id {
        cond = cond.add(UserColumn::GroupId.eq(group_id));
    }
    if let Some((status, now)) = query.activity {
        cond = cond.add(activity_condition(status, now));
    }

    UserEntity::find().filter(cond)
}

#[async_trait]
impl UsersRepository for OrmUsersRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let found = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(found.map(Into::into))
    }

    async fn list_emails(&self) -> Result<HashSet<String>, DomainError> {
        let emails: Vec<String> = UserEntity::find()
            .select_only()
            .column(UserColumn::Email)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(emails.into_iter().collect())
    }

    async fn email_taken(&self, email: &str, exclude: Option<Uuid>) -> Result<bool, DomainError> {
        let mut cond = Condition::all().add(UserColumn::Email.eq(normalize_email(email)));
        if let Some(id) = exclude {
            cond = cond.add(UserColumn::Id.ne(id));
        }
        let count = UserEntity::find()
            .filter(cond)
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<(), DomainError> {
        let res = UserEntity::update_many()
            .col_expr(UserColumn::IsActive, Expr::value(active))
            .col_expr(UserColumn::UpdatedAt, Expr::value(OffsetDateTime::now_utc()))
            .filter(UserColumn::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if res.rows_affected == 0 {
            return Err(DomainError::user_not_found(id));
        }
        Ok(())
    }

    async fn set_role(&self, id: Uuid, role_id: Uuid) -> Result<(), DomainError> {
        let res = UserEntity::update_many()
            .col_expr(UserColumn::RoleId, Expr::value(role_id))
            .col_expr(UserColumn::UpdatedAt, Expr::value(OffsetDateTime::now_utc()))
            .filter(UserColumn::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if res.rows_affected == 0 {
            return Err(DomainError::user_not_found(id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let res = UserEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if res.rows_affected == 0 {
            return Err(DomainError::user_not_found(id));
        }
        Ok(())
    }

    async fn create(&self, user: NewUserRecord) -> Result<User, DomainError> {
        let now = OffsetDateTime::now_utc();
        let m = UserAM {
            id: Set(user.id),
            email: Set(normalize_email(&user.email)),
            password_hash: Set(user.password_hash),
            first_name: Set(user.first_name),
            last_name: Set(user.last_name),
            is_active: Set(user.is_active),
            role_id: Set(user.role_id),
            avatar: Set(None),
            locale: Set(user.locale),
            birthday: Set(user.birthday),
            sex: Set(user.sex),
            address: Set(user.address),
            group_id: Set(user.group_id),
            slack_webhook_url: Set(user.slack_webhook_url),
            coin: Set(user.coin),
            last_login: Set(None),
            last_logout: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let inserted = m.insert(&self.db).await.map_err(db_err)?;
        Ok(inserted.into())
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User, DomainError> {
        let existing = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::user_not_found(id))?;

        let mut m = existing.into_active_model();
        if let Some(email) = changes.email {
            m.email = Set(normalize_email(&email));
        }
        if let Some(hash) = changes.password_hash {
            m.password_hash = Set(hash);
        }
        if let Some(v) = changes.first_name {
            m.first_name = Set(v);
        }
        if let Some(v) = changes.last_name {
            m.last_name = Set(v);
        }
        if let Some(v) = changes.is_active {
            m.is_active = Set(v);
        }
        if let Some(v) = changes.role_id {
            m.role_id = Set(v);
        }
        if let Some(v) = changes.locale {
            m.locale = Set(v);
        }
        if let Some(v) = changes.sex {
            m.sex = Set(v);
        }
        if let Some(v) = changes.birthday {
            m.birthday = Set(v);
        }
        if let Some(v) = changes.address {
            m.address = Set(v);
        }
        if let Some(v) = changes.avatar {
            m.avatar = Set(v);
        }
        if let Some(v) = changes.group_id {
            m.group_id = Set(v);
        }
        if let Some(v) = changes.slack_webhook_url {
            m.slack_webhook_url = Set(v);
        }
        if let Some(v) = changes.coin {
            m.coin = Set(v);
        }
        m.updated_at = Set(OffsetDateTime::now_utc());

        let updated = m.update(&self.db).await.map_err(db_err)?;
        Ok(updated.into())
    }

    async fn update_by_email(
        &self,
        email: &str,
        patch: UserImportPatch,
    ) -> Result<User, DomainError> {
        let email = normalize_email(email);
        let existing = UserEntity::find()
            .filter(UserColumn::Email.eq(email.as_str()))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| {
                DomainError::storage(
                    StorageErrorKind::NotFound,
                    format!("no user with email '{email}'"),
                )
            })?;

        let mut m = existing.into_active_model();
        if let Some(hash) = patch.password_hash {
            m.password_hash = Set(hash);
        }
        m.first_name = Set(patch.first_name);
        m.last_name = Set(patch.last_name);
        m.is_active = Set(patch.is_active);
        m.role_id = Set(patch.role_id);
        m.sex = Set(patch.sex);
        m.birthday = Set(patch.birthday);
        m.address = Set(patch.address);
        m.locale = Set(patch.locale);
        m.group_id = Set(patch.group_id);
        m.slack_webhook_url = Set(patch.slack_webhook_url);
        m.updated_at = Set(OffsetDateTime::now_utc());

        let updated = m.update(&self.db).await.map_err(db_err)?;
        Ok(updated.into())
    }

    async fn count(&self, query: &UserQuery) -> Result<u64, DomainError> {
        filtered(query).count(&self.db).await.map_err(db_err)
    }

    async fn list(&self, query: &UserQuery) -> Result<Vec<User>, DomainError> {
        let rows = filtered(query)
            .order_by_desc(UserColumn::CreatedAt)
            .order_by_asc(UserColumn::Email)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
