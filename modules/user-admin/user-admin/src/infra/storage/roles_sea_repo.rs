use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use user_admin_sdk::Role;
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::repos::RolesRepository;
use crate::infra::storage::db::db_err;
use crate::infra::storage::entity::role;

/// SeaORM implementation of [`RolesRepository`].
#[derive(Clone)]
pub struct OrmRolesRepository {
    db: DatabaseConnection,
}

impl OrmRolesRepository {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RolesRepository for OrmRolesRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Role>, DomainError> {
        let found = role::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(found.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<Role>, DomainError> {
        let rows = role::Entity::find()
            .order_by_asc(role::Column::Name)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
