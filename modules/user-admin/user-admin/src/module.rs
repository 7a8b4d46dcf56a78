use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::auth::JwtAuth;
use crate::api::rest::routes;
use crate::config::UserAdminConfig;
use crate::domain::service::Service;
use crate::infra::export::FormatRenderer;
use crate::infra::password::Argon2Hasher;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::{OrmRolesRepository, OrmUsersRepository};
use crate::infra::tabular::SpreadsheetReader;

/// Composition root: wires storage, hashing, parsing and rendering into the domain service.
#[derive(Clone)]
pub struct UserAdmin {
    service: Arc<Service>,
}

impl UserAdmin {
    /// Build the module over an open database connection.
    #[must_use]
    pub fn new(db: DatabaseConnection, cfg: UserAdminConfig) -> Self {
        info!("Initializing user-admin module");
        debug!(
            max_bulk_selection = cfg.max_bulk_selection,
            import_max_file_size = cfg.import_max_file_size,
            export_max_records = cfg.export_max_records,
            "Loaded user-admin config"
        );

        let service = Service::new(
            Arc::new(OrmUsersRepository::new(db.clone())),
            Arc::new(OrmRolesRepository::new(db)),
            Arc::new(Argon2Hasher),
            Arc::new(SpreadsheetReader),
            Arc::new(FormatRenderer),
            cfg,
        );
        Self {
            service: Arc::new(service),
        }
    }

    /// Apply pending schema migrations.
    ///
    /// # Errors
    /// Returns the migrator's error when a migration fails.
    pub async fn migrate(db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running user-admin migrations");
        Migrator::up(db, None)
            .await
            .map_err(|e| anyhow::anyhow!("user-admin migration failed: {e}"))
    }

    #[must_use]
    pub fn service(&self) -> Arc<Service> {
        Arc::clone(&self.service)
    }

    /// REST routes, behind bearer-token auth when `auth` is given.
    #[must_use]
    pub fn router(&self, auth: Option<Arc<JwtAuth>>) -> Router {
        let router = routes::register_routes(Router::new(), self.service());
        match auth {
            Some(auth) => routes::with_auth(router, auth),
            None => router,
        }
    }
}
