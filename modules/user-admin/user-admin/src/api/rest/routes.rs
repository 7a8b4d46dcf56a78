use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Extension, Router, middleware};

use crate::api::rest::auth::{JwtAuth, require_auth};
use crate::api::rest::handlers;
use crate::domain::service::Service;

pub const USERS_PATH: &str = "/api/admin/users";
pub const USER_PATH: &str = "/api/admin/users/{id}";
pub const BULK_PATH: &str = "/api/admin/users/bulk";
pub const IMPORT_PATH: &str = "/api/admin/users/import";
pub const IMPORT_PREVIEW_PATH: &str = "/api/admin/users/import/preview";
pub const EXPORT_PATH: &str = "/api/admin/users/export";
pub const CHECK_EMAIL_PATH: &str = "/api/admin/users/check-email";

/// Room for multipart boundaries and the small text fields next to the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Admin routes without authentication.
///
/// Handlers expect a [`SecurityContext`](crate::domain::security::SecurityContext)
/// request extension; [`with_auth`] provides one from a bearer token.
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    let upload_limit = service
        .config()
        .import_max_file_size
        .saturating_add(MULTIPART_OVERHEAD);

    let uploads = Router::new()
        .route(IMPORT_PATH, post(handlers::import_users))
        .route(IMPORT_PREVIEW_PATH, post(handlers::preview_import))
        .layer(DefaultBodyLimit::max(upload_limit));

    router
        .route(
            USERS_PATH,
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            USER_PATH,
            get(handlers::get_user)
                .put(handlers::update_user)
                .patch(handlers::patch_user)
                .delete(handlers::delete_user),
        )
        .route(BULK_PATH, post(handlers::bulk_operation))
        .route(EXPORT_PATH, get(handlers::export_users))
        .route(CHECK_EMAIL_PATH, get(handlers::check_email))
        .merge(uploads)
        .layer(Extension(service))
}

/// Require a valid bearer token on every route registered so far.
pub fn with_auth(router: Router, auth: Arc<JwtAuth>) -> Router {
    router.route_layer(middleware::from_fn_with_state(auth, require_auth))
}
