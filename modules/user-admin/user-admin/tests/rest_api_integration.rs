#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end tests for the REST surface: routing, DTOs, headers and the error envelope.

use std::fmt::Write as _;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::Request;
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tower::ServiceExt;
use user_admin::api::rest::auth::{Claims, JwtAuth};
use user_admin::domain::security::SecurityContext;
use uuid::Uuid;

mod support;
use support::{TestContext, admin_ctx, admin_ctx_as, ctx_with, fetch, seed_user};

const BOUNDARY: &str = "user-admin-test-boundary";
const SECRET: &str = "integration-secret";

/// Router whose requests all run as `sec`.
fn app_as(ctx: &TestContext, sec: SecurityContext) -> Router {
    ctx.module
        .router(None)
        .layer(middleware::from_fn(move |mut req: Request, next: Next| {
            let sec = sec.clone();
            async move {
                req.extensions_mut().insert(sec);
                next.run(req).await
            }
        }))
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_post(uri: &str, body: &Value) -> Request {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// `parts` are (name, filename, content) triples; a `None` filename makes a text field.
fn multipart(uri: &str, parts: &[(&str, Option<&str>, &str)]) -> Request {
    let mut body = String::new();
    for (name, filename, content) in parts {
        write!(body, "--{BOUNDARY}\r\n").unwrap();
        match filename {
            Some(f) => write!(
                body,
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\nContent-Type: text/csv\r\n\r\n"
            )
            .unwrap(),
            None => write!(
                body,
                "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
            )
            .unwrap(),
        }
        body.push_str(content);
        body.push_str("\r\n");
    }
    write!(body, "--{BOUNDARY}--\r\n").unwrap();

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

// ==================== Bulk ====================

#[tokio::test]
async fn bulk_ban_returns_result_dto() {
    let ctx = TestContext::new().await;
    let a = seed_user(&ctx.db, "a@example.com", true).await;
    let ghost = Uuid::new_v4();

    let resp = app_as(&ctx, admin_ctx())
        .oneshot(json_post(
            "/api/admin/users/bulk",
            &json!({ "selectedUserIds": [a, ghost], "operation": "ban" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["success"], 1);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["operation"], "ban");
    assert_eq!(body["details"]["successfulIds"], json!([a]));
    assert_eq!(body["errors"][0]["code"], "USER_NOT_FOUND");
    assert!(!fetch(&ctx.db, a).await.unwrap().is_active);
}

#[tokio::test]
async fn bulk_rejects_unknown_operation_with_envelope() {
    let ctx = TestContext::new().await;
    let resp = app_as(&ctx, admin_ctx())
        .oneshot(json_post(
            "/api/admin/users/bulk",
            &json!({ "userIds": [Uuid::new_v4()], "operation": "explode" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = body_json(resp).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["severity"], "low");
    assert!(body["timestamp"].is_string());
    assert!(body["userMessage"].is_string());
}

// ==================== Import ====================

#[tokio::test]
async fn import_multipart_creates_users() {
    let ctx = TestContext::new().await;
    let csv = "email,first_name,last_name\nnew@example.com,New,Person\n";

    let resp = app_as(&ctx, admin_ctx())
        .oneshot(multipart(
            "/api/admin/users/import",
            &[
                ("file", Some("users.csv"), csv),
                ("options", None, r#"{"skipDuplicates": true}"#),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["summary"]["created"], 1);
    assert_eq!(body["summary"]["errors"], 0);
    assert!(support::fetch_by_email(&ctx.db, "new@example.com").await.is_some());
}

#[tokio::test]
async fn import_without_file_or_with_bad_options_is_400() {
    let ctx = TestContext::new().await;
    let app = app_as(&ctx, admin_ctx());

    let resp = app
        .clone()
        .oneshot(multipart("/api/admin/users/import", &[("options", None, "{}")]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .oneshot(multipart(
            "/api/admin/users/import",
            &[
                ("file", Some("users.csv"), "email\na@example.com\n"),
                ("options", None, r#"{"dropTables": true}"#),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn permission_is_checked_before_the_payload() {
    let ctx = TestContext::new().await;
    let app = app_as(&ctx, ctx_with(&["user:read"]));

    let resp = app
        .clone()
        .oneshot(multipart(
            "/api/admin/users/import",
            &[
                ("file", Some("users.csv"), "email\na@example.com\n"),
                ("options", None, "{not json"),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await["code"], "INSUFFICIENT_PERMISSIONS");

    let resp = app
        .clone()
        .oneshot(multipart(
            "/api/admin/users/import/preview",
            &[("fieldMapping", None, "[1,2]")],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app_as(&ctx, ctx_with(&["role:read"]))
        .oneshot(get("/api/admin/users/export?format=docx"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn oversized_upload_is_413() {
    let mut cfg = user_admin::config::UserAdminConfig::default();
    cfg.import_max_file_size = 16;
    let ctx = TestContext::with_config(cfg).await;
    let csv = "email,first_name,last_name\nlong@example.com,Long,Upload\n";

    let resp = app_as(&ctx, admin_ctx())
        .oneshot(multipart(
            "/api/admin/users/import",
            &[("file", Some("users.csv"), csv)],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(resp).await["code"], "FILE_TOO_LARGE");
}

#[tokio::test]
async fn preview_returns_headers_and_suggestions() {
    let ctx = TestContext::new().await;
    let csv = "Mail,First Name,Last Name\na@example.com,A,B\n";

    let resp = app_as(&ctx, admin_ctx())
        .oneshot(multipart(
            "/api/admin/users/import/preview",
            &[("file", Some("users.csv"), csv)],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["headers"], json!(["Mail", "First Name", "Last Name"]));
    assert_eq!(body["totalRows"], 1);
    assert_eq!(body["suggestedMapping"]["Mail"], "email");
}

// ==================== Export ====================

#[tokio::test]
async fn export_sets_attachment_headers() {
    let ctx = TestContext::new().await;
    seed_user(&ctx.db, "a@example.com", true).await;
    seed_user(&ctx.db, "b@example.com", false).await;

    let resp = app_as(&ctx, admin_ctx())
        .oneshot(get("/api/admin/users/export?format=csv&status=active&fields=email,status"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let headers = resp.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "text/csv");
    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"users-export-"));
    assert!(disposition.ends_with(".csv\""));
    assert_eq!(headers["x-export-records"], "1");
    assert!(headers.contains_key("x-export-time"));

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert_eq!(text.lines().next(), Some("Email,Status"));
    assert!(text.contains("a@example.com"));
    assert!(!text.contains("b@example.com"));
}

#[tokio::test]
async fn export_defaults_to_csv_and_rejects_unknown_format() {
    let ctx = TestContext::new().await;
    let app = app_as(&ctx, admin_ctx());

    let resp = app.clone().oneshot(get("/api/admin/users/export")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/csv");

    let resp = app
        .oneshot(get("/api/admin/users/export?format=docx"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["code"], "INVALID_EXPORT_FORMAT");
}

// ==================== Single user ====================

#[tokio::test]
async fn single_user_lifecycle() {
    let ctx = TestContext::new().await;
    let app = app_as(&ctx, admin_ctx());

    let resp = app
        .clone()
        .oneshot(json_post(
            "/api/admin/users",
            &json!({
                "email": "Ada@Example.com",
                "password": "Engine1843",
                "first_name": "Ada",
                "last_name": "Lovelace",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["full_name"], "Ada Lovelace");
    assert_eq!(body["user"]["status"], "active");
    assert!(body["user"].get("password_hash").is_none());
    let id: Uuid = body["user"]["id"].as_str().unwrap().parse().unwrap();
    let uri = format!("/api/admin/users/{id}");

    let resp = app.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["metadata"]["canDelete"], true);
    assert_eq!(body["metadata"]["canToggleStatus"], true);

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &uri,
            &json!({ "first_name": "Augusta", "password": "lowercase123" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["user"]["first_name"], "Augusta");
    assert_eq!(body["validation"]["isValid"], true);
    assert_eq!(body["validation"]["warnings"].as_array().unwrap().len(), 1);
    assert_eq!(body["metadata"]["wasEmailChanged"], false);
    assert_eq!(
        body["metadata"]["previousValues"]["email"],
        "ada@example.com"
    );

    let resp = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &uri,
            &json!({ "is_active": false, "action": "ban", "reason": "spam" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["auditInfo"]["action"], "ban");
    assert_eq!(body["auditInfo"]["reason"], "spam");
    assert_eq!(body["user"]["status"], "inactive");
    assert!(!fetch(&ctx.db, id).await.unwrap().is_active);

    let resp = app.clone().oneshot(get("/api/admin/users")).await.unwrap();
    assert_eq!(body_json(resp).await["users"].as_array().unwrap().len(), 1);

    let resp = app
        .clone()
        .oneshot(Request::builder().method("DELETE").uri(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "User \"Augusta Lovelace\" deleted successfully");

    let resp = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["code"], "USER_NOT_FOUND");
}

#[tokio::test]
async fn single_user_errors_use_the_envelope() {
    let ctx = TestContext::new().await;
    let me = seed_user(&ctx.db, "admin@example.com", true).await;
    seed_user(&ctx.db, "taken@example.com", true).await;
    let app = app_as(&ctx, admin_ctx_as(me));

    let resp = app
        .clone()
        .oneshot(get("/api/admin/users/not-a-uuid"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["code"], "INVALID_USER_ID");

    let resp = app
        .clone()
        .oneshot(json_post(
            "/api/admin/users",
            &json!({ "email": "bad", "password": "short", "first_name": "A", "last_name": "B" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["details"]["errors"][0]["code"], "INVALID_EMAIL_FORMAT");
    assert_eq!(body["details"]["errors"][1]["code"], "WEAK_PASSWORD");

    let resp = app
        .clone()
        .oneshot(json_post(
            "/api/admin/users",
            &json!({
                "email": "TAKEN@example.com",
                "password": "Secret123",
                "first_name": "A",
                "last_name": "B",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(resp).await["code"], "EMAIL_ALREADY_EXISTS");

    let own = format!("/api/admin/users/{me}");
    let resp = app
        .clone()
        .oneshot(json_request("PATCH", &own, &json!({ "is_active": false })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["code"], "CANNOT_MODIFY_SELF");

    let resp = app
        .clone()
        .oneshot(Request::builder().method("DELETE").uri(&own).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["code"], "CANNOT_DELETE_SELF");

    let resp = app.oneshot(get(&own)).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["metadata"]["canEdit"], true);
    assert_eq!(body["metadata"]["canDelete"], false);
}

#[tokio::test]
async fn single_user_writes_need_their_own_permission() {
    let ctx = TestContext::new().await;
    let id = seed_user(&ctx.db, "ada@example.com", true).await;
    let app = app_as(&ctx, ctx_with(&["user:read"]));
    let uri = format!("/api/admin/users/{id}");

    let resp = app.clone().oneshot(get(&uri)).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["metadata"]["canEdit"], false);
    assert_eq!(body["metadata"]["canDelete"], false);

    let resp = app
        .clone()
        .oneshot(json_request("PUT", &uri, &json!({ "role_id": "not-a-uuid" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app
        .oneshot(json_post("/api/admin/users", &json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(fetch(&ctx.db, id).await.is_some());
}

// ==================== Email check ====================

#[tokio::test]
async fn check_email_reports_availability() {
    let ctx = TestContext::new().await;
    let id = seed_user(&ctx.db, "taken@example.com", true).await;
    let app = app_as(&ctx, admin_ctx());

    let resp = app
        .clone()
        .oneshot(get("/api/admin/users/check-email?email=Taken@Example.com"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CACHE_CONTROL],
        "no-cache, no-store, must-revalidate"
    );
    let body = body_json(resp).await;
    assert_eq!(body["available"], false);
    assert_eq!(body["email"], "taken@example.com");

    let resp = app
        .clone()
        .oneshot(get(&format!(
            "/api/admin/users/check-email?email=taken@example.com&excludeUserId={id}"
        )))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["available"], true);

    let resp = app
        .oneshot(get("/api/admin/users/check-email"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ==================== Auth ====================

fn token(permissions: &[&str], role: Option<&str>) -> String {
    token_from(permissions, role, None)
}

fn token_from(permissions: &[&str], role: Option<&str>, iss: Option<&str>) -> String {
    let claims = Claims {
        sub: Uuid::new_v4(),
        email: Some("ops@example.com".to_owned()),
        role: role.map(str::to_owned),
        permissions: permissions.iter().map(|p| (*p).to_owned()).collect(),
        exp: u64::try_from(time::OffsetDateTime::now_utc().unix_timestamp()).unwrap() + 600,
        iss: iss.map(str::to_owned),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn authed_get(uri: &str, token: Option<&str>) -> Request {
    let mut builder = Request::builder().uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn bearer_token_gates_every_route() {
    let ctx = TestContext::new().await;
    let app = ctx.module.router(Some(Arc::new(JwtAuth::new(SECRET, None))));
    let uri = "/api/admin/users/check-email?email=a@example.com";

    let resp = app.clone().oneshot(authed_get(uri, None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["code"], "UNAUTHORIZED");

    let resp = app
        .clone()
        .oneshot(authed_get(uri, Some("not.a.jwt")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let reader = token(&["user:read"], Some("SUPPORT"));
    let resp = app
        .clone()
        .oneshot(authed_get(uri, Some(&reader)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let nobody = token(&[], Some("SUPPORT"));
    let resp = app.oneshot(authed_get(uri, Some(&nobody))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await["code"], "INSUFFICIENT_PERMISSIONS");
}

#[tokio::test]
async fn configured_issuer_rejects_tokens_without_iss() {
    let ctx = TestContext::new().await;
    let app = ctx
        .module
        .router(Some(Arc::new(JwtAuth::new(SECRET, Some("admin-portal")))));
    let uri = "/api/admin/users/check-email?email=a@example.com";

    let unissued = token_from(&[], Some("ADMIN"), None);
    let resp = app
        .clone()
        .oneshot(authed_get(uri, Some(&unissued)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["code"], "UNAUTHORIZED");

    let issued = token_from(&[], Some("ADMIN"), Some("admin-portal"));
    let resp = app.oneshot(authed_get(uri, Some(&issued))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
