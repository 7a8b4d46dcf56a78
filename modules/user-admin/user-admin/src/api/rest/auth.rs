//! Bearer-token authentication: HS256 JWT claims become a [`SecurityContext`].

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::security::{Permission, SecurityContext};

/// Token claims accepted by the admin API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Verifies tokens with a shared secret.
#[derive(Clone)]
pub struct JwtAuth {
    key: DecodingKey,
    validation: Validation,
}

impl JwtAuth {
    #[must_use]
    pub fn new(secret: &str, issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(iss) = issuer {
            validation.set_issuer(&[iss]);
            // a token without `iss` must not pass
            validation.set_required_spec_claims(&["exp", "iss"]);
        }
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// # Errors
    /// [`DomainError::Unauthorized`] for a bad signature, expired token or malformed claims.
    pub fn verify(&self, token: &str) -> Result<SecurityContext, DomainError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| DomainError::unauthorized(format!("invalid token: {e}")))?;
        Ok(context_from_claims(data.claims))
    }
}

/// Unparseable permission strings are dropped, never widened.
fn context_from_claims(claims: Claims) -> SecurityContext {
    let permissions = claims
        .permissions
        .iter()
        .filter_map(|p| match p.parse::<Permission>() {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!(subject_id = %claims.sub, error = %e, "ignoring permission");
                None
            }
        })
        .collect();

    let mut builder = SecurityContext::builder()
        .subject_id(claims.sub)
        .permissions(permissions);
    if let Some(email) = claims.email {
        builder = builder.email(email);
    }
    if let Some(role) = claims.role {
        builder = builder.role(role);
    }
    builder.build()
}

/// Extract Bearer token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer ").map(str::trim))
        .filter(|t| !t.is_empty())
}

/// Reject the request with `UNAUTHORIZED` unless it carries a valid token.
pub async fn require_auth(
    State(auth): State<Arc<JwtAuth>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer_token(request.headers()) else {
        tracing::debug!("missing bearer token");
        return admin_errors::ErrorEnvelope::from(DomainError::unauthorized(
            "missing bearer token",
        ))
        .into_response();
    };

    match auth.verify(token) {
        Ok(ctx) => {
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "token rejected");
            admin_errors::ErrorEnvelope::from(e).into_response()
        }
    }
}
