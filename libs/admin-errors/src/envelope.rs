//! The JSON error body returned by every failing admin endpoint.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Impact classification of an error, surfaced to clients for display decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

fn default_status() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Error envelope shared across endpoints.
///
/// `error` describes this occurrence, `userMessage` is the catalog text safe to show
/// to end users, and `technicalMessage` carries diagnostic detail for 4xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[must_use]
pub struct ErrorEnvelope {
    /// Transport status; not part of the body.
    #[serde(skip, default = "default_status")]
    pub status: StatusCode,
    pub error: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub severity: Severity,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub user_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_message: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(
        status: StatusCode,
        error: impl Into<String>,
        code: impl Into<String>,
        user_message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            error: error.into(),
            code: code.into(),
            details: None,
            severity: Severity::Medium,
            timestamp: OffsetDateTime::now_utc(),
            user_message: user_message.into(),
            technical_message: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_technical_message(mut self, msg: impl Into<String>) -> Self {
        self.technical_message = Some(msg.into());
        self
    }

    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for ErrorEnvelope {
    fn into_response(self) -> axum::response::Response {
        if self.is_server_error() {
            tracing::debug!(code = %self.code, status = %self.status, "returning server error envelope");
        }
        let status = self.status;
        let mut resp = axum::Json(self).into_response();
        *resp.status_mut() = status;
        resp
    }
}
