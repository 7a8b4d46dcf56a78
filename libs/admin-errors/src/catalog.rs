//! Static error catalog entries.

use crate::envelope::{ErrorEnvelope, Severity};
use http::StatusCode;

/// Static error definition from a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrDef {
    pub status: u16,
    pub code: &'static str,
    pub message: &'static str,
    pub severity: Severity,
}

impl ErrDef {
    /// HTTP status of this definition, falling back to 500 for invalid values.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Build an envelope for this definition with an occurrence-specific message.
    #[inline]
    pub fn as_envelope(&self, error: impl Into<String>) -> ErrorEnvelope {
        ErrorEnvelope::new(self.status_code(), error, self.code, self.message)
            .with_severity(self.severity)
    }

    /// Build an envelope whose occurrence message is the catalog default.
    #[inline]
    pub fn as_default_envelope(&self) -> ErrorEnvelope {
        self.as_envelope(self.message)
    }
}
