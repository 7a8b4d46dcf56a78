use admin_errors::{ErrorEnvelope, finalize};
use serde_json::json;

use crate::domain::error::DomainError;
use crate::errors::err_def;

/// Map a domain error to the JSON error envelope using the catalog.
///
/// Server-side failures are logged here and their diagnostic text is kept out of
/// the response body.
pub fn domain_error_to_response(e: &DomainError) -> ErrorEnvelope {
    let code = e.code();
    let def = err_def(code);

    let (error, details) = match e {
        DomainError::UserNotFound { id } => (
            format!("User with id {id} was not found"),
            Some(json!({ "userId": id })),
        ),
        DomainError::EmailAlreadyExists { email } => (
            format!("Email '{email}' is already in use"),
            Some(json!({ "field": "email" })),
        ),
        DomainError::Validation { field, message } => (
            message.clone(),
            Some(json!({ "field": field })),
        ),
        DomainError::InvalidFields { errors } => (
            errors
                .first()
                .map_or_else(|| def.message.to_owned(), |f| f.message.clone()),
            Some(json!({
                "errors": errors
                    .iter()
                    .map(|f| json!({ "field": f.field, "message": f.message, "code": f.code.as_str() }))
                    .collect::<Vec<_>>(),
            })),
        ),
        DomainError::CannotModifySelf { .. } => (def.message.to_owned(), None),
        DomainError::TooManyUsersSelected { count, max } => (
            format!("Too many users selected: {count} (max {max})"),
            Some(json!({ "count": count, "max": max })),
        ),
        DomainError::FileTooLarge { size, max } => (
            format!("File size {size} bytes exceeds the {max} byte limit"),
            Some(json!({ "size": size, "maxSize": max })),
        ),
        DomainError::ExportLimitExceeded { total, max } => (
            format!("Export limit exceeded. Maximum {max} records allowed, found {total}"),
            Some(json!({ "total": total, "max": max })),
        ),
        DomainError::Forbidden { action, resource } => (
            def.message.to_owned(),
            Some(json!({ "action": action.as_str(), "resource": resource.to_string() })),
        ),
        other => (other.to_string(), None),
    };

    let envelope = def.as_envelope(error);
    if envelope.is_server_error() {
        tracing::error!(code = %code, error = %e, "request failed");
        // The occurrence text may carry storage internals; show the catalog text instead.
        let envelope = def.as_default_envelope();
        return finalize(envelope, None, details);
    }

    tracing::debug!(code = %code, "request rejected");
    finalize(envelope, Some(e.to_string()), details)
}

/// Implement `From<DomainError>` for the envelope so handlers can use `?`.
impl From<DomainError> for ErrorEnvelope {
    fn from(e: DomainError) -> Self {
        domain_error_to_response(&e)
    }
}
