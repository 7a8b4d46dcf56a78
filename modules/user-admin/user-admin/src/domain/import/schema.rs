//! Row schema for imported users.
//!
//! Cells arrive as loosely typed JSON values (CSV yields strings, spreadsheets yield
//! numbers and booleans too), so every field is coerced before it is checked.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use user_admin_sdk::RawRow;
use uuid::Uuid;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_ADDRESS_LEN: usize = 500;
pub const MIN_PASSWORD_LEN: usize = 8;

#[allow(clippy::expect_used)] // literal pattern, cannot fail
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex should not panic")
});

/// Shape check used by both imports and the availability endpoint.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Trim and lowercase an email for storage and comparison.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A single failed field of a row.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
    pub value: Option<Value>,
}

impl FieldViolation {
    fn new(field: &'static str, message: impl Into<String>, value: Option<&Value>) -> Self {
        Self {
            field,
            message: message.into(),
            value: value.cloned(),
        }
    }
}

/// A row that passed schema validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRow {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: Option<String>,
    pub role_id: Option<Uuid>,
    pub is_active: bool,
    pub sex: Option<bool>,
    pub birthday: Option<String>,
    pub address: Option<String>,
    pub locale: Option<String>,
    pub group_id: Option<i32>,
    pub slack_webhook_url: Option<String>,
}

/// Textual form of a cell; empty strings and nulls are absent.
#[must_use]
pub fn cell_text(row: &RawRow, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_owned())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "y" | "active" | "enabled" => Some(true),
            "false" | "0" | "no" | "n" | "inactive" | "disabled" => Some(false),
            _ => None,
        },
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn coerce_sex(value: &Value) -> Option<bool> {
    if let Value::String(s) = value {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => return Some(true),
            "female" | "f" => return Some(false),
            _ => {}
        }
    }
    coerce_bool(value)
}

#[allow(clippy::cast_possible_truncation)] // whole floats only
fn coerce_int(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f.round() as i64))
            .and_then(|i| i32::try_from(i).ok()),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn present<'a>(row: &'a RawRow, key: &str) -> Option<&'a Value> {
    row.get(key).filter(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    })
}

fn required_name(
    row: &RawRow,
    key: &'static str,
    label: &str,
    violations: &mut Vec<FieldViolation>,
) -> String {
    match cell_text(row, key) {
        None => {
            violations.push(FieldViolation::new(
                key,
                format!("{label} is required"),
                row.get(key),
            ));
            String::new()
        }
        Some(name) if name.chars().count() > MAX_NAME_LEN => {
            violations.push(FieldViolation::new(
                key,
                format!("{label} must be at most {MAX_NAME_LEN} characters"),
                row.get(key),
            ));
            name
        }
        Some(name) => name,
    }
}

/// Validate one prepared row against the user schema.
///
/// # Errors
/// Returns every failing field, in schema order.
#[allow(clippy::too_many_lines)]
pub fn validate_row(row: &RawRow) -> Result<ValidRow, Vec<FieldViolation>> {
    let mut violations = Vec::new();

    let email = match cell_text(row, "email") {
        None => {
            violations.push(FieldViolation::new(
                "email",
                "Email is required",
                row.get("email"),
            ));
            String::new()
        }
        Some(raw) if !is_valid_email(&raw) => {
            violations.push(FieldViolation::new(
                "email",
                "Invalid email format",
                row.get("email"),
            ));
            raw
        }
        Some(raw) => normalize_email(&raw),
    };

    let first_name = required_name(row, "first_name", "First name", &mut violations);
    let last_name = required_name(row, "last_name", "Last name", &mut violations);

    let password = cell_text(row, "password");
    if let Some(p) = &password
        && p.chars().count() < MIN_PASSWORD_LEN
    {
        violations.push(FieldViolation::new(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            None,
        ));
    }

    let role_id = match cell_text(row, "role_id") {
        None => None,
        Some(raw) => {
            if let Ok(id) = Uuid::parse_str(&raw) {
                Some(id)
            } else {
                violations.push(FieldViolation::new(
                    "role_id",
                    "Invalid role ID",
                    row.get("role_id"),
                ));
                None
            }
        }
    };

    let is_active = match present(row, "is_active") {
        None => true,
        Some(v) => coerce_bool(v).unwrap_or_else(|| {
            violations.push(FieldViolation::new(
                "is_active",
                "Expected a boolean",
                Some(v),
            ));
            true
        }),
    };

    let sex = present(row, "sex").and_then(|v| {
        let parsed = coerce_sex(v);
        if parsed.is_none() {
            violations.push(FieldViolation::new(
                "sex",
                "Expected male/female or a boolean",
                Some(v),
            ));
        }
        parsed
    });

    let address = cell_text(row, "address");
    if let Some(a) = &address
        && a.chars().count() > MAX_ADDRESS_LEN
    {
        violations.push(FieldViolation::new(
            "address",
            format!("Address must be at most {MAX_ADDRESS_LEN} characters"),
            row.get("address"),
        ));
    }

    let group_id = present(row, "group_id").and_then(|v| {
        let parsed = coerce_int(v);
        if parsed.is_none() {
            violations.push(FieldViolation::new(
                "group_id",
                "Expected an integer",
                Some(v),
            ));
        }
        parsed
    });

    let slack_webhook_url = cell_text(row, "slack_webhook_url");
    if let Some(u) = &slack_webhook_url
        && url::Url::parse(u).is_err()
    {
        violations.push(FieldViolation::new(
            "slack_webhook_url",
            "Invalid URL",
            row.get("slack_webhook_url"),
        ));
    }

    if !violations.is_empty() {
        return Err(violations);
    }

    Ok(ValidRow {
        email,
        first_name,
        last_name,
        password,
        role_id,
        is_active,
        sex,
        birthday: cell_text(row, "birthday"),
        address,
        locale: cell_text(row, "locale"),
        group_id,
        slack_webhook_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> RawRow {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn valid_row_is_normalized() {
        let r = row(json!({
            "email": "  Ada@Example.COM ",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "password": "correct-horse",
            "is_active": "no",
            "sex": "F",
            "group_id": "7",
            "notes": "ignored"
        }));
        let v = validate_row(&r).unwrap();
        assert_eq!(v.email, "ada@example.com");
        assert!(!v.is_active);
        assert_eq!(v.sex, Some(false));
        assert_eq!(v.group_id, Some(7));
    }

    #[test]
    fn every_failing_field_is_reported() {
        let r = row(json!({
            "email": "not-an-email",
            "first_name": "",
            "last_name": "x".repeat(101),
            "password": "short",
            "role_id": "abc",
            "slack_webhook_url": "::::",
        }));
        let fields: Vec<&str> = validate_row(&r)
            .unwrap_err()
            .into_iter()
            .map(|v| v.field)
            .collect();
        assert_eq!(
            fields,
            [
                "email",
                "first_name",
                "last_name",
                "password",
                "role_id",
                "slack_webhook_url"
            ]
        );
    }

    #[test]
    fn missing_email_is_required_error() {
        let r = row(json!({"first_name": "A", "last_name": "B"}));
        let errs = validate_row(&r).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].message, "Email is required");
    }

    #[test]
    fn password_value_is_never_echoed() {
        let r = row(json!({"email": "a@x.com", "first_name": "A", "last_name": "B", "password": "123"}));
        let errs = validate_row(&r).unwrap_err();
        assert_eq!(errs[0].field, "password");
        assert!(errs[0].value.is_none());
    }

    #[test]
    fn spreadsheet_numbers_coerce() {
        let r = row(json!({
            "email": "a@x.com", "first_name": "A", "last_name": "B",
            "is_active": 1, "group_id": 3.0
        }));
        let v = validate_row(&r).unwrap();
        assert!(v.is_active);
        assert_eq!(v.group_id, Some(3));
    }
}
