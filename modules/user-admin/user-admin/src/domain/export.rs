//! Export records: the sensitive-field-free view of a user, field selection and
//! the table handed to renderers.

use serde_json::{Map, Value, json};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use user_admin_sdk::{ActivityStatus, ExportFilters, Role, StatusFilter, User};

use crate::domain::error::DomainError;

/// Every exportable field, in default output order.
pub const EXPORT_FIELDS: &[&str] = &[
    "id",
    "email",
    "first_name",
    "last_name",
    "full_name",
    "is_active",
    "status",
    "activity_status",
    "role_name",
    "role_description",
    "created_at",
    "updated_at",
    "last_login",
    "last_logout",
    "sex",
    "birthday",
    "age",
    "address",
    "locale",
    "group_id",
    "coin",
    "has_avatar",
];

/// `"first_name"` becomes `"First Name"`.
#[must_use]
pub fn header_label(field: &str) -> String {
    field
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Validate a requested field list; `None` or an empty list selects every field.
///
/// # Errors
/// [`DomainError::Validation`] naming the first unknown field.
pub fn resolve_fields(requested: Option<&[String]>) -> Result<Vec<String>, DomainError> {
    let Some(requested) = requested.filter(|r| !r.is_empty()) else {
        return Ok(EXPORT_FIELDS.iter().map(|f| (*f).to_owned()).collect());
    };
    requested
        .iter()
        .map(|f| {
            let f = f.trim();
            if EXPORT_FIELDS.contains(&f) {
                Ok(f.to_owned())
            } else {
                Err(DomainError::validation(
                    "fields",
                    format!("Unknown export field '{f}'"),
                ))
            }
        })
        .collect()
}

fn rfc3339(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_default()
}

/// Whole years between a `YYYY-MM-DD` birthday and `today`.
pub(crate) fn age_on(birthday: &str, today: Date) -> Option<i32> {
    let born = Date::parse(birthday.get(..10)?, format_description!("[year]-[month]-[day]")).ok()?;
    let mut years = today.year() - born.year();
    if (u8::from(today.month()), today.day()) < (u8::from(born.month()), born.day()) {
        years -= 1;
    }
    (years >= 0).then_some(years)
}

/// Project a user onto the export fields. Password hashes and webhook URLs never appear.
#[must_use]
pub fn transform(user: &User, role: Option<&Role>, now: OffsetDateTime) -> Map<String, Value> {
    let text = |v: Option<&String>| Value::String(v.cloned().unwrap_or_default());
    let sex = match user.sex {
        Some(true) => "Male",
        Some(false) => "Female",
        None => "",
    };
    let age = user
        .birthday
        .as_deref()
        .and_then(|b| age_on(b, now.date()))
        .map_or_else(|| Value::String(String::new()), Value::from);
    let group_id = user
        .group_id
        .map_or_else(|| Value::String(String::new()), Value::from);

    let mut record = Map::new();
    record.insert("id".into(), Value::String(user.id.to_string()));
    record.insert("email".into(), Value::String(user.email.clone()));
    record.insert("first_name".into(), Value::String(user.first_name.clone()));
    record.insert("last_name".into(), Value::String(user.last_name.clone()));
    record.insert("full_name".into(), Value::String(user.full_name()));
    record.insert("is_active".into(), Value::Bool(user.is_active));
    record.insert(
        "status".into(),
        Value::from(if user.is_active { "active" } else { "inactive" }),
    );
    record.insert(
        "activity_status".into(),
        Value::from(ActivityStatus::of(user, now).as_str()),
    );
    record.insert(
        "role_name".into(),
        Value::String(role.map_or_else(|| "No Role".to_owned(), |r| r.name.clone())),
    );
    record.insert(
        "role_description".into(),
        text(role.and_then(|r| r.description.as_ref())),
    );
    record.insert("created_at".into(), Value::String(rfc3339(user.created_at)));
    record.insert("updated_at".into(), Value::String(rfc3339(user.updated_at)));
    record.insert(
        "last_login".into(),
        Value::String(user.last_login.map_or_else(|| "Never".to_owned(), rfc3339)),
    );
    record.insert(
        "last_logout".into(),
        Value::String(user.last_logout.map(rfc3339).unwrap_or_default()),
    );
    record.insert("sex".into(), Value::from(sex));
    record.insert("birthday".into(), text(user.birthday.as_ref()));
    record.insert("age".into(), age);
    record.insert("address".into(), text(user.address.as_ref()));
    record.insert("locale".into(), text(user.locale.as_ref()));
    record.insert("group_id".into(), group_id);
    record.insert("coin".into(), Value::String(user.coin.to_string()));
    record.insert(
        "has_avatar".into(),
        Value::from(if user.avatar.is_some() { "Yes" } else { "No" }),
    );
    record
}

/// Plain-text rendering of a record value for tabular formats.
#[must_use]
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Selected fields plus the transformed records, ready to render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportTable {
    pub fields: Vec<String>,
    pub records: Vec<Map<String, Value>>,
}

impl ExportTable {
    /// Keep only `fields` in each record, in field order.
    #[must_use]
    pub fn new(fields: Vec<String>, records: Vec<Map<String, Value>>) -> Self {
        let records = records
            .into_iter()
            .map(|mut record| {
                fields
                    .iter()
                    .map(|f| (f.clone(), record.remove(f).unwrap_or(Value::Null)))
                    .collect()
            })
            .collect();
        Self { fields, records }
    }

    #[must_use]
    pub fn headers(&self) -> Vec<String> {
        self.fields.iter().map(|f| header_label(f)).collect()
    }

    /// Rows as display strings, in field order.
    pub fn text_rows(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.records
            .iter()
            .map(|r| self.fields.iter().map(|f| cell_text(r.get(f))).collect())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Envelope data attached to JSON exports.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportMetadata {
    pub total_records: u64,
    pub exported_records: usize,
    pub export_date: OffsetDateTime,
    pub filters: Value,
    pub fields: Vec<String>,
}

/// The filters that were actually applied, as a JSON object.
#[must_use]
pub fn filters_json(filters: &ExportFilters) -> Value {
    let mut out = Map::new();
    if let Some(s) = &filters.search {
        out.insert("search".into(), json!(s));
    }
    if let Some(r) = &filters.role {
        out.insert("role".into(), json!(r));
    }
    match filters.status {
        StatusFilter::All => {}
        StatusFilter::Active => {
            out.insert("status".into(), json!("active"));
        }
        StatusFilter::Inactive => {
            out.insert("status".into(), json!("inactive"));
        }
    }
    if let Some(d) = filters.date_from {
        out.insert("dateFrom".into(), json!(d.to_string()));
    }
    if let Some(d) = filters.date_to {
        out.insert("dateTo".into(), json!(d.to_string()));
    }
    if let Some(b) = filters.has_avatar {
        out.insert("hasAvatar".into(), json!(b));
    }
    if let Some(l) = &filters.locale {
        out.insert("locale".into(), json!(l));
    }
    if let Some(g) = filters.group_id {
        out.insert("groupId".into(), json!(g));
    }
    if let Some(a) = filters.activity_status {
        out.insert("activityStatus".into(), json!(a.as_str()));
    }
    Value::Object(out)
}
