//! Column renaming applied to raw rows before validation.

use std::collections::{BTreeMap, HashMap};

use user_admin_sdk::RawRow;

/// Known header spellings per target field, in priority order.
const HEADER_VARIATIONS: &[(&str, &[&str])] = &[
    (
        "email",
        &["email", "e-mail", "email_address", "emailaddress", "mail"],
    ),
    (
        "first_name",
        &["first_name", "firstname", "first", "fname", "given_name"],
    ),
    (
        "last_name",
        &[
            "last_name",
            "lastname",
            "last",
            "lname",
            "surname",
            "family_name",
        ],
    ),
    ("password", &["password", "pwd", "pass"]),
    ("role", &["role", "user_role", "role_name", "user_type"]),
    ("is_active", &["is_active", "active", "status", "enabled"]),
    (
        "birthday",
        &["birthday", "birth_date", "date_of_birth", "dob"],
    ),
    ("address", &["address", "location", "street_address"]),
    ("locale", &["locale", "language", "lang"]),
    ("sex", &["sex", "gender"]),
];

/// Rename the keys of `row` according to `mapping`; unmapped keys pass through.
#[must_use]
pub fn apply_field_mapping<S: std::hash::BuildHasher>(
    row: &RawRow,
    mapping: &HashMap<String, String, S>,
) -> RawRow {
    if mapping.is_empty() {
        return row.clone();
    }
    row.iter()
        .map(|(key, value)| {
            let target = mapping.get(key).unwrap_or(key);
            (target.clone(), value.clone())
        })
        .collect()
}

fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase().replace(' ', "_")
}

/// Suggest a source-to-target mapping for headers that match a known spelling.
#[must_use]
pub fn suggest_field_mapping(headers: &[String]) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|header| {
            let normalized = normalize_header(header);
            HEADER_VARIATIONS
                .iter()
                .find(|(_, variations)| variations.contains(&normalized.as_str()))
                .map(|(target, _)| (header.clone(), (*target).to_owned()))
        })
        .collect()
}
