//! Import validation pipeline.
//!
//! Turns raw rows into write candidates plus row-level errors and warnings. The pipeline
//! is synchronous and storage-free: existing emails and roles are fetched once by the
//! service and handed in.

pub mod mapping;
pub mod schema;
pub mod upload;

use std::collections::{HashMap, HashSet};

use rand::distr::{Alphanumeric, SampleString};
use serde_json::Value;
use user_admin_sdk::{
    ErrorCode, ImportError, ImportOptions, ImportWarning, PasswordSource, RawRow, Role,
};
use uuid::Uuid;

use self::mapping::apply_field_mapping;
use self::schema::{MIN_PASSWORD_LEN, ValidRow, cell_text, normalize_email, validate_row};

/// Spreadsheet row number of the `index`-th data row (header is row 1).
#[must_use]
pub const fn row_number(index: usize) -> usize {
    index + 2
}

/// Random alphanumeric password, never shorter than the password policy allows.
#[must_use]
pub fn generate_password(length: usize) -> String {
    Alphanumeric.sample_string(&mut rand::rng(), length.max(MIN_PASSWORD_LEN))
}

/// Role lookup by id or case-insensitive name.
#[derive(Debug, Clone, Default)]
pub struct RoleDirectory {
    by_name: HashMap<String, Uuid>,
    ids: HashSet<Uuid>,
}

impl RoleDirectory {
    #[must_use]
    pub fn from_roles(roles: &[Role]) -> Self {
        Self {
            by_name: roles
                .iter()
                .map(|r| (r.name.to_lowercase(), r.id))
                .collect(),
            ids: roles.iter().map(|r| r.id).collect(),
        }
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<Uuid> {
        self.by_name.get(&name.trim().to_lowercase()).copied()
    }

    #[must_use]
    pub fn contains(&self, id: Uuid) -> bool {
        self.ids.contains(&id)
    }

    /// Resolve a role given either as an id or as a name.
    #[must_use]
    pub fn resolve(&self, id_or_name: &str) -> Option<Uuid> {
        match Uuid::parse_str(id_or_name.trim()) {
            Ok(id) => self.contains(id).then_some(id),
            Err(_) => self.by_name(id_or_name),
        }
    }
}

/// A validated row ready for the write phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportCandidate {
    pub row_number: usize,
    pub data: ValidRow,
    pub password_source: PasswordSource,
    /// The email already belongs to an account.
    pub is_update: bool,
}

impl ImportCandidate {
    /// Password to store; always present after validation.
    #[must_use]
    pub fn password(&self) -> &str {
        self.data.password.as_deref().unwrap_or_default()
    }
}

/// Result of running the validation pipeline over every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationOutcome {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    /// Valid rows excluded on purpose (`skipDuplicates`).
    pub skipped: usize,
    pub candidates: Vec<ImportCandidate>,
    pub errors: Vec<ImportError>,
    pub warnings: Vec<ImportWarning>,
}

enum RowVerdict {
    Candidate(Box<ImportCandidate>),
    Skipped,
    Invalid { stop: bool },
}

/// Runs field mapping, default injection, role resolution, password generation,
/// schema validation and duplicate detection over a batch of rows.
pub struct ImportValidator<'a> {
    options: &'a ImportOptions,
    default_role: Option<Uuid>,
    existing_emails: &'a HashSet<String>,
    roles: &'a RoleDirectory,
}

impl<'a> ImportValidator<'a> {
    #[must_use]
    pub fn new(
        options: &'a ImportOptions,
        default_role: Option<Uuid>,
        existing_emails: &'a HashSet<String>,
        roles: &'a RoleDirectory,
    ) -> Self {
        Self {
            options,
            default_role,
            existing_emails,
            roles,
        }
    }

    pub fn run(
        &self,
        rows: &[RawRow],
        next_password: &mut dyn FnMut() -> String,
    ) -> ValidationOutcome {
        let mut out = ValidationOutcome {
            total_rows: rows.len(),
            ..ValidationOutcome::default()
        };
        let mut seen_emails = HashSet::new();

        for (index, raw) in rows.iter().enumerate() {
            let row_no = row_number(index);
            match self.check_row(row_no, raw, &mut seen_emails, next_password, &mut out) {
                RowVerdict::Candidate(candidate) => {
                    out.valid_rows += 1;
                    out.candidates.push(*candidate);
                }
                RowVerdict::Skipped => {
                    out.valid_rows += 1;
                    out.skipped += 1;
                }
                RowVerdict::Invalid { stop: false } => out.invalid_rows += 1,
                RowVerdict::Invalid { stop: true } => {
                    out.invalid_rows += 1;
                    let remaining = rows.len() - index - 1;
                    if remaining > 0 {
                        out.invalid_rows += remaining;
                        out.warnings.push(ImportWarning {
                            row: row_no,
                            field: None,
                            message: format!(
                                "Validation stopped at row {row_no}; {remaining} remaining rows were not validated"
                            ),
                            value: None,
                        });
                    }
                    break;
                }
            }
        }

        tracing::debug!(
            total = out.total_rows,
            valid = out.valid_rows,
            invalid = out.invalid_rows,
            skipped = out.skipped,
            "import validation finished"
        );
        out
    }

    fn prepare_row(
        &self,
        row_no: usize,
        raw: &RawRow,
        next_password: &mut dyn FnMut() -> String,
        out: &mut ValidationOutcome,
    ) -> (RawRow, PasswordSource) {
        let mut row = apply_field_mapping(raw, &self.options.field_mapping);

        if cell_text(&row, "is_active").is_none() {
            row.insert(
                "is_active".to_owned(),
                Value::Bool(self.options.default_status),
            );
        }

        if cell_text(&row, "role_id").is_none() {
            let mut role_id = None;
            if let Some(name) = cell_text(&row, "role") {
                role_id = self.roles.by_name(&name);
                if role_id.is_none() {
                    out.warnings.push(ImportWarning {
                        row: row_no,
                        field: Some("role".to_owned()),
                        message: format!("Unknown role \"{name}\", using default"),
                        value: Some(Value::String(name)),
                    });
                }
            }
            if let Some(id) = role_id.or(self.default_role) {
                row.insert("role_id".to_owned(), Value::String(id.to_string()));
            }
        }

        let source = if cell_text(&row, "password").is_some() {
            PasswordSource::Provided
        } else {
            row.insert("password".to_owned(), Value::String(next_password()));
            out.warnings.push(ImportWarning {
                row: row_no,
                field: Some("password".to_owned()),
                message: "Generated temporary password".to_owned(),
                value: None,
            });
            PasswordSource::Generated
        };

        (row, source)
    }

    fn check_row(
        &self,
        row_no: usize,
        raw: &RawRow,
        seen_emails: &mut HashSet<String>,
        next_password: &mut dyn FnMut() -> String,
        out: &mut ValidationOutcome,
    ) -> RowVerdict {
        let (row, password_source) = self.prepare_row(row_no, raw, next_password, out);

        let data = match validate_row(&row) {
            Ok(data) => data,
            Err(violations) => {
                out.errors
                    .extend(violations.into_iter().map(|v| ImportError {
                        row: row_no,
                        field: v.field.to_owned(),
                        message: v.message,
                        code: ErrorCode::ValidationError,
                        value: v.value,
                    }));
                return RowVerdict::Invalid {
                    stop: !self.options.skip_invalid_rows,
                };
            }
        };

        if let Some(role_id) = data.role_id
            && !self.roles.contains(role_id)
        {
            out.errors.push(ImportError {
                row: row_no,
                field: "role_id".to_owned(),
                message: "Role does not exist".to_owned(),
                code: ErrorCode::InvalidRole,
                value: Some(Value::String(role_id.to_string())),
            });
            return RowVerdict::Invalid {
                stop: !self.options.skip_invalid_rows,
            };
        }

        let email = normalize_email(&data.email);
        if !seen_emails.insert(email.clone()) {
            out.errors.push(ImportError {
                row: row_no,
                field: "email".to_owned(),
                message: "Email appears more than once in the file".to_owned(),
                code: ErrorCode::DuplicateImportData,
                value: Some(Value::String(email)),
            });
            return RowVerdict::Invalid { stop: false };
        }

        let is_update = self.existing_emails.contains(&email);
        if is_update {
            if self.options.skip_duplicates {
                out.warnings.push(ImportWarning {
                    row: row_no,
                    field: Some("email".to_owned()),
                    message: "Email already exists, skipping".to_owned(),
                    value: Some(Value::String(email)),
                });
                return RowVerdict::Skipped;
            }
            if !self.options.update_existing {
                out.errors.push(ImportError {
                    row: row_no,
                    field: "email".to_owned(),
                    message: "Email already exists".to_owned(),
                    code: ErrorCode::EmailAlreadyExists,
                    value: Some(Value::String(email)),
                });
                return RowVerdict::Invalid { stop: false };
            }
        }

        RowVerdict::Candidate(Box::new(ImportCandidate {
            row_number: row_no,
            data,
            password_source,
            is_update,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const STAFF: Uuid = Uuid::from_u128(0x5);
    const GUEST: Uuid = Uuid::from_u128(0x6);

    fn rows(values: serde_json::Value) -> Vec<RawRow> {
        values
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    fn roles() -> RoleDirectory {
        RoleDirectory::from_roles(&[
            Role {
                id: STAFF,
                name: "Staff".to_owned(),
                description: None,
            },
            Role {
                id: GUEST,
                name: "Guest".to_owned(),
                description: None,
            },
        ])
    }

    fn run(options: &ImportOptions, existing: &[&str], input: &[RawRow]) -> ValidationOutcome {
        let existing: HashSet<String> = existing.iter().map(|e| (*e).to_owned()).collect();
        let roles = roles();
        let default_role = options
            .default_role
            .as_deref()
            .and_then(|r| roles.resolve(r));
        let mut next = || "generated-pass-123".to_owned();
        ImportValidator::new(options, default_role, &existing, &roles).run(input, &mut next)
    }

    #[test]
    fn three_row_scenario_counts() {
        let input = rows(json!([
            {"email": "new@x.com", "first_name": "New", "last_name": "User"},
            {"first_name": "No", "last_name": "Email"},
            {"email": "a@x.com", "first_name": "Dup", "last_name": "User"}
        ]));
        let out = run(&ImportOptions::default(), &["a@x.com"], &input);

        assert_eq!(out.total_rows, 3);
        assert_eq!(out.valid_rows, 1);
        assert_eq!(out.invalid_rows, 2);
        assert_eq!(out.candidates.len(), 1);
        assert_eq!(out.candidates[0].row_number, 2);

        let codes: Vec<(usize, ErrorCode)> = out.errors.iter().map(|e| (e.row, e.code)).collect();
        assert_eq!(
            codes,
            [
                (3, ErrorCode::ValidationError),
                (4, ErrorCode::EmailAlreadyExists)
            ]
        );
    }

    #[test]
    fn skip_duplicates_warns_and_counts_skipped() {
        let input = rows(json!([{"email": "A@x.com", "first_name": "A", "last_name": "B"}]));
        let options = ImportOptions {
            skip_duplicates: true,
            ..ImportOptions::default()
        };
        let out = run(&options, &["a@x.com"], &input);

        assert!(out.errors.is_empty());
        assert_eq!(out.skipped, 1);
        assert_eq!(out.valid_rows, 1);
        assert!(out.candidates.is_empty());
        assert!(
            out.warnings
                .iter()
                .any(|w| w.message == "Email already exists, skipping")
        );
    }

    #[test]
    fn update_existing_marks_row_as_update() {
        let input = rows(json!([{"email": "a@x.com", "first_name": "A", "last_name": "B"}]));
        let options = ImportOptions {
            update_existing: true,
            ..ImportOptions::default()
        };
        let out = run(&options, &["a@x.com"], &input);

        assert!(out.errors.is_empty());
        assert!(out.candidates[0].is_update);
    }

    #[test]
    fn stop_at_first_invalid_row_keeps_counts_balanced() {
        let input = rows(json!([
            {"email": "ok@x.com", "first_name": "A", "last_name": "B"},
            {"email": "bad", "first_name": "A", "last_name": "B"},
            {"email": "later@x.com", "first_name": "A", "last_name": "B"},
            {"email": "last@x.com", "first_name": "A", "last_name": "B"}
        ]));
        let options = ImportOptions {
            skip_invalid_rows: false,
            ..ImportOptions::default()
        };
        let out = run(&options, &[], &input);

        assert_eq!(out.valid_rows, 1);
        assert_eq!(out.invalid_rows, 3);
        assert_eq!(out.valid_rows + out.invalid_rows, out.total_rows);
        assert!(out.warnings.iter().any(|w| w.message.contains("2 remaining rows")));
    }

    #[test]
    fn role_names_resolve_and_unknown_falls_back_to_default() {
        let input = rows(json!([
            {"email": "a@x.com", "first_name": "A", "last_name": "B", "role": "staff"},
            {"email": "b@x.com", "first_name": "A", "last_name": "B", "role": "Pirate"},
            {"email": "c@x.com", "first_name": "A", "last_name": "B"}
        ]));
        let options = ImportOptions {
            default_role: Some("guest".to_owned()),
            ..ImportOptions::default()
        };
        let out = run(&options, &[], &input);

        let role_ids: Vec<Option<Uuid>> = out.candidates.iter().map(|c| c.data.role_id).collect();
        assert_eq!(role_ids, [Some(STAFF), Some(GUEST), Some(GUEST)]);
        assert!(
            out.warnings
                .iter()
                .any(|w| w.row == 3 && w.message == "Unknown role \"Pirate\", using default")
        );
    }

    #[test]
    fn missing_password_is_generated_with_warning() {
        let input = rows(json!([
            {"email": "a@x.com", "first_name": "A", "last_name": "B"},
            {"email": "b@x.com", "first_name": "A", "last_name": "B", "password": "my-own-secret"}
        ]));
        let out = run(&ImportOptions::default(), &[], &input);

        assert_eq!(out.candidates[0].password_source, PasswordSource::Generated);
        assert_eq!(out.candidates[0].password(), "generated-pass-123");
        assert_eq!(out.candidates[1].password_source, PasswordSource::Provided);
        let generated: Vec<usize> = out
            .warnings
            .iter()
            .filter(|w| w.message == "Generated temporary password")
            .map(|w| w.row)
            .collect();
        assert_eq!(generated, [2]);
    }

    #[test]
    fn repeated_email_in_file_is_rejected() {
        let input = rows(json!([
            {"email": "a@x.com", "first_name": "A", "last_name": "B"},
            {"email": "A@X.com", "first_name": "C", "last_name": "D"}
        ]));
        let out = run(&ImportOptions::default(), &[], &input);

        assert_eq!(out.valid_rows, 1);
        assert_eq!(out.errors[0].code, ErrorCode::DuplicateImportData);
        assert_eq!(out.errors[0].row, 3);
    }

    #[test]
    fn field_mapping_applies_before_validation() {
        let input = rows(json!([{"Mail": "a@x.com", "Given": "A", "Family": "B"}]));
        let options = ImportOptions {
            field_mapping: HashMap::from([
                ("Mail".to_owned(), "email".to_owned()),
                ("Given".to_owned(), "first_name".to_owned()),
                ("Family".to_owned(), "last_name".to_owned()),
            ]),
            ..ImportOptions::default()
        };
        let out = run(&options, &[], &input);
        assert_eq!(out.valid_rows, 1);
        assert_eq!(out.candidates[0].data.email, "a@x.com");
    }

    #[test]
    fn generated_passwords_respect_minimum_length() {
        assert_eq!(generate_password(3).len(), MIN_PASSWORD_LEN);
        let p = generate_password(16);
        assert_eq!(p.len(), 16);
        assert!(p.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn unknown_role_id_is_invalid_role() {
        let input = rows(json!([{
            "email": "a@x.com", "first_name": "A", "last_name": "B",
            "role_id": Uuid::from_u128(0x99).to_string()
        }]));
        let out = run(&ImportOptions::default(), &[], &input);
        assert_eq!(out.invalid_rows, 1);
        assert_eq!(out.errors[0].code, ErrorCode::InvalidRole);
    }
}
