use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use user_admin_sdk::{
    ErrorCode, ImportError, ImportOptions, ImportPreview, ImportPreviewRow, ImportReport,
    ImportSummary, ImportWarning, PasswordSource, RawRow,
};
use uuid::Uuid;

use super::Service;
use crate::domain::error::DomainError;
use crate::domain::import::mapping::{apply_field_mapping, suggest_field_mapping};
use crate::domain::import::schema::{cell_text, validate_row};
use crate::domain::import::upload::{ImportUpload, ParsedSheet};
use crate::domain::import::{
    ImportCandidate, ImportValidator, RoleDirectory, ValidationOutcome, generate_password,
};
use crate::domain::repos::{NewUserRecord, UserImportPatch};
use crate::domain::security::{Action, Resource, SecurityContext};

const SLACK_HOOK_PREFIX: &str = "https://hooks.slack.com/";

/// Check size and format, then parse on the blocking pool.
async fn read_upload(svc: &Service, upload: ImportUpload) -> Result<ParsedSheet, DomainError> {
    upload.ensure_size(svc.config.import_max_file_size)?;
    let kind = upload.kind()?;

    let reader = Arc::clone(&svc.reader);
    let bytes = upload.bytes;
    let sheet = tokio::task::spawn_blocking(move || reader.read(kind, &bytes))
        .await
        .map_err(|e| DomainError::internal(format!("import parser task failed: {e}")))??;

    if sheet.rows.is_empty() {
        return Err(DomainError::import_data_invalid(
            "The file contains no data rows",
        ));
    }
    tracing::debug!(rows = sheet.rows.len(), headers = sheet.headers.len(), "parsed upload");
    Ok(sheet)
}

fn resolve_default_role(
    options: &ImportOptions,
    roles: &RoleDirectory,
) -> Result<Option<Uuid>, DomainError> {
    options
        .default_role
        .as_deref()
        .map(|role| {
            roles.resolve(role).ok_or_else(|| {
                DomainError::validation("defaultRole", format!("Unknown role '{role}'"))
            })
        })
        .transpose()
}

fn preview_rows(candidates: &[ImportCandidate], limit: usize) -> Vec<ImportPreviewRow> {
    candidates
        .iter()
        .take(limit)
        .map(|c| ImportPreviewRow {
            row_number: c.row_number,
            email: c.data.email.clone(),
            first_name: c.data.first_name.clone(),
            last_name: c.data.last_name.clone(),
            role_id: c.data.role_id,
            is_active: c.data.is_active,
            is_update: c.is_update,
            password: c.password_source,
        })
        .collect()
}

/// Storage-level write for one candidate. Only a password supplied in the file replaces
/// the stored one on update.
async fn write_candidate(svc: &Service, candidate: &ImportCandidate) -> Result<bool, DomainError> {
    let row = &candidate.data;
    if candidate.is_update {
        let password_hash = match candidate.password_source {
            PasswordSource::Provided => {
                Some(svc.hasher.hash(candidate.password().to_owned()).await?)
            }
            PasswordSource::Generated => None,
        };
        let patch = UserImportPatch {
            password_hash,
            first_name: row.first_name.clone(),
            last_name: row.last_name.clone(),
            is_active: row.is_active,
            role_id: row.role_id,
            sex: row.sex,
            birthday: row.birthday.clone(),
            address: row.address.clone(),
            locale: row.locale.clone(),
            group_id: row.group_id,
            slack_webhook_url: row.slack_webhook_url.clone(),
        };
        svc.users.update_by_email(&row.email, patch).await?;
        Ok(false)
    } else {
        let password_hash = svc.hasher.hash(candidate.password().to_owned()).await?;
        let record = NewUserRecord {
            id: Uuid::new_v4(),
            email: row.email.clone(),
            password_hash,
            first_name: row.first_name.clone(),
            last_name: row.last_name.clone(),
            is_active: row.is_active,
            role_id: row.role_id,
            sex: row.sex,
            birthday: row.birthday.clone(),
            address: row.address.clone(),
            locale: row.locale.clone(),
            group_id: row.group_id,
            slack_webhook_url: row.slack_webhook_url.clone(),
            coin: 0,
        };
        svc.users.create(record).await?;
        Ok(true)
    }
}

fn write_error(candidate: &ImportCandidate, error: &DomainError) -> ImportError {
    let code = error.code();
    let (field, message) = match code {
        ErrorCode::EmailAlreadyExists => ("email", "Email already exists".to_owned()),
        _ if error.storage_kind().is_some() => ("row", "Database operation failed".to_owned()),
        _ => ("row", error.to_string()),
    };
    ImportError {
        row: candidate.row_number,
        field: field.to_owned(),
        message,
        code,
        value: Some(Value::String(candidate.data.email.clone())),
    }
}

#[derive(Default)]
struct WriteTally {
    created: usize,
    updated: usize,
    errors: Vec<ImportError>,
    aborted: Option<usize>,
}

async fn write_all(svc: &Service, candidates: &[ImportCandidate]) -> WriteTally {
    let mut tally = WriteTally::default();

    for (index, candidate) in candidates.iter().enumerate() {
        let error = match write_candidate(svc, candidate).await {
            Ok(true) => {
                tally.created += 1;
                continue;
            }
            Ok(false) => {
                tally.updated += 1;
                continue;
            }
            Err(error) => error,
        };

        tracing::warn!(row = candidate.row_number, code = %error.code(), error = %error, "import row failed");
        tally.errors.push(write_error(candidate, &error));

        if svc.is_fatal(&error) {
            let remaining = &candidates[index + 1..];
            tracing::error!(error = %error, remaining = remaining.len(), "storage unavailable, aborting import");
            tally
                .errors
                .extend(remaining.iter().map(|c| write_error(c, &error)));
            tally.aborted = Some(remaining.len());
            break;
        }
    }
    tally
}

pub(super) async fn import_users(
    svc: &Service,
    ctx: &SecurityContext,
    upload: ImportUpload,
    options: ImportOptions,
) -> Result<ImportReport, DomainError> {
    ctx.ensure(Action::Create, Resource::User)?;

    let sheet = read_upload(svc, upload).await?;
    let max = svc.config.import_max_records;
    if sheet.rows.len() > max {
        return Err(DomainError::import_data_invalid(format!(
            "The file contains {} rows (max: {max})",
            sheet.rows.len()
        )));
    }

    let roles = RoleDirectory::from_roles(&svc.roles.list().await?);
    let default_role = resolve_default_role(&options, &roles)?;
    let existing = svc.users.list_emails().await?;

    let password_len = svc.config.generated_password_length;
    let mut next_password = || generate_password(password_len);
    let ValidationOutcome {
        total_rows,
        valid_rows,
        invalid_rows,
        skipped,
        candidates,
        mut errors,
        mut warnings,
    } = ImportValidator::new(&options, default_role, &existing, &roles)
        .run(&sheet.rows, &mut next_password);

    let mut summary = ImportSummary {
        total_rows,
        valid_rows,
        invalid_rows,
        created: 0,
        updated: 0,
        skipped,
    };

    if options.validate_only {
        tracing::info!(total_rows, valid_rows, invalid_rows, "validate-only import finished");
        return Ok(ImportReport {
            summary,
            errors,
            warnings,
            preview: Some(preview_rows(
                &candidates,
                svc.config.validate_only_preview_rows,
            )),
            write_failures: 0,
        });
    }

    let tally = write_all(svc, &candidates).await;
    summary.created = tally.created;
    summary.updated = tally.updated;
    let write_failures = tally.errors.len();
    errors.extend(tally.errors);
    if let Some(remaining) = tally.aborted {
        warnings.push(ImportWarning {
            row: 0,
            field: None,
            message: format!(
                "Import aborted after a storage failure; {remaining} remaining rows were not written"
            ),
            value: None,
        });
    }

    tracing::info!(
        total_rows,
        valid_rows,
        invalid_rows,
        created = summary.created,
        updated = summary.updated,
        skipped = summary.skipped,
        write_failures,
        "import finished"
    );

    Ok(ImportReport {
        summary,
        errors,
        warnings,
        preview: None,
        write_failures,
    })
}

/// Schema check plus the format hints shown only in previews.
fn check_preview_row(row_no: usize, row: &RawRow, out: &mut ImportPreview) {
    if let Some(birthday) = cell_text(row, "birthday") {
        let shaped = birthday.len() == 10
            && birthday
                .char_indices()
                .all(|(i, c)| if i == 4 || i == 7 { c == '-' } else { c.is_ascii_digit() });
        if !shaped {
            out.warnings.push(ImportWarning {
                row: row_no,
                field: Some("birthday".to_owned()),
                message: "Birthday should be in YYYY-MM-DD format".to_owned(),
                value: Some(Value::String(birthday)),
            });
        }
    }
    if let Some(url) = cell_text(row, "slack_webhook_url")
        && !url.starts_with(SLACK_HOOK_PREFIX)
    {
        out.warnings.push(ImportWarning {
            row: row_no,
            field: Some("slack_webhook_url".to_owned()),
            message: "Invalid Slack webhook URL format".to_owned(),
            value: Some(Value::String(url)),
        });
    }

    match validate_row(row) {
        Ok(_) => out.valid_rows += 1,
        Err(violations) => {
            out.invalid_rows += 1;
            out.errors.extend(violations.into_iter().map(|v| ImportError {
                row: row_no,
                code: if v.field == "email"
                    && matches!(&v.value, Some(Value::String(s)) if !s.trim().is_empty())
                {
                    ErrorCode::InvalidEmailFormat
                } else {
                    ErrorCode::ValidationError
                },
                field: v.field.to_owned(),
                message: v.message,
                value: v.value,
            }));
        }
    }
}

pub(super) async fn preview_import(
    svc: &Service,
    ctx: &SecurityContext,
    upload: ImportUpload,
    field_mapping: HashMap<String, String>,
) -> Result<ImportPreview, DomainError> {
    ctx.ensure(Action::Create, Resource::User)?;

    let sheet = read_upload(svc, upload).await?;
    let limit = svc.config.import_preview_rows;

    let suggested_mapping = if field_mapping.is_empty() {
        suggest_field_mapping(&sheet.headers)
    } else {
        field_mapping.clone().into_iter().collect()
    };

    let mut preview = ImportPreview {
        headers: sheet.headers,
        rows: Vec::new(),
        total_rows: sheet.rows.len(),
        valid_rows: 0,
        invalid_rows: 0,
        errors: Vec::new(),
        warnings: Vec::new(),
        suggested_mapping,
    };

    for (index, raw) in sheet.rows.iter().take(limit).enumerate() {
        let row_no = crate::domain::import::row_number(index);
        let mut row = apply_field_mapping(raw, &field_mapping);
        check_preview_row(row_no, &row, &mut preview);
        row.insert("_rowNumber".to_owned(), Value::from(row_no));
        preview.rows.push(row);
    }
    // rows past the preview window are not inspected and count as valid
    preview.valid_rows += preview.total_rows.saturating_sub(limit);

    Ok(preview)
}
