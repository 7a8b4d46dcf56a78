use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use time::macros::format_description;
use user_admin_sdk::{
    ActivityStatus, AuditInfo, BulkItemError, BulkItemWarning, BulkOperationKind,
    BulkOperationRequest, BulkOperationResult, ChangeNote, ExportFilters, ExportFormat,
    ExportRequest, ImportError, ImportOptions, ImportPreview, ImportPreviewRow, ImportReport,
    ImportWarning, NewUser, PasswordSource, RawRow, Role, StatusFilter, User, UserDetails,
    UserPatch, UserUpdate,
};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::export::age_on;
use crate::domain::service::EmailAvailability;

// ==================== Bulk operations ====================

/// REST DTO for a bulk operation request. `userIds` is accepted as an alias.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperationReq {
    #[serde(alias = "userIds", default)]
    pub selected_user_ids: Vec<String>,
    pub operation: String,
    #[serde(default)]
    pub role_id: Option<String>,
}

impl TryFrom<BulkOperationReq> for BulkOperationRequest {
    type Error = DomainError;

    fn try_from(req: BulkOperationReq) -> Result<Self, Self::Error> {
        let operation: BulkOperationKind = req
            .operation
            .parse()
            .map_err(|e| DomainError::validation("operation", format!("{e}")))?;

        let user_ids = req
            .selected_user_ids
            .iter()
            .map(|raw| {
                Uuid::parse_str(raw.trim()).map_err(|_| {
                    DomainError::validation("selectedUserIds", format!("Invalid user id '{raw}'"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let role_id = match req.role_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                Uuid::parse_str(raw).map_err(|_| DomainError::invalid_role(raw))?,
            ),
        };

        Ok(Self {
            user_ids,
            operation,
            role_id,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkItemErrorDto {
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl From<BulkItemError> for BulkItemErrorDto {
    fn from(e: BulkItemError) -> Self {
        Self {
            user_id: e.user_id,
            user_email: e.user_email,
            user_name: e.user_name,
            error: e.error,
            code: e.code.as_str().to_owned(),
            details: e.details,
            timestamp: e.timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkItemWarningDto {
    pub user_id: Uuid,
    pub warning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl From<BulkItemWarning> for BulkItemWarningDto {
    fn from(w: BulkItemWarning) -> Self {
        Self {
            user_id: w.user_id,
            warning: w.warning,
            code: w.code,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkIdsDto {
    pub successful_ids: Vec<Uuid>,
    pub failed_ids: Vec<Uuid>,
    pub skipped_ids: Vec<Uuid>,
}

/// REST DTO for the aggregated bulk result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperationResultDto {
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
    pub errors: Vec<BulkItemErrorDto>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<BulkItemWarningDto>,
    pub details: BulkIdsDto,
    pub operation: String,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub completed_at: OffsetDateTime,
    /// Milliseconds.
    pub duration: u64,
}

impl From<BulkOperationResult> for BulkOperationResultDto {
    fn from(r: BulkOperationResult) -> Self {
        let duration = u64::try_from(r.duration().as_millis()).unwrap_or(u64::MAX);
        Self {
            success: r.success,
            failed: r.failed,
            skipped: r.skipped,
            total: r.total,
            errors: r.errors.into_iter().map(Into::into).collect(),
            warnings: r.warnings.into_iter().map(Into::into).collect(),
            details: BulkIdsDto {
                successful_ids: r.successful_ids,
                failed_ids: r.failed_ids,
                skipped_ids: r.skipped_ids,
            },
            operation: r.operation.as_str().to_owned(),
            started_at: r.started_at,
            completed_at: r.completed_at,
            duration,
        }
    }
}

// ==================== Import ====================

fn default_true() -> bool {
    true
}

/// The `options` multipart field. Unknown keys are rejected.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[allow(clippy::struct_excessive_bools)]
pub struct ImportOptionsDto {
    #[serde(default)]
    pub skip_duplicates: bool,
    #[serde(default)]
    pub update_existing: bool,
    #[serde(default)]
    pub validate_only: bool,
    #[serde(default = "default_true")]
    pub skip_invalid_rows: bool,
    #[serde(default)]
    pub default_role: Option<String>,
    #[serde(default = "default_true")]
    pub default_status: bool,
    #[serde(default)]
    pub field_mapping: HashMap<String, String>,
}

impl Default for ImportOptionsDto {
    fn default() -> Self {
        Self {
            skip_duplicates: false,
            update_existing: false,
            validate_only: false,
            skip_invalid_rows: true,
            default_role: None,
            default_status: true,
            field_mapping: HashMap::new(),
        }
    }
}

impl From<ImportOptionsDto> for ImportOptions {
    fn from(o: ImportOptionsDto) -> Self {
        Self {
            skip_duplicates: o.skip_duplicates,
            update_existing: o.update_existing,
            validate_only: o.validate_only,
            skip_invalid_rows: o.skip_invalid_rows,
            default_role: o.default_role.filter(|r| !r.trim().is_empty()),
            default_status: o.default_status,
            field_mapping: o.field_mapping,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportErrorDto {
    pub row: usize,
    pub field: String,
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl From<ImportError> for ImportErrorDto {
    fn from(e: ImportError) -> Self {
        Self {
            row: e.row,
            field: e.field,
            message: e.message,
            code: e.code.as_str().to_owned(),
            value: e.value,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportWarningDto {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl From<ImportWarning> for ImportWarningDto {
    fn from(w: ImportWarning) -> Self {
        Self {
            row: w.row,
            field: w.field,
            message: w.message,
            value: w.value,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummaryDto {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreviewRowDto {
    pub row_number: usize,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role_id: Option<Uuid>,
    pub is_active: bool,
    pub is_update: bool,
    pub password: &'static str,
}

impl From<ImportPreviewRow> for ImportPreviewRowDto {
    fn from(r: ImportPreviewRow) -> Self {
        Self {
            row_number: r.row_number,
            email: r.email,
            first_name: r.first_name,
            last_name: r.last_name,
            role_id: r.role_id,
            is_active: r.is_active,
            is_update: r.is_update,
            password: match r.password {
                PasswordSource::Generated => "[GENERATED]",
                PasswordSource::Provided => "[PROVIDED]",
            },
        }
    }
}

/// REST DTO for an import run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReportDto {
    pub success: bool,
    pub summary: ImportSummaryDto,
    pub errors: Vec<ImportErrorDto>,
    pub warnings: Vec<ImportWarningDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_data: Option<Vec<ImportPreviewRowDto>>,
}

impl From<ImportReport> for ImportReportDto {
    fn from(r: ImportReport) -> Self {
        let success = r.success();
        let s = r.summary;
        Self {
            success,
            summary: ImportSummaryDto {
                total_rows: s.total_rows,
                valid_rows: s.valid_rows,
                invalid_rows: s.invalid_rows,
                created: s.created,
                updated: s.updated,
                skipped: s.skipped,
                errors: r.errors.len(),
            },
            errors: r.errors.into_iter().map(Into::into).collect(),
            warnings: r.warnings.into_iter().map(Into::into).collect(),
            preview_data: r
                .preview
                .map(|rows| rows.into_iter().map(Into::into).collect()),
        }
    }
}

/// REST DTO for the import preview.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreviewDto {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub errors: Vec<ImportErrorDto>,
    pub warnings: Vec<ImportWarningDto>,
    pub suggested_mapping: BTreeMap<String, String>,
}

impl From<ImportPreview> for ImportPreviewDto {
    fn from(p: ImportPreview) -> Self {
        Self {
            headers: p.headers,
            rows: p.rows,
            total_rows: p.total_rows,
            valid_rows: p.valid_rows,
            invalid_rows: p.invalid_rows,
            errors: p.errors.into_iter().map(Into::into).collect(),
            warnings: p.warnings.into_iter().map(Into::into).collect(),
            suggested_mapping: p.suggested_mapping,
        }
    }
}

// ==================== Export ====================

/// Export query string. Filter names follow the list endpoint; snake-case
/// spellings of `groupId` and `activityStatus` are accepted too.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    pub format: Option<String>,
    pub fields: Option<String>,
    pub search: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub has_avatar: Option<String>,
    pub locale: Option<String>,
    #[serde(alias = "group_id")]
    pub group_id: Option<String>,
    #[serde(alias = "activity_status")]
    pub activity_status: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

fn parse_date(field: &str, value: Option<String>) -> Result<Option<time::Date>, DomainError> {
    non_empty(value)
        .map(|raw| {
            // Full timestamps are accepted; only the calendar date is used.
            let day = raw.get(..10).unwrap_or(&raw);
            time::Date::parse(day, format_description!("[year]-[month]-[day]")).map_err(|_| {
                DomainError::validation(field, format!("Invalid date '{raw}', expected YYYY-MM-DD"))
            })
        })
        .transpose()
}

impl TryFrom<ExportQuery> for ExportRequest {
    type Error = DomainError;

    fn try_from(q: ExportQuery) -> Result<Self, Self::Error> {
        let format = match non_empty(q.format) {
            None => ExportFormat::Csv,
            Some(raw) => raw.parse().map_err(|_| DomainError::InvalidExportFormat {
                format: raw.clone(),
            })?,
        };

        let fields = non_empty(q.fields).map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_owned)
                .collect::<Vec<_>>()
        });

        let status = match non_empty(q.status) {
            None => StatusFilter::All,
            Some(raw) => raw
                .parse()
                .map_err(|e| DomainError::validation("status", format!("{e}")))?,
        };

        let has_avatar = match non_empty(q.has_avatar).as_deref() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        };

        let group_id = non_empty(q.group_id)
            .map(|raw| {
                raw.parse::<i32>()
                    .map_err(|_| DomainError::validation("groupId", format!("Invalid group id '{raw}'")))
            })
            .transpose()?;

        let activity_status = non_empty(q.activity_status)
            .map(|raw| {
                raw.parse::<ActivityStatus>()
                    .map_err(|e| DomainError::validation("activityStatus", format!("{e}")))
            })
            .transpose()?;

        Ok(Self {
            format,
            fields,
            filters: ExportFilters {
                search: non_empty(q.search),
                role: non_empty(q.role),
                status,
                date_from: parse_date("dateFrom", q.date_from)?,
                date_to: parse_date("dateTo", q.date_to)?,
                has_avatar,
                locale: non_empty(q.locale),
                group_id,
                activity_status,
            },
        })
    }
}

// ==================== Single-user administration ====================

/// Missing key is `None`, explicit `null` is `Some(None)`.
#[allow(clippy::option_option)]
fn nullable<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Blank role ids mean "no role".
fn parse_role_id(raw: Option<&str>) -> Result<Option<Uuid>, DomainError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(id) => Uuid::parse_str(id)
            .map(Some)
            .map_err(|_| DomainError::invalid_role(id)),
    }
}

/// Body of `POST /api/admin/users`. Missing required fields surface as field errors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateUserReq {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role_id: Option<String>,
    pub is_active: Option<bool>,
    pub locale: Option<String>,
    pub sex: Option<bool>,
    pub birthday: Option<String>,
    pub address: Option<String>,
    pub group_id: Option<i32>,
    pub slack_webhook_url: Option<String>,
}

impl TryFrom<CreateUserReq> for NewUser {
    type Error = DomainError;

    fn try_from(req: CreateUserReq) -> Result<Self, Self::Error> {
        Ok(Self {
            role_id: parse_role_id(req.role_id.as_deref())?,
            email: req.email,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            is_active: req.is_active,
            locale: non_empty(req.locale),
            sex: req.sex,
            birthday: non_empty(req.birthday),
            address: non_empty(req.address),
            group_id: req.group_id,
            slack_webhook_url: non_empty(req.slack_webhook_url),
        })
    }
}

/// Body of `PUT` and `PATCH /api/admin/users/{id}`.
///
/// Absent keys are left unchanged; `null` clears a nullable column. `action` and
/// `reason` label a `PATCH` in the audit trail.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
#[allow(clippy::option_option)] // set-to-null and not-set are distinct
pub struct UpdateUserReq {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub role_id: Option<Option<String>>,
    pub is_active: Option<bool>,
    #[serde(deserialize_with = "nullable")]
    pub locale: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub sex: Option<Option<bool>>,
    #[serde(deserialize_with = "nullable")]
    pub birthday: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub address: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub avatar: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub group_id: Option<Option<i32>>,
    #[serde(deserialize_with = "nullable")]
    pub slack_webhook_url: Option<Option<String>>,
    pub coin: Option<i64>,
    pub action: Option<String>,
    pub reason: Option<String>,
}

impl UpdateUserReq {
    /// Split into the field changes and the audit label.
    ///
    /// # Errors
    /// [`DomainError::InvalidRole`] when `role_id` is not a UUID.
    pub fn into_parts(self) -> Result<(UserPatch, ChangeNote), DomainError> {
        let role_id = match self.role_id {
            None => None,
            Some(raw) => Some(parse_role_id(raw.as_deref())?),
        };
        let patch = UserPatch {
            email: self.email,
            password: self.password.filter(|p| !p.is_empty()),
            first_name: self.first_name,
            last_name: self.last_name,
            role_id,
            is_active: self.is_active,
            locale: self.locale.map(non_empty),
            sex: self.sex,
            birthday: self.birthday.map(non_empty),
            address: self.address.map(non_empty),
            avatar: self.avatar.map(non_empty),
            group_id: self.group_id,
            slack_webhook_url: self.slack_webhook_url.map(non_empty),
            coin: self.coin,
        };
        let note = ChangeNote {
            action: non_empty(self.action),
            reason: non_empty(self.reason),
        };
        Ok((patch, note))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl From<Role> for RoleDto {
    fn from(r: Role) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
        }
    }
}

/// An account as shown by the admin API, with derived display fields.
#[derive(Debug, Clone, Serialize)]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub display_name: String,
    pub is_active: bool,
    pub status: &'static str,
    pub activity_status: &'static str,
    pub role_id: Option<Uuid>,
    pub role: Option<RoleDto>,
    pub avatar: Option<String>,
    pub locale: Option<String>,
    pub birthday: Option<String>,
    pub age: Option<i32>,
    pub sex: Option<bool>,
    pub address: Option<String>,
    pub group_id: Option<i32>,
    pub slack_webhook_url: Option<String>,
    pub coin: i64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_logout: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl UserDto {
    /// Derived fields (age, activity) are computed against `now`.
    #[must_use]
    pub fn at(details: UserDetails, now: OffsetDateTime) -> Self {
        let UserDetails { user, role } = details;
        let full_name = user.full_name();
        let display_name = if full_name.is_empty() {
            user.email.clone()
        } else {
            full_name.clone()
        };
        Self {
            status: if user.is_active { "active" } else { "inactive" },
            activity_status: ActivityStatus::of(&user, now).as_str(),
            age: user.birthday.as_deref().and_then(|b| age_on(b, now.date())),
            role: role.map(RoleDto::from),
            full_name,
            display_name,
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_active: user.is_active,
            role_id: user.role_id,
            avatar: user.avatar,
            locale: user.locale,
            birthday: user.birthday,
            sex: user.sex,
            address: user.address,
            group_id: user.group_id,
            slack_webhook_url: user.slack_webhook_url,
            coin: user.coin,
            last_login: user.last_login,
            last_logout: user.last_logout,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<UserDetails> for UserDto {
    fn from(details: UserDetails) -> Self {
        Self::at(details, OffsetDateTime::now_utc())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserListDto {
    pub users: Vec<UserDto>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserBodyDto {
    pub user: UserDto,
}

/// What the caller may do with the account on screen.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct UserAbilitiesDto {
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_toggle_status: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserDetailDto {
    pub user: UserDto,
    pub metadata: UserAbilitiesDto,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValidationDto {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousValuesDto {
    pub email: String,
    pub role_id: Option<Uuid>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct UpdateMetadataDto {
    pub was_email_changed: bool,
    pub was_role_changed: bool,
    pub was_status_changed: bool,
    pub previous_values: PreviousValuesDto,
}

/// Response of `PUT /api/admin/users/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateUserDto {
    pub user: UserDto,
    pub validation: UpdateValidationDto,
    pub metadata: UpdateMetadataDto,
}

impl From<UserUpdate> for UpdateUserDto {
    fn from(u: UserUpdate) -> Self {
        let metadata = UpdateMetadataDto {
            was_email_changed: u.email_changed(),
            was_role_changed: u.role_changed(),
            was_status_changed: u.status_changed(),
            previous_values: PreviousValuesDto {
                email: u.previous.email,
                role_id: u.previous.role_id,
                is_active: u.previous.is_active,
            },
        };
        Self {
            user: UserDto::from(u.details),
            validation: UpdateValidationDto {
                is_valid: true,
                errors: Vec::new(),
                warnings: u.warnings,
            },
            metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditInfoDto {
    pub action: String,
    pub reason: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub performed_by: Uuid,
}

impl From<AuditInfo> for AuditInfoDto {
    fn from(a: AuditInfo) -> Self {
        Self {
            action: a.action,
            reason: a.reason,
            timestamp: a.timestamp,
            performed_by: a.performed_by,
        }
    }
}

/// Response of `PATCH /api/admin/users/{id}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchUserDto {
    pub user: UserDto,
    pub audit_info: AuditInfoDto,
}

impl From<UserUpdate> for PatchUserDto {
    fn from(u: UserUpdate) -> Self {
        Self {
            user: UserDto::from(u.details),
            audit_info: AuditInfoDto::from(u.audit),
        }
    }
}

/// Response of `DELETE /api/admin/users/{id}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserDto {
    pub success: bool,
    pub message: String,
    pub deleted_user_id: Uuid,
}

impl From<User> for DeleteUserDto {
    fn from(user: User) -> Self {
        Self {
            success: true,
            message: format!("User \"{}\" deleted successfully", user.full_name()),
            deleted_user_id: user.id,
        }
    }
}

// ==================== Email availability ====================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckEmailQuery {
    pub email: Option<String>,
    pub exclude_user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckEmailDto {
    pub available: bool,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl From<EmailAvailability> for CheckEmailDto {
    fn from(a: EmailAvailability) -> Self {
        match a {
            EmailAvailability::Available { email } => Self {
                available: true,
                email,
                message: Some("Email is available"),
                code: None,
                error: None,
            },
            EmailAvailability::Taken { email } => Self {
                available: false,
                email,
                message: Some("Email is already in use"),
                code: None,
                error: None,
            },
            EmailAvailability::InvalidFormat { email } => Self {
                available: false,
                email,
                message: None,
                code: Some(user_admin_sdk::ErrorCode::InvalidEmailFormat.as_str()),
                error: Some("Invalid email format"),
            },
        }
    }
}
