//! Public models for the `user-admin` module.
//!
//! These are transport-agnostic data structures that define the contract
//! between the `user-admin` module and its consumers. Wire shapes live in the
//! module's REST DTOs.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::errors::{ErrorCode, ParseEnumError};

/// One parsed spreadsheet or CSV row, keyed by column header.
pub type RawRow = serde_json::Map<String, serde_json::Value>;

// ==================== Users & roles ====================

/// A persisted account. Password hashes never leave the storage layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub role_id: Option<Uuid>,
    pub avatar: Option<String>,
    pub locale: Option<String>,
    pub birthday: Option<String>,
    /// `true` is male, `false` is female.
    pub sex: Option<bool>,
    pub address: Option<String>,
    pub group_id: Option<i32>,
    pub slack_webhook_url: Option<String>,
    pub coin: i64,
    pub last_login: Option<OffsetDateTime>,
    pub last_logout: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl User {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

/// A role users can be assigned to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// An account together with its resolved role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDetails {
    pub user: User,
    pub role: Option<Role>,
}

/// Fields for an account created by an administrator. `password` is plain text;
/// the service hashes it before storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub locale: Option<String>,
    pub sex: Option<bool>,
    pub birthday: Option<String>,
    pub address: Option<String>,
    pub group_id: Option<i32>,
    pub slack_webhook_url: Option<String>,
}

/// Partial update of one account.
///
/// `None` leaves a field unchanged. For nullable fields `Some(None)` clears the
/// stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(clippy::option_option)] // set-to-null and not-set are distinct
pub struct UserPatch {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
    pub locale: Option<Option<String>>,
    pub sex: Option<Option<bool>>,
    pub birthday: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub avatar: Option<Option<String>>,
    pub group_id: Option<Option<i32>>,
    pub slack_webhook_url: Option<Option<String>>,
    pub coin: Option<i64>,
}

/// Caller-supplied label for an update, recorded in the audit trail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeNote {
    /// `"ban"` marks the update as a ban, which is refused on the caller's own account.
    pub action: Option<String>,
    pub reason: Option<String>,
}

/// Who changed an account, when, and with what label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditInfo {
    pub action: String,
    pub reason: String,
    pub performed_by: Uuid,
    pub timestamp: OffsetDateTime,
}

/// Result of a single-account update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUpdate {
    pub details: UserDetails,
    /// The account as it was before the update.
    pub previous: User,
    /// Accepted but discouraged values, e.g. a password without mixed character classes.
    pub warnings: Vec<String>,
    pub audit: AuditInfo,
}

impl UserUpdate {
    #[must_use]
    pub fn email_changed(&self) -> bool {
        self.details.user.email != self.previous.email
    }

    #[must_use]
    pub fn role_changed(&self) -> bool {
        self.details.user.role_id != self.previous.role_id
    }

    #[must_use]
    pub fn status_changed(&self) -> bool {
        self.details.user.is_active != self.previous.is_active
    }
}

// ==================== Bulk operations ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkOperationKind {
    Ban,
    Unban,
    Delete,
    AssignRole,
}

impl BulkOperationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ban => "ban",
            Self::Unban => "unban",
            Self::Delete => "delete",
            Self::AssignRole => "assign_role",
        }
    }
}

impl fmt::Display for BulkOperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BulkOperationKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ban" => Ok(Self::Ban),
            "unban" => Ok(Self::Unban),
            "delete" => Ok(Self::Delete),
            "assign_role" => Ok(Self::AssignRole),
            other => Err(ParseEnumError::new("bulk operation", other)),
        }
    }
}

/// Targets and kind of a bulk operation. Identifiers are kept as received;
/// deduplication happens inside the processor so duplicates can be reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOperationRequest {
    pub user_ids: Vec<Uuid>,
    pub operation: BulkOperationKind,
    pub role_id: Option<Uuid>,
}

/// A failed item of a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemError {
    pub user_id: Uuid,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub error: String,
    pub code: ErrorCode,
    pub details: Option<String>,
    pub timestamp: OffsetDateTime,
}

/// A non-fatal note about an item (or the batch as a whole when `user_id` is nil).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemWarning {
    pub user_id: Uuid,
    pub warning: String,
    pub code: Option<String>,
}

/// Aggregated outcome of a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOperationResult {
    pub operation: BulkOperationKind,
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: Vec<BulkItemError>,
    pub warnings: Vec<BulkItemWarning>,
    pub successful_ids: Vec<Uuid>,
    pub failed_ids: Vec<Uuid>,
    pub skipped_ids: Vec<Uuid>,
    pub started_at: OffsetDateTime,
    pub completed_at: OffsetDateTime,
}

impl BulkOperationResult {
    /// Wall-clock time between start and completion, zero if the clock went backwards.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::try_from(self.completed_at - self.started_at).unwrap_or_default()
    }

    /// Every received identifier is accounted for exactly once.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.success + self.failed + self.skipped == self.total
    }
}

// ==================== Import ====================

/// Recognized import options. Anything else in the options payload is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ImportOptions {
    /// Rows whose email already exists are skipped with a warning.
    pub skip_duplicates: bool,
    /// Rows whose email already exists update that account.
    pub update_existing: bool,
    /// Validate and report without writing.
    pub validate_only: bool,
    /// Keep validating after an invalid row; when `false` validation stops there.
    pub skip_invalid_rows: bool,
    /// Role id or role name injected into rows without a role.
    pub default_role: Option<String>,
    /// Active flag injected into rows without `is_active`.
    pub default_status: bool,
    /// Source column name to target field name.
    pub field_mapping: HashMap<String, String>,
}

impl Default for ImportOptions {
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

/// A row-level import error. `row` is the 1-based spreadsheet row (header is row 1).
#[derive(Debug, Clone, PartialEq)]
pub struct ImportError {
    pub row: usize,
    pub field: String,
    pub message: String,
    pub code: ErrorCode,
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportWarning {
    pub row: usize,
    pub field: Option<String>,
    pub message: String,
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl ImportSummary {
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.valid_rows + self.invalid_rows == self.total_rows
            && self.created + self.updated + self.skipped <= self.valid_rows
    }
}

/// Where a previewed row's password comes from; the value itself is never shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordSource {
    Generated,
    Provided,
}

/// A processed row as shown in a validate-only run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportPreviewRow {
    pub row_number: usize,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role_id: Option<Uuid>,
    pub is_active: bool,
    pub is_update: bool,
    pub password: PasswordSource,
}

/// Outcome of an import run.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub summary: ImportSummary,
    pub errors: Vec<ImportError>,
    pub warnings: Vec<ImportWarning>,
    pub preview: Option<Vec<ImportPreviewRow>>,
    /// Number of errors raised while writing (a subset of `errors`).
    pub write_failures: usize,
}

impl ImportReport {
    #[must_use]
    pub fn success(&self) -> bool {
        self.summary.valid_rows > 0 && self.write_failures == 0
    }
}

/// Result of inspecting an upload before importing it.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportPreview {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub errors: Vec<ImportError>,
    pub warnings: Vec<ImportWarning>,
    pub suggested_mapping: BTreeMap<String, String>,
}

// ==================== Export ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Csv,
    Excel,
    Pdf,
    Json,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Excel => "xlsx",
            Self::Pdf => "pdf",
            Self::Json => "json",
        }
    }

    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Pdf => "application/pdf",
            Self::Json => "application/json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "excel" | "xlsx" => Ok(Self::Excel),
            "pdf" => Ok(Self::Pdf),
            "json" => Ok(Self::Json),
            _ => Err(ParseEnumError::new("export format", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl FromStr for StatusFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(ParseEnumError::new("status filter", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityStatus {
    Online,
    Offline,
    Never,
}

impl ActivityStatus {
    /// A user is online when they logged in within this window and have not logged out since.
    pub const ONLINE_WINDOW: time::Duration = time::Duration::minutes(5);

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Never => "never",
        }
    }

    #[must_use]
    pub fn of(user: &User, now: OffsetDateTime) -> Self {
        let Some(login) = user.last_login else {
            return Self::Never;
        };
        let logged_out_after = user.last_logout.is_some_and(|out| out >= login);
        if !logged_out_after && now - login <= Self::ONLINE_WINDOW {
            Self::Online
        } else {
            Self::Offline
        }
    }
}

impl FromStr for ActivityStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            "never" => Ok(Self::Never),
            other => Err(ParseEnumError::new("activity status", other)),
        }
    }
}

/// Filters applied to the user list before export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportFilters {
    /// Case-insensitive substring of first name, last name or email.
    pub search: Option<String>,
    /// Role id or role name.
    pub role: Option<String>,
    pub status: StatusFilter,
    /// Inclusive lower bound on `created_at` (start of day, UTC).
    pub date_from: Option<Date>,
    /// Inclusive upper bound on `created_at` (end of day, UTC).
    pub date_to: Option<Date>,
    pub has_avatar: Option<bool>,
    pub locale: Option<String>,
    pub group_id: Option<i32>,
    pub activity_status: Option<ActivityStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub format: ExportFormat,
    /// Selected fields in output order; `None` exports every field.
    pub fields: Option<Vec<String>>,
    pub filters: ExportFilters,
}

/// A rendered export ready to be sent as an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub filename: String,
    pub records: usize,
    pub elapsed: Duration,
}
