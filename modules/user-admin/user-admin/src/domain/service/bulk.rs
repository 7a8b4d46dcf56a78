use std::collections::HashSet;

use time::OffsetDateTime;
use user_admin_sdk::{
    BulkItemError, BulkItemWarning, BulkOperationKind, BulkOperationRequest, BulkOperationResult,
};
use uuid::Uuid;

use super::Service;
use crate::domain::error::DomainError;
use crate::domain::security::{Action, Resource, SecurityContext};

const DUPLICATE_WARNING: &str = "Duplicate user id, skipped";

/// Storage mutation applied to each target, resolved once per request.
#[derive(Debug, Clone, Copy)]
enum Mutation {
    SetActive(bool),
    Delete,
    SetRole(Uuid),
}

const fn required_action(op: BulkOperationKind) -> Action {
    match op {
        BulkOperationKind::Delete => Action::Delete,
        BulkOperationKind::Ban | BulkOperationKind::Unban | BulkOperationKind::AssignRole => {
            Action::Update
        }
    }
}

/// A per-item failure with whatever is known about the target.
struct ItemFailure {
    error: DomainError,
    email: Option<String>,
    name: Option<String>,
}

impl From<DomainError> for ItemFailure {
    fn from(error: DomainError) -> Self {
        Self {
            error,
            email: None,
            name: None,
        }
    }
}

/// Client-facing text for a failed item; storage internals stay in the logs.
fn describe(error: &DomainError) -> (String, Option<String>) {
    match error.storage_kind() {
        Some(kind) => (
            "Database operation failed".to_owned(),
            Some(kind.to_string()),
        ),
        None => (error.to_string(), None),
    }
}

/// Running totals for one bulk request.
struct Tally {
    result: BulkOperationResult,
}

impl Tally {
    fn new(operation: BulkOperationKind, total: usize, started_at: OffsetDateTime) -> Self {
        Self {
            result: BulkOperationResult {
                operation,
                total,
                success: 0,
                failed: 0,
                skipped: 0,
                errors: Vec::new(),
                warnings: Vec::new(),
                successful_ids: Vec::new(),
                failed_ids: Vec::new(),
                skipped_ids: Vec::new(),
                started_at,
                completed_at: started_at,
            },
        }
    }

    fn succeed(&mut self, user_id: Uuid) {
        self.result.success += 1;
        self.result.successful_ids.push(user_id);
    }

    fn skip_duplicate(&mut self, user_id: Uuid) {
        self.result.skipped += 1;
        self.result.skipped_ids.push(user_id);
        self.result.warnings.push(BulkItemWarning {
            user_id,
            warning: DUPLICATE_WARNING.to_owned(),
            code: Some("DUPLICATE".to_owned()),
        });
    }

    fn fail(&mut self, user_id: Uuid, failure: &ItemFailure) {
        let (error, details) = describe(&failure.error);
        self.result.failed += 1;
        self.result.failed_ids.push(user_id);
        self.result.errors.push(BulkItemError {
            user_id,
            user_email: failure.email.clone(),
            user_name: failure.name.clone(),
            error,
            code: failure.error.code(),
            details,
            timestamp: OffsetDateTime::now_utc(),
        });
    }

    fn finish(mut self) -> BulkOperationResult {
        self.result.completed_at = OffsetDateTime::now_utc();
        self.result
    }
}

async fn apply(
    svc: &Service,
    ctx: &SecurityContext,
    op: BulkOperationKind,
    mutation: Mutation,
    user_id: Uuid,
) -> Result<(), ItemFailure> {
    if user_id == ctx.subject_id() {
        let guard = match op {
            BulkOperationKind::Ban => Some(DomainError::CannotBanSelf),
            BulkOperationKind::Delete => Some(DomainError::CannotDeleteSelf),
            BulkOperationKind::Unban | BulkOperationKind::AssignRole => None,
        };
        if let Some(error) = guard {
            return Err(ItemFailure {
                error,
                email: ctx.email().map(str::to_owned),
                name: None,
            });
        }
    }

    let user = svc
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| DomainError::user_not_found(user_id))?;

    let outcome = match mutation {
        Mutation::SetActive(active) => svc.users.set_active(user_id, active).await,
        Mutation::Delete => svc.users.delete(user_id).await,
        Mutation::SetRole(role_id) => svc.users.set_role(user_id, role_id).await,
    };

    outcome.map_err(|error| ItemFailure {
        error,
        name: Some(user.full_name()),
        email: Some(user.email),
    })
}

async fn resolve_mutation(
    svc: &Service,
    request: &BulkOperationRequest,
) -> Result<Mutation, DomainError> {
    Ok(match request.operation {
        BulkOperationKind::Ban => Mutation::SetActive(false),
        BulkOperationKind::Unban => Mutation::SetActive(true),
        BulkOperationKind::Delete => Mutation::Delete,
        BulkOperationKind::AssignRole => {
            let role_id = request.role_id.ok_or_else(|| {
                DomainError::validation("roleId", "Role ID is required for assign_role")
            })?;
            if svc.roles.find_by_id(role_id).await?.is_none() {
                return Err(DomainError::invalid_role(role_id.to_string()));
            }
            Mutation::SetRole(role_id)
        }
    })
}

pub(super) async fn run(
    svc: &Service,
    ctx: &SecurityContext,
    request: BulkOperationRequest,
) -> Result<BulkOperationResult, DomainError> {
    let started_at = OffsetDateTime::now_utc();
    let op = request.operation;

    ctx.ensure(required_action(op), Resource::User)?;

    if request.user_ids.is_empty() {
        return Err(DomainError::validation(
            "userIds",
            "At least one user must be selected",
        ));
    }
    let max = svc.config.max_bulk_selection;
    if request.user_ids.len() > max {
        return Err(DomainError::TooManyUsersSelected {
            count: request.user_ids.len(),
            max,
        });
    }

    let mutation = resolve_mutation(svc, &request).await?;
    let ids = request.user_ids;

    tracing::info!(total = ids.len(), "starting bulk operation");

    let mut tally = Tally::new(op, ids.len(), started_at);
    let mut seen = HashSet::with_capacity(ids.len());

    for (index, &user_id) in ids.iter().enumerate() {
        if !seen.insert(user_id) {
            tally.skip_duplicate(user_id);
            continue;
        }

        let failure = match apply(svc, ctx, op, mutation, user_id).await {
            Ok(()) => {
                tally.succeed(user_id);
                continue;
            }
            Err(failure) => failure,
        };

        tracing::warn!(%user_id, code = %failure.error.code(), error = %failure.error, "bulk item failed");
        tally.fail(user_id, &failure);

        if svc.is_fatal(&failure.error) {
            let remaining = &ids[index + 1..];
            tracing::error!(
                error = %failure.error,
                remaining = remaining.len(),
                "storage unavailable, aborting bulk operation"
            );
            let mut aborted = 0usize;
            for &rest in remaining {
                if seen.insert(rest) {
                    tally.fail(rest, &ItemFailure::from(failure.error.clone()));
                    aborted += 1;
                } else {
                    tally.skip_duplicate(rest);
                }
            }
            tally.result.warnings.push(BulkItemWarning {
                user_id: Uuid::nil(),
                warning: format!(
                    "Operation aborted after a storage failure; {aborted} remaining users were not processed"
                ),
                code: Some("ABORTED".to_owned()),
            });
            break;
        }
    }

    let result = tally.finish();
    tracing::info!(
        success = result.success,
        failed = result.failed,
        skipped = result.skipped,
        duration_ms = u64::try_from(result.duration().as_millis()).unwrap_or(u64::MAX),
        "bulk operation finished"
    );
    Ok(result)
}
