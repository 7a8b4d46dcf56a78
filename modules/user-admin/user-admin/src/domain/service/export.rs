use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use time::{Duration, OffsetDateTime, Time};
use user_admin_sdk::{ExportFile, ExportFilters, ExportRequest, Role};
use uuid::Uuid;

use super::Service;
use crate::domain::error::DomainError;
use crate::domain::export::{ExportMetadata, ExportTable, filters_json, resolve_fields, transform};
use crate::domain::repos::UserQuery;
use crate::domain::security::{Action, Resource, SecurityContext};

/// Resolve role names and calendar dates into a storage query.
fn build_query(
    filters: &ExportFilters,
    roles: &[Role],
    now: OffsetDateTime,
) -> Result<UserQuery, DomainError> {
    let role_id = match filters.role.as_deref().map(str::trim) {
        None | Some("" | "all") => None,
        Some(role) => {
            let by_id = Uuid::parse_str(role).ok();
            let found = roles
                .iter()
                .find(|r| Some(r.id) == by_id || r.name.eq_ignore_ascii_case(role));
            match (found, by_id) {
                (Some(r), _) => Some(r.id),
                // an id that matches nothing filters to nothing
                (None, Some(id)) => Some(id),
                (None, None) => {
                    return Err(DomainError::validation(
                        "role",
                        format!("Unknown role '{role}'"),
                    ));
                }
            }
        }
    };

    if let (Some(from), Some(to)) = (filters.date_from, filters.date_to)
        && from > to
    {
        return Err(DomainError::validation(
            "dateFrom",
            "dateFrom must not be after dateTo",
        ));
    }

    tracing::debug!(?role_id, "export filters resolved");
    Ok(UserQuery {
        search: filters
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned),
        role_id,
        status: filters.status,
        created_from: filters.date_from.map(|d| d.with_time(Time::MIDNIGHT).assume_utc()),
        created_before: filters
            .date_to
            .map(|d| d.with_time(Time::MIDNIGHT).assume_utc() + Duration::DAY),
        has_avatar: filters.has_avatar,
        locale: filters
            .locale
            .as_deref()
            .filter(|l| !l.is_empty() && *l != "all")
            .map(str::to_owned),
        group_id: filters.group_id,
        activity: filters.activity_status.map(|a| (a, now)),
    })
}

pub(super) async fn export_users(
    svc: &Service,
    ctx: &SecurityContext,
    request: ExportRequest,
) -> Result<ExportFile, DomainError> {
    let started = Instant::now();
    ctx.ensure(Action::Read, Resource::User)?;

    let fields = resolve_fields(request.fields.as_deref())?;
    let now = OffsetDateTime::now_utc();
    let roles = svc.roles.list().await?;
    let query = build_query(&request.filters, &roles, now)?;

    let total = svc.users.count(&query).await?;
    let max = svc.config.export_max_records;
    if total > max {
        tracing::warn!(total, max, "export limit exceeded");
        return Err(DomainError::ExportLimitExceeded { total, max });
    }

    let users = svc.users.list(&query).await?;
    let roles_by_id: HashMap<Uuid, &Role> = roles.iter().map(|r| (r.id, r)).collect();
    let records = users
        .iter()
        .map(|u| {
            let role = u.role_id.and_then(|id| roles_by_id.get(&id).copied());
            transform(u, role, now)
        })
        .collect();

    let table = ExportTable::new(fields.clone(), records);
    let metadata = ExportMetadata {
        total_records: total,
        exported_records: table.records.len(),
        export_date: now,
        filters: filters_json(&request.filters),
        fields,
    };
    let records_count = table.records.len();

    let format = request.format;
    let renderer = Arc::clone(&svc.renderer);
    let bytes = tokio::task::spawn_blocking(move || renderer.render(format, &table, &metadata))
        .await
        .map_err(|e| DomainError::export_failed(format!("renderer task failed: {e}")))??;

    let elapsed = started.elapsed();
    tracing::info!(
        records = records_count,
        bytes = bytes.len(),
        elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        "export finished"
    );

    Ok(ExportFile {
        bytes,
        content_type: format.mime_type(),
        filename: format!("users-export-{}.{}", now.date(), format.extension()),
        records: records_count,
        elapsed,
    })
}
