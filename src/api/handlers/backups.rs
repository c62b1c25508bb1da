//! Backup endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::backup::{Backup, BackupStatus, BackupType};
use crate::services::backup_service::{BackupFilter, BackupStatistics, CreateBackupRequest};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListBackupsQuery {
    pub status: Option<BackupStatus>,
    #[serde(rename = "type")]
    pub backup_type: Option<BackupType>,
    pub repository_id: Option<i64>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CreateBackupQuery {
    /// Comma-separated repository ids to cover; omitted means all.
    pub repository_ids: Option<String>,
}

/// Backup with the ids of the repositories it covers
#[derive(Debug, Serialize, ToSchema)]
pub struct BackupResponse {
    #[serde(flatten)]
    pub backup: Backup,
    pub repository_ids: Vec<i64>,
}

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_backups).post(create_backup))
        .route("/statistics", get(backup_statistics))
        .route("/last-full", get(last_full_backup))
        .route("/{id}", get(get_backup).delete(delete_backup))
        .route("/{id}/retry", axum::routing::post(retry_backup))
}

/// Parse a comma-separated id list.
fn parse_id_list(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| AppError::Validation(format!("Invalid repository id: {s}")))
        })
        .collect()
}

/// List backups
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/v1/backups",
    params(ListBackupsQuery),
    responses((status = 200, description = "List of backups", body = [BackupResponse])),
    tag = "backups"
)]
pub async fn list_backups(
    State(state): State<SharedState>,
    Query(query): Query<ListBackupsQuery>,
) -> Result<Json<Vec<BackupResponse>>> {
    let service = state.backup_service();
    let backups = service
        .list(BackupFilter {
            status: query.status,
            backup_type: query.backup_type,
            repository_id: query.repository_id,
            from: query.from,
            to: query.to,
        })
        .await?;

    let mut response = Vec::with_capacity(backups.len());
    for backup in backups {
        let repository_ids = service.repository_ids(backup.id).await?;
        response.push(BackupResponse {
            backup,
            repository_ids,
        });
    }
    Ok(Json(response))
}

/// Get a backup by ID
#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/v1/backups",
    params(("id" = i64, Path, description = "Backup ID")),
    responses(
        (status = 200, description = "Backup found", body = BackupResponse),
        (status = 404, description = "Backup not found")
    ),
    tag = "backups"
)]
pub async fn get_backup(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<BackupResponse>> {
    let service = state.backup_service();
    let backup = service.get(id).await?;
    let repository_ids = service.repository_ids(id).await?;
    Ok(Json(BackupResponse {
        backup,
        repository_ids,
    }))
}

/// Start a backup. It is created "In Progress" and finished by the
/// background worker.
#[utoipa::path(
    post,
    path = "",
    context_path = "/api/v1/backups",
    params(CreateBackupQuery),
    request_body = CreateBackupRequest,
    responses(
        (status = 201, description = "Backup started", body = BackupResponse),
        (status = 404, description = "A covered repository does not exist")
    ),
    tag = "backups"
)]
pub async fn create_backup(
    State(state): State<SharedState>,
    Query(query): Query<CreateBackupQuery>,
    Json(mut req): Json<CreateBackupRequest>,
) -> Result<(StatusCode, Json<BackupResponse>)> {
    // The query form of repository_ids wins over the body field.
    if let Some(raw) = query.repository_ids.as_deref() {
        req.repository_ids = Some(parse_id_list(raw)?);
    }

    let service = state.backup_service();
    let backup = service.create(req).await?;
    let repository_ids = service.repository_ids(backup.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(BackupResponse {
            backup,
            repository_ids,
        }),
    ))
}

/// Retry a failed backup
#[utoipa::path(
    post,
    path = "/{id}/retry",
    context_path = "/api/v1/backups",
    params(("id" = i64, Path, description = "Backup ID")),
    responses(
        (status = 200, description = "Retry started", body = BackupResponse),
        (status = 404, description = "Backup not found"),
        (status = 409, description = "Backup is not in a failed state")
    ),
    tag = "backups"
)]
pub async fn retry_backup(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<BackupResponse>> {
    let service = state.backup_service();
    let backup = service.retry(id).await?;
    let repository_ids = service.repository_ids(id).await?;
    Ok(Json(BackupResponse {
        backup,
        repository_ids,
    }))
}

/// Aggregate backup statistics
#[utoipa::path(
    get,
    path = "/statistics",
    context_path = "/api/v1/backups",
    responses((status = 200, description = "Backup statistics", body = BackupStatistics)),
    tag = "backups"
)]
pub async fn backup_statistics(
    State(state): State<SharedState>,
) -> Result<Json<BackupStatistics>> {
    Ok(Json(state.backup_service().statistics().await?))
}

/// The most recent completed full backup
#[utoipa::path(
    get,
    path = "/last-full",
    context_path = "/api/v1/backups",
    responses(
        (status = 200, description = "Last full backup", body = BackupResponse),
        (status = 404, description = "No completed full backup exists")
    ),
    tag = "backups"
)]
pub async fn last_full_backup(
    State(state): State<SharedState>,
) -> Result<Json<BackupResponse>> {
    let service = state.backup_service();
    let backup = service
        .last_full()
        .await?
        .ok_or_else(|| AppError::NotFound("No completed full backup exists".to_string()))?;
    let repository_ids = service.repository_ids(backup.id).await?;
    Ok(Json(BackupResponse {
        backup,
        repository_ids,
    }))
}

/// Delete a backup
#[utoipa::path(
    delete,
    path = "/{id}",
    context_path = "/api/v1/backups",
    params(("id" = i64, Path, description = "Backup ID")),
    responses(
        (status = 204, description = "Backup deleted"),
        (status = 404, description = "Backup not found")
    ),
    tag = "backups"
)]
pub async fn delete_backup(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.backup_service().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_ids() {
        assert_eq!(parse_id_list("1,2, 3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_id_list("").unwrap(), Vec::<i64>::new());
    }

    #[test]
    fn rejects_non_numeric_ids() {
        assert!(parse_id_list("1,abc").is_err());
    }
}
