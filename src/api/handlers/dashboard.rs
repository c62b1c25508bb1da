//! Dashboard aggregation endpoints.

use axum::{extract::State, routing::get, Json, Router};

use crate::api::SharedState;
use crate::error::Result;
use crate::services::dashboard_service::{
    ActivityEntry, BackupSummary, DashboardMetrics, MigrationProgress,
};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/metrics", get(dashboard_metrics))
        .route("/recent-activity", get(recent_activity))
        .route("/migration-progress", get(migration_progress))
        .route("/backup-summary", get(backup_summary))
}

/// Aggregate dashboard metrics
#[utoipa::path(
    get,
    path = "/metrics",
    context_path = "/api/v1/dashboard",
    responses((status = 200, description = "Dashboard metrics", body = DashboardMetrics)),
    tag = "dashboard"
)]
pub async fn dashboard_metrics(
    State(state): State<SharedState>,
) -> Result<Json<DashboardMetrics>> {
    Ok(Json(state.dashboard_service().metrics().await?))
}

/// Latest migration and backup changes
#[utoipa::path(
    get,
    path = "/recent-activity",
    context_path = "/api/v1/dashboard",
    responses((status = 200, description = "Recent activity feed", body = [ActivityEntry])),
    tag = "dashboard"
)]
pub async fn recent_activity(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ActivityEntry>>> {
    Ok(Json(state.dashboard_service().recent_activity().await?))
}

/// Repository migration progress rollup
#[utoipa::path(
    get,
    path = "/migration-progress",
    context_path = "/api/v1/dashboard",
    responses((status = 200, description = "Migration progress", body = MigrationProgress)),
    tag = "dashboard"
)]
pub async fn migration_progress(
    State(state): State<SharedState>,
) -> Result<Json<MigrationProgress>> {
    Ok(Json(state.dashboard_service().migration_progress().await?))
}

/// Backup counts and storage rollup
#[utoipa::path(
    get,
    path = "/backup-summary",
    context_path = "/api/v1/dashboard",
    responses((status = 200, description = "Backup summary", body = BackupSummary)),
    tag = "dashboard"
)]
pub async fn backup_summary(State(state): State<SharedState>) -> Result<Json<BackupSummary>> {
    Ok(Json(state.dashboard_service().backup_summary().await?))
}
