//! Backup schedule endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::backup::BackupType;
use crate::models::schedule::{BackupSchedule, ScheduleStatus};
use crate::services::schedule_service::{
    CreateScheduleRequest, ScheduleFilter, UpdateScheduleRequest,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListSchedulesQuery {
    #[serde(rename = "type")]
    pub schedule_type: Option<BackupType>,
    pub frequency: Option<String>,
    pub status: Option<ScheduleStatus>,
    pub repository_id: Option<i64>,
}

/// Schedule with the ids of the repositories it covers
#[derive(Debug, Serialize, ToSchema)]
pub struct ScheduleResponse {
    #[serde(flatten)]
    pub schedule: BackupSchedule,
    pub repository_ids: Vec<i64>,
}

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_schedules).post(create_schedule))
        .route("/next", get(next_schedule))
        .route(
            "/{id}",
            get(get_schedule).put(update_schedule).delete(delete_schedule),
        )
        .route("/{id}/toggle-status", axum::routing::patch(toggle_schedule))
}

async fn to_response(
    state: &SharedState,
    schedule: BackupSchedule,
) -> Result<ScheduleResponse> {
    let repository_ids = state.schedule_service().repository_ids(schedule.id).await?;
    Ok(ScheduleResponse {
        schedule,
        repository_ids,
    })
}

/// List backup schedules
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/v1/backup-schedules",
    params(ListSchedulesQuery),
    responses((status = 200, description = "List of schedules", body = [ScheduleResponse])),
    tag = "backup-schedules"
)]
pub async fn list_schedules(
    State(state): State<SharedState>,
    Query(query): Query<ListSchedulesQuery>,
) -> Result<Json<Vec<ScheduleResponse>>> {
    let schedules = state
        .schedule_service()
        .list(ScheduleFilter {
            schedule_type: query.schedule_type,
            frequency: query.frequency,
            status: query.status,
            repository_id: query.repository_id,
        })
        .await?;

    let mut response = Vec::with_capacity(schedules.len());
    for schedule in schedules {
        response.push(to_response(&state, schedule).await?);
    }
    Ok(Json(response))
}

/// Get a schedule by ID
#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/v1/backup-schedules",
    params(("id" = i64, Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Schedule found", body = ScheduleResponse),
        (status = 404, description = "Schedule not found")
    ),
    tag = "backup-schedules"
)]
pub async fn get_schedule(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<ScheduleResponse>> {
    let schedule = state.schedule_service().get(id).await?;
    Ok(Json(to_response(&state, schedule).await?))
}

/// Create a backup schedule
#[utoipa::path(
    post,
    path = "",
    context_path = "/api/v1/backup-schedules",
    request_body = CreateScheduleRequest,
    responses(
        (status = 201, description = "Schedule created", body = ScheduleResponse),
        (status = 409, description = "Schedule id already exists")
    ),
    tag = "backup-schedules"
)]
pub async fn create_schedule(
    State(state): State<SharedState>,
    Json(req): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<ScheduleResponse>)> {
    let schedule = state.schedule_service().create(req).await?;
    let response = to_response(&state, schedule).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Update a backup schedule
#[utoipa::path(
    put,
    path = "/{id}",
    context_path = "/api/v1/backup-schedules",
    params(("id" = i64, Path, description = "Schedule ID")),
    request_body = UpdateScheduleRequest,
    responses(
        (status = 200, description = "Schedule updated", body = ScheduleResponse),
        (status = 404, description = "Schedule not found")
    ),
    tag = "backup-schedules"
)]
pub async fn update_schedule(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateScheduleRequest>,
) -> Result<Json<ScheduleResponse>> {
    let schedule = state.schedule_service().update(id, req).await?;
    Ok(Json(to_response(&state, schedule).await?))
}

/// Flip a schedule between Active and Inactive
#[utoipa::path(
    patch,
    path = "/{id}/toggle-status",
    context_path = "/api/v1/backup-schedules",
    params(("id" = i64, Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Schedule toggled", body = ScheduleResponse),
        (status = 404, description = "Schedule not found")
    ),
    tag = "backup-schedules"
)]
pub async fn toggle_schedule(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<ScheduleResponse>> {
    let schedule = state.schedule_service().toggle(id).await?;
    Ok(Json(to_response(&state, schedule).await?))
}

/// The next schedule by time of day
#[utoipa::path(
    get,
    path = "/next",
    context_path = "/api/v1/backup-schedules",
    responses(
        (status = 200, description = "Next schedule", body = ScheduleResponse),
        (status = 404, description = "No schedule exists")
    ),
    tag = "backup-schedules"
)]
pub async fn next_schedule(
    State(state): State<SharedState>,
) -> Result<Json<ScheduleResponse>> {
    let schedule = state
        .schedule_service()
        .next()
        .await?
        .ok_or_else(|| AppError::NotFound("No schedule exists".to_string()))?;
    Ok(Json(to_response(&state, schedule).await?))
}

/// Delete a backup schedule
#[utoipa::path(
    delete,
    path = "/{id}",
    context_path = "/api/v1/backup-schedules",
    params(("id" = i64, Path, description = "Schedule ID")),
    responses(
        (status = 204, description = "Schedule deleted"),
        (status = 404, description = "Schedule not found")
    ),
    tag = "backup-schedules"
)]
pub async fn delete_schedule(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.schedule_service().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
