//! Git migration endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::api::SharedState;
use crate::error::Result;
use crate::models::migration::{GitMigration, MigrationStatus};
use crate::services::migration_service::{
    CreateMigrationRequest, MigrationFilter, UpdateMigrationRequest,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListMigrationsQuery {
    pub status: Option<MigrationStatus>,
    pub assigned_to: Option<String>,
    pub repository_id: Option<i64>,
    pub search: Option<String>,
}

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_migrations).post(create_migration))
        .route(
            "/{id}",
            get(get_migration)
                .put(update_migration)
                .delete(delete_migration),
        )
        .route("/{id}/start", axum::routing::post(start_migration))
        .route("/{id}/pause", axum::routing::post(pause_migration))
        .route("/{id}/complete", axum::routing::post(complete_migration))
        .route("/{id}/retry", axum::routing::post(retry_migration))
}

/// List migrations
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/v1/migrations",
    params(ListMigrationsQuery),
    responses((status = 200, description = "List of migrations", body = [GitMigration])),
    tag = "migrations"
)]
pub async fn list_migrations(
    State(state): State<SharedState>,
    Query(query): Query<ListMigrationsQuery>,
) -> Result<Json<Vec<GitMigration>>> {
    let migrations = state
        .migration_service()
        .list(MigrationFilter {
            status: query.status,
            assigned_to: query.assigned_to,
            repository_id: query.repository_id,
            search: query.search,
        })
        .await?;
    Ok(Json(migrations))
}

/// Get a migration by ID
#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/v1/migrations",
    params(("id" = i64, Path, description = "Migration ID")),
    responses(
        (status = 200, description = "Migration found", body = GitMigration),
        (status = 404, description = "Migration not found")
    ),
    tag = "migrations"
)]
pub async fn get_migration(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<GitMigration>> {
    Ok(Json(state.migration_service().get(id).await?))
}

/// Create a migration
#[utoipa::path(
    post,
    path = "",
    context_path = "/api/v1/migrations",
    request_body = CreateMigrationRequest,
    responses(
        (status = 201, description = "Migration created", body = GitMigration),
        (status = 404, description = "Linked repository not found")
    ),
    tag = "migrations"
)]
pub async fn create_migration(
    State(state): State<SharedState>,
    Json(req): Json<CreateMigrationRequest>,
) -> Result<(StatusCode, Json<GitMigration>)> {
    let migration = state.migration_service().create(req).await?;
    Ok((StatusCode::CREATED, Json(migration)))
}

/// Update a migration
#[utoipa::path(
    put,
    path = "/{id}",
    context_path = "/api/v1/migrations",
    params(("id" = i64, Path, description = "Migration ID")),
    request_body = UpdateMigrationRequest,
    responses(
        (status = 200, description = "Migration updated", body = GitMigration),
        (status = 404, description = "Migration not found")
    ),
    tag = "migrations"
)]
pub async fn update_migration(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateMigrationRequest>,
) -> Result<Json<GitMigration>> {
    Ok(Json(state.migration_service().update(id, req).await?))
}

/// Start a migration
#[utoipa::path(
    post,
    path = "/{id}/start",
    context_path = "/api/v1/migrations",
    params(("id" = i64, Path, description = "Migration ID")),
    responses(
        (status = 200, description = "Migration started", body = GitMigration),
        (status = 404, description = "Migration not found")
    ),
    tag = "migrations"
)]
pub async fn start_migration(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<GitMigration>> {
    Ok(Json(state.migration_service().start(id).await?))
}

/// Pause a migration back to Not Started
#[utoipa::path(
    post,
    path = "/{id}/pause",
    context_path = "/api/v1/migrations",
    params(("id" = i64, Path, description = "Migration ID")),
    responses(
        (status = 200, description = "Migration paused", body = GitMigration),
        (status = 404, description = "Migration not found")
    ),
    tag = "migrations"
)]
pub async fn pause_migration(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<GitMigration>> {
    Ok(Json(state.migration_service().pause(id).await?))
}

/// Complete a migration
#[utoipa::path(
    post,
    path = "/{id}/complete",
    context_path = "/api/v1/migrations",
    params(("id" = i64, Path, description = "Migration ID")),
    responses(
        (status = 200, description = "Migration completed", body = GitMigration),
        (status = 404, description = "Migration not found")
    ),
    tag = "migrations"
)]
pub async fn complete_migration(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<GitMigration>> {
    Ok(Json(state.migration_service().complete(id).await?))
}

/// Retry a migration, knocking its progress back
#[utoipa::path(
    post,
    path = "/{id}/retry",
    context_path = "/api/v1/migrations",
    params(("id" = i64, Path, description = "Migration ID")),
    responses(
        (status = 200, description = "Migration retried", body = GitMigration),
        (status = 404, description = "Migration not found")
    ),
    tag = "migrations"
)]
pub async fn retry_migration(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<GitMigration>> {
    Ok(Json(state.migration_service().retry(id).await?))
}

/// Delete a migration
#[utoipa::path(
    delete,
    path = "/{id}",
    context_path = "/api/v1/migrations",
    params(("id" = i64, Path, description = "Migration ID")),
    responses(
        (status = 204, description = "Migration deleted"),
        (status = 404, description = "Migration not found")
    ),
    tag = "migrations"
)]
pub async fn delete_migration(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.migration_service().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
