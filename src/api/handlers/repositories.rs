//! Repository endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::SharedState;
use crate::error::Result;
use crate::models::backup::BackupStatus;
use crate::models::migration::MigrationStatus;
use crate::models::repository::Repository;
use crate::models::user::User;
use crate::services::repository_service::{
    CreateRepositoryRequest, RepositoryFilter, UpdateRepositoryRequest,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListRepositoriesQuery {
    pub migration_status: Option<MigrationStatus>,
    pub backup_status: Option<BackupStatus>,
    pub member: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct MigrationStatusQuery {
    pub status: MigrationStatus,
    pub progress: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MemberIds {
    pub member_ids: Vec<i64>,
}

/// Repository with its member list attached
#[derive(Debug, Serialize, ToSchema)]
pub struct RepositoryResponse {
    #[serde(flatten)]
    pub repository: Repository,
    pub members: Vec<User>,
}

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_repositories).post(create_repository))
        .route(
            "/{id}",
            get(get_repository)
                .put(update_repository)
                .delete(delete_repository),
        )
        .route("/{id}/members", axum::routing::put(replace_members))
        .route(
            "/{id}/migration-status",
            axum::routing::patch(update_migration_status),
        )
}

/// List repositories
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/v1/repositories",
    params(ListRepositoriesQuery),
    responses((status = 200, description = "List of repositories", body = [RepositoryResponse])),
    tag = "repositories"
)]
pub async fn list_repositories(
    State(state): State<SharedState>,
    Query(query): Query<ListRepositoriesQuery>,
) -> Result<Json<Vec<RepositoryResponse>>> {
    let service = state.repository_service();
    let repos = service
        .list(RepositoryFilter {
            migration_status: query.migration_status,
            backup_status: query.backup_status,
            member: query.member,
            search: query.search,
        })
        .await?;

    let mut response = Vec::with_capacity(repos.len());
    for repo in repos {
        let members = service.members(repo.id).await?;
        response.push(RepositoryResponse {
            repository: repo,
            members,
        });
    }
    Ok(Json(response))
}

/// Get a repository by ID
#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/v1/repositories",
    params(("id" = i64, Path, description = "Repository ID")),
    responses(
        (status = 200, description = "Repository found", body = RepositoryResponse),
        (status = 404, description = "Repository not found")
    ),
    tag = "repositories"
)]
pub async fn get_repository(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<RepositoryResponse>> {
    let service = state.repository_service();
    let repository = service.get(id).await?;
    let members = service.members(id).await?;
    Ok(Json(RepositoryResponse {
        repository,
        members,
    }))
}

/// Create a repository
#[utoipa::path(
    post,
    path = "",
    context_path = "/api/v1/repositories",
    request_body = CreateRepositoryRequest,
    responses(
        (status = 201, description = "Repository created", body = RepositoryResponse),
        (status = 409, description = "Repository name already exists")
    ),
    tag = "repositories"
)]
pub async fn create_repository(
    State(state): State<SharedState>,
    Json(req): Json<CreateRepositoryRequest>,
) -> Result<(StatusCode, Json<RepositoryResponse>)> {
    let service = state.repository_service();
    let repository = service.create(req).await?;
    let members = service.members(repository.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(RepositoryResponse {
            repository,
            members,
        }),
    ))
}

/// Update a repository
#[utoipa::path(
    put,
    path = "/{id}",
    context_path = "/api/v1/repositories",
    params(("id" = i64, Path, description = "Repository ID")),
    request_body = UpdateRepositoryRequest,
    responses(
        (status = 200, description = "Repository updated", body = RepositoryResponse),
        (status = 404, description = "Repository not found"),
        (status = 409, description = "Repository name already exists")
    ),
    tag = "repositories"
)]
pub async fn update_repository(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateRepositoryRequest>,
) -> Result<Json<RepositoryResponse>> {
    let service = state.repository_service();
    let repository = service.update(id, req).await?;
    let members = service.members(id).await?;
    Ok(Json(RepositoryResponse {
        repository,
        members,
    }))
}

/// Replace the member set of a repository
#[utoipa::path(
    put,
    path = "/{id}/members",
    context_path = "/api/v1/repositories",
    params(("id" = i64, Path, description = "Repository ID")),
    request_body = MemberIds,
    responses(
        (status = 200, description = "Members replaced", body = [User]),
        (status = 404, description = "Repository or user not found")
    ),
    tag = "repositories"
)]
pub async fn replace_members(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<MemberIds>,
) -> Result<Json<Vec<User>>> {
    let members = state
        .repository_service()
        .replace_members(id, &req.member_ids)
        .await?;
    Ok(Json(members))
}

/// Patch a repository's migration status
#[utoipa::path(
    patch,
    path = "/{id}/migration-status",
    context_path = "/api/v1/repositories",
    params(("id" = i64, Path, description = "Repository ID"), MigrationStatusQuery),
    responses(
        (status = 200, description = "Migration status updated", body = RepositoryResponse),
        (status = 404, description = "Repository not found")
    ),
    tag = "repositories"
)]
pub async fn update_migration_status(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Query(query): Query<MigrationStatusQuery>,
) -> Result<Json<RepositoryResponse>> {
    let service = state.repository_service();
    let repository = service
        .update_migration_status(id, query.status, query.progress)
        .await?;
    let members = service.members(id).await?;
    Ok(Json(RepositoryResponse {
        repository,
        members,
    }))
}

/// Delete a repository
#[utoipa::path(
    delete,
    path = "/{id}",
    context_path = "/api/v1/repositories",
    params(("id" = i64, Path, description = "Repository ID")),
    responses(
        (status = 204, description = "Repository deleted"),
        (status = 404, description = "Repository not found")
    ),
    tag = "repositories"
)]
pub async fn delete_repository(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.repository_service().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
