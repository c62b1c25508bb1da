//! User management endpoints.

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
use crate::models::user::{User, UserRole, UserStatus};
use crate::services::user_service::{CreateUserRequest, UpdateUserRequest, UserFilter};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListUsersQuery {
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub group: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct StatusQuery {
    pub status: UserStatus,
}

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/{id}/status", axum::routing::patch(update_user_status))
}

/// List users
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/v1/users",
    params(ListUsersQuery),
    responses((status = 200, description = "List of users", body = [User])),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<SharedState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<User>>> {
    let users = state
        .user_service()
        .list(UserFilter {
            role: query.role,
            status: query.status,
            group: query.group,
            search: query.search,
        })
        .await?;
    Ok(Json(users))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/v1/users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<User>> {
    Ok(Json(state.user_service().get(id).await?))
}

/// Create a user
#[utoipa::path(
    post,
    path = "",
    context_path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 409, description = "Username or email already taken")
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<SharedState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = state.user_service().create(req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Update a user
#[utoipa::path(
    put,
    path = "/{id}",
    context_path = "/api/v1/users",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 404, description = "User not found"),
        (status = 409, description = "Username or email already taken")
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>> {
    Ok(Json(state.user_service().update(id, req).await?))
}

/// Update only a user's status
#[utoipa::path(
    patch,
    path = "/{id}/status",
    context_path = "/api/v1/users",
    params(("id" = i64, Path, description = "User ID"), StatusQuery),
    responses(
        (status = 200, description = "Status updated", body = User),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn update_user_status(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<User>> {
    Ok(Json(state.user_service().update_status(id, query.status).await?))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/{id}",
    context_path = "/api/v1/users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.user_service().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
