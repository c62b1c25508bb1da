//! Superset guest-token proxy endpoint.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::SharedState;
use crate::error::{AppError, Result};

#[derive(Debug, Deserialize, ToSchema)]
pub struct GuestTokenRequest {
    pub dashboard_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GuestTokenResponse {
    pub token: String,
}

/// Exchange the service-account credentials for a dashboard-scoped Superset
/// guest token
#[utoipa::path(
    post,
    path = "/guest-token",
    context_path = "/api/v1",
    request_body = GuestTokenRequest,
    responses(
        (status = 200, description = "Guest token issued", body = GuestTokenResponse),
        (status = 502, description = "Superset is unreachable or not configured")
    ),
    tag = "dashboard"
)]
pub async fn guest_token(
    State(state): State<SharedState>,
    Json(req): Json<GuestTokenRequest>,
) -> Result<Json<GuestTokenResponse>> {
    let superset = state.superset.as_ref().ok_or_else(|| {
        AppError::Upstream("Superset dashboard service is not configured".to_string())
    })?;

    let token = superset.guest_token(&req.dashboard_id).await?;
    Ok(Json(GuestTokenResponse { token }))
}
