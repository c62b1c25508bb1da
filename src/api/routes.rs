//! Route tree assembly.

use axum::{routing::get, routing::post, Json, Router};

use crate::api::handlers;
use crate::api::openapi::build_openapi;
use crate::api::SharedState;

/// Build the full application router.
pub fn create_router(state: SharedState) -> Router {
    let openapi = build_openapi();

    let api = Router::new()
        .nest("/users", handlers::users::router())
        .nest("/repositories", handlers::repositories::router())
        .nest("/backups", handlers::backups::router())
        .nest("/backup-schedules", handlers::schedules::router())
        .nest("/migrations", handlers::migrations::router())
        .nest("/dashboard", handlers::dashboard::router())
        .route("/guest-token", post(handlers::guest_token::guest_token))
        .route(
            "/openapi.json",
            get(move || {
                let doc = openapi.clone();
                async move { Json(doc) }
            }),
        );

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .nest("/api/v1", api)
        .with_state(state)
}
