use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use git_dashboard_backend::api::routes::create_router;
use git_dashboard_backend::api::AppState;
use git_dashboard_backend::db::create_pool;
use git_dashboard_backend::services::backup_worker::BackupWorker;
use git_dashboard_backend::{Config, Result};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "git_dashboard_backend=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(bind_address = %config.bind_address, "Starting git dashboard backend");

    let db = create_pool(&config.database_url).await?;

    let interrupted = BackupWorker::sweep_interrupted(&db).await?;
    if interrupted > 0 {
        tracing::warn!(count = interrupted, "Failed backups interrupted by restart");
    }

    let backup_jobs = BackupWorker::spawn(db.clone(), Duration::from_millis(config.backup_delay_ms));

    let bind_address = config.bind_address.clone();
    let state = Arc::new(AppState::new(config, db, backup_jobs));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ]);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %bind_address, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
