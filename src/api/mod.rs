//! HTTP API layer.

pub mod handlers;
pub mod openapi;
pub mod routes;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::services::backup_service::BackupService;
use crate::services::backup_worker::BackupQueue;
use crate::services::dashboard_service::DashboardService;
use crate::services::migration_service::MigrationService;
use crate::services::repository_service::RepositoryService;
use crate::services::schedule_service::ScheduleService;
use crate::services::superset_client::SupersetClient;
use crate::services::user_service::UserService;

/// Shared application state handed to every handler.
pub struct AppState {
    pub config: Config,
    pub db: SqlitePool,
    pub backup_jobs: BackupQueue,
    pub superset: Option<Arc<SupersetClient>>,
}

impl AppState {
    pub fn new(config: Config, db: SqlitePool, backup_jobs: BackupQueue) -> Self {
        let superset = SupersetClient::from_config(&config).map(Arc::new);
        Self {
            config,
            db,
            backup_jobs,
            superset,
        }
    }

    pub fn user_service(&self) -> UserService {
        UserService::new(self.db.clone())
    }

    pub fn repository_service(&self) -> RepositoryService {
        RepositoryService::new(self.db.clone())
    }

    pub fn backup_service(&self) -> BackupService {
        BackupService::new(self.db.clone(), self.backup_jobs.clone())
    }

    pub fn migration_service(&self) -> MigrationService {
        MigrationService::new(self.db.clone())
    }

    pub fn schedule_service(&self) -> ScheduleService {
        ScheduleService::new(self.db.clone())
    }

    pub fn dashboard_service(&self) -> DashboardService {
        DashboardService::new(self.db.clone())
    }
}

pub type SharedState = Arc<AppState>;
