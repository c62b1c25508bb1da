//! OpenAPI document assembly.

use utoipa::OpenApi;

use crate::api::handlers;
use crate::models::backup::{Backup, BackupStatus, BackupType};
use crate::models::migration::{GitMigration, MigrationStatus};
use crate::models::repository::Repository;
use crate::models::schedule::{BackupSchedule, ScheduleStatus};
use crate::models::user::{User, UserRole, UserStatus};
use crate::services::backup_service::{BackupStatistics, CreateBackupRequest};
use crate::services::dashboard_service::{
    ActivityEntry, BackupSummary, DashboardMetrics, MigrationProgress,
};
use crate::services::migration_service::{CreateMigrationRequest, UpdateMigrationRequest};
use crate::services::repository_service::{CreateRepositoryRequest, UpdateRepositoryRequest};
use crate::services::schedule_service::{CreateScheduleRequest, UpdateScheduleRequest};
use crate::services::user_service::{CreateUserRequest, UpdateUserRequest};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Git Dashboard Backend API",
        description = "REST backend for the Git migration dashboard: users, repositories, backups, schedules, migrations and dashboard rollups",
    ),
    paths(
        handlers::health::health_check,
        handlers::health::readiness_check,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::update_user_status,
        handlers::users::delete_user,
        handlers::repositories::list_repositories,
        handlers::repositories::get_repository,
        handlers::repositories::create_repository,
        handlers::repositories::update_repository,
        handlers::repositories::replace_members,
        handlers::repositories::update_migration_status,
        handlers::repositories::delete_repository,
        handlers::backups::list_backups,
        handlers::backups::get_backup,
        handlers::backups::create_backup,
        handlers::backups::retry_backup,
        handlers::backups::backup_statistics,
        handlers::backups::last_full_backup,
        handlers::backups::delete_backup,
        handlers::schedules::list_schedules,
        handlers::schedules::get_schedule,
        handlers::schedules::create_schedule,
        handlers::schedules::update_schedule,
        handlers::schedules::toggle_schedule,
        handlers::schedules::next_schedule,
        handlers::schedules::delete_schedule,
        handlers::migrations::list_migrations,
        handlers::migrations::get_migration,
        handlers::migrations::create_migration,
        handlers::migrations::update_migration,
        handlers::migrations::start_migration,
        handlers::migrations::pause_migration,
        handlers::migrations::complete_migration,
        handlers::migrations::retry_migration,
        handlers::migrations::delete_migration,
        handlers::dashboard::dashboard_metrics,
        handlers::dashboard::recent_activity,
        handlers::dashboard::migration_progress,
        handlers::dashboard::backup_summary,
        handlers::guest_token::guest_token,
    ),
    components(schemas(
        User,
        UserRole,
        UserStatus,
        CreateUserRequest,
        UpdateUserRequest,
        Repository,
        CreateRepositoryRequest,
        UpdateRepositoryRequest,
        handlers::repositories::RepositoryResponse,
        handlers::repositories::MemberIds,
        Backup,
        BackupType,
        BackupStatus,
        CreateBackupRequest,
        BackupStatistics,
        handlers::backups::BackupResponse,
        BackupSchedule,
        ScheduleStatus,
        CreateScheduleRequest,
        UpdateScheduleRequest,
        handlers::schedules::ScheduleResponse,
        GitMigration,
        MigrationStatus,
        CreateMigrationRequest,
        UpdateMigrationRequest,
        DashboardMetrics,
        ActivityEntry,
        MigrationProgress,
        BackupSummary,
        handlers::guest_token::GuestTokenRequest,
        handlers::guest_token::GuestTokenResponse,
        handlers::health::HealthResponse,
    )),
    tags(
        (name = "health", description = "Liveness and readiness"),
        (name = "users", description = "User management"),
        (name = "repositories", description = "Repository management"),
        (name = "backups", description = "Backup lifecycle"),
        (name = "backup-schedules", description = "Backup scheduling"),
        (name = "migrations", description = "Git migration lifecycle"),
        (name = "dashboard", description = "Dashboard rollups and embedding"),
    )
)]
pub struct ApiDoc;

pub fn build_openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
