//! Repository model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use super::backup::BackupStatus;
use super::migration::MigrationStatus;

/// Repository entity.
///
/// `backup_status` mirrors the state of the most recent backup covering the
/// repository and is null until a backup touches it. `migration_status` and
/// `migration_progress` stay in sync with any linked migration record.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Repository {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub size: Option<String>,
    pub backup_status: Option<BackupStatus>,
    pub migration_status: MigrationStatus,
    pub migration_progress: i64,
    pub color_code: String,
    pub last_commit: Option<DateTime<Utc>>,
    pub last_commit_by: Option<String>,
    pub created_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
