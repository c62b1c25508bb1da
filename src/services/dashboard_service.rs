//! Dashboard aggregation service.
//!
//! Read-only rollups over the other entities. Enum-keyed count maps are
//! zero-filled so every variant appears even with no matching rows.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use strum::IntoEnumIterator;
use utoipa::ToSchema;

use crate::error::Result;
use crate::models::backup::{BackupStatus, BackupType};
use crate::models::migration::MigrationStatus;
use crate::models::user::{UserRole, UserStatus};
use crate::services::backup_service::parse_size_gb;

/// Top-level dashboard metrics
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardMetrics {
    pub total_users: i64,
    pub active_users: i64,
    pub total_repositories: i64,
    pub active_repositories: i64,
    pub total_backups_completed: i64,
    pub backup_completion_rate: f64,
    pub backup_success_rate: f64,
    pub last_full_backup: Option<DateTime<Utc>>,
    pub git_migration_progress: i64,
    pub users_by_role: BTreeMap<String, i64>,
    pub users_by_status: BTreeMap<String, i64>,
    pub users_by_group: BTreeMap<String, i64>,
    pub backups_by_status: BTreeMap<String, i64>,
    pub migrations_by_status: BTreeMap<String, i64>,
    pub recent_activity: Vec<ActivityEntry>,
}

/// One row of the recent-activity feed
#[derive(Debug, Serialize, ToSchema)]
pub struct ActivityEntry {
    pub id: i64,
    pub user: String,
    pub action: String,
    pub time: DateTime<Utc>,
    pub color: String,
}

/// Per-status repository counts plus the blended overall percentage
#[derive(Debug, Serialize, ToSchema)]
pub struct MigrationProgress {
    pub total_repositories: i64,
    pub not_started: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub archived: i64,
    pub overall_progress: i64,
}

/// Backup counts and storage for the dashboard card
#[derive(Debug, Serialize, ToSchema)]
pub struct BackupSummary {
    pub total: i64,
    pub completed: i64,
    pub in_progress: i64,
    pub failed: i64,
    pub total_storage_gb: f64,
    pub next_scheduled_backup: Option<String>,
}

/// Dashboard service
pub struct DashboardService {
    db: SqlitePool,
}

impl DashboardService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Aggregate dashboard metrics
    pub async fn metrics(&self) -> Result<DashboardMetrics> {
        let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;
        let active_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE status = ?")
            .bind(UserStatus::Active)
            .fetch_one(&self.db)
            .await?;
        let total_repositories: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM repositories")
            .fetch_one(&self.db)
            .await?;
        let active_repositories: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM repositories WHERE migration_status <> ?")
                .bind(MigrationStatus::Archived)
                .fetch_one(&self.db)
                .await?;
        let total_backups: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM backups")
            .fetch_one(&self.db)
            .await?;
        let total_backups_completed: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM backups WHERE status = ?")
                .bind(BackupStatus::Complete)
                .fetch_one(&self.db)
                .await?;

        let backup_completion_rate = if total_repositories > 0 {
            let rate = total_backups_completed as f64 / total_repositories as f64 * 100.0;
            (rate * 100.0).round() / 100.0
        } else {
            0.0
        };
        let backup_success_rate = if total_backups > 0 {
            let rate = total_backups_completed as f64 / total_backups as f64 * 100.0;
            (rate * 100.0).round() / 100.0
        } else {
            0.0
        };

        let last_full_backup: Option<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT date FROM backups WHERE backup_type = ? AND status = ? ORDER BY date DESC LIMIT 1",
        )
        .bind(BackupType::Full)
        .bind(BackupStatus::Complete)
        .fetch_optional(&self.db)
        .await?;

        let users_by_role = self
            .enum_count_map::<UserRole>("SELECT role, COUNT(*) FROM users GROUP BY role")
            .await?;
        let users_by_status = self
            .enum_count_map::<UserStatus>("SELECT status, COUNT(*) FROM users GROUP BY status")
            .await?;
        let backups_by_status = self
            .enum_count_map::<BackupStatus>("SELECT status, COUNT(*) FROM backups GROUP BY status")
            .await?;
        // Archived is a repository-only state; migration records never carry it.
        let migrations_by_status = self
            .count_map(
                "SELECT status, COUNT(*) FROM git_migrations GROUP BY status",
                MigrationStatus::iter().filter(|s| *s != MigrationStatus::Archived),
            )
            .await?;

        // Group names are free-form, so no zero-fill here.
        let group_rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT group_name, COUNT(*) FROM users GROUP BY group_name")
                .fetch_all(&self.db)
                .await?;
        let users_by_group = group_rows.into_iter().collect();

        // Migration progress here is over migration records, not repositories.
        let total_migrations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM git_migrations")
            .fetch_one(&self.db)
            .await?;
        let completed_migrations: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM git_migrations WHERE status = ?")
                .bind(MigrationStatus::Completed)
                .fetch_one(&self.db)
                .await?;
        let git_migration_progress = if total_migrations > 0 {
            (completed_migrations as f64 / total_migrations as f64 * 100.0).round() as i64
        } else {
            0
        };

        let recent_activity = self.recent_activity().await?;

        Ok(DashboardMetrics {
            total_users,
            active_users,
            total_repositories,
            active_repositories,
            total_backups_completed,
            backup_completion_rate,
            backup_success_rate,
            last_full_backup,
            git_migration_progress,
            users_by_role,
            users_by_status,
            users_by_group,
            backups_by_status,
            migrations_by_status,
            recent_activity,
        })
    }

    /// Latest migration and backup changes, newest first, capped at ten
    pub async fn recent_activity(&self) -> Result<Vec<ActivityEntry>> {
        let migrations: Vec<(String, Option<String>, String, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT name, assigned_to, color_code, updated_at
            FROM git_migrations
            ORDER BY updated_at DESC
            LIMIT 5
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let backups: Vec<(String, Option<String>, BackupStatus, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT backup_id, initiated_by, status, updated_at
            FROM backups
            ORDER BY updated_at DESC
            LIMIT 5
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut entries: Vec<ActivityEntry> = Vec::new();
        for (name, assigned_to, color_code, updated_at) in migrations {
            entries.push(ActivityEntry {
                id: 0,
                user: assigned_to.unwrap_or_else(|| "System".to_string()),
                action: format!("Updated migration {name}"),
                time: updated_at,
                color: color_code,
            });
        }
        for (backup_id, initiated_by, status, updated_at) in backups {
            entries.push(ActivityEntry {
                id: 0,
                user: initiated_by.unwrap_or_else(|| "System".to_string()),
                action: format!("Backup {backup_id} is {status}"),
                time: updated_at,
                color: "bg-blue-500".to_string(),
            });
        }

        entries.sort_by(|a, b| b.time.cmp(&a.time));
        entries.truncate(10);
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.id = i as i64 + 1;
        }

        Ok(entries)
    }

    /// Repository counts per migration status and the blended overall
    /// percentage, where an in-progress repository counts for half
    pub async fn migration_progress(&self) -> Result<MigrationProgress> {
        let rows: Vec<(MigrationStatus, i64)> = sqlx::query_as(
            "SELECT migration_status, COUNT(*) FROM repositories GROUP BY migration_status",
        )
        .fetch_all(&self.db)
        .await?;

        let mut not_started = 0;
        let mut in_progress = 0;
        let mut completed = 0;
        let mut archived = 0;
        let mut total = 0;
        for (status, count) in rows {
            total += count;
            match status {
                MigrationStatus::NotStarted => not_started = count,
                MigrationStatus::InProgress => in_progress = count,
                MigrationStatus::Completed => completed = count,
                MigrationStatus::Archived => archived = count,
                MigrationStatus::Failed => {}
            }
        }

        let overall_progress = if total > 0 {
            ((completed as f64 + 0.5 * in_progress as f64) / total as f64 * 100.0).round() as i64
        } else {
            0
        };

        Ok(MigrationProgress {
            total_repositories: total,
            not_started,
            in_progress,
            completed,
            archived,
            overall_progress,
        })
    }

    /// Backup counts, total stored gigabytes and the next schedule time
    pub async fn backup_summary(&self) -> Result<BackupSummary> {
        let rows: Vec<(BackupStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM backups GROUP BY status")
                .fetch_all(&self.db)
                .await?;

        let mut completed = 0;
        let mut in_progress = 0;
        let mut failed = 0;
        for (status, count) in rows {
            match status {
                BackupStatus::Complete => completed = count,
                BackupStatus::InProgress => in_progress = count,
                BackupStatus::Failed => failed = count,
            }
        }

        let sizes: Vec<String> =
            sqlx::query_scalar("SELECT size FROM backups WHERE status = ? AND size IS NOT NULL")
                .bind(BackupStatus::Complete)
                .fetch_all(&self.db)
                .await?;
        let total_storage: f64 = sizes.iter().map(|s| parse_size_gb(s)).sum();

        let next_scheduled_backup: Option<String> = sqlx::query_scalar(
            "SELECT time FROM backup_schedules ORDER BY time ASC LIMIT 1",
        )
        .fetch_optional(&self.db)
        .await?;

        Ok(BackupSummary {
            total: completed + in_progress + failed,
            completed,
            in_progress,
            failed,
            total_storage_gb: (total_storage * 10.0).round() / 10.0,
            next_scheduled_backup,
        })
    }

    /// Run a `SELECT <enum>, COUNT(*) ... GROUP BY` query and zero-fill the
    /// result with every variant of the enum.
    async fn enum_count_map<T>(&self, sql: &str) -> Result<BTreeMap<String, i64>>
    where
        T: IntoEnumIterator + std::fmt::Display,
    {
        self.count_map(sql, T::iter()).await
    }

    async fn count_map<T>(
        &self,
        sql: &str,
        variants: impl Iterator<Item = T>,
    ) -> Result<BTreeMap<String, i64>>
    where
        T: std::fmt::Display,
    {
        let rows: Vec<(String, i64)> = sqlx::query_as(sql).fetch_all(&self.db).await?;

        let mut map: BTreeMap<String, i64> = variants.map(|v| (v.to_string(), 0)).collect();
        for (key, count) in rows {
            map.insert(key, count);
        }

        Ok(map)
    }
}
