//! Backup schedule service.

use chrono::Utc;
use serde::Deserialize;
use sqlx::{Sqlite, SqlitePool, Transaction};
use utoipa::ToSchema;

use crate::error::{AppError, Result};
use crate::models::backup::BackupType;
use crate::models::schedule::{generate_schedule_id, BackupSchedule, ScheduleStatus};

const SCHEDULE_COLUMNS: &str = "id, schedule_id, name, schedule_type, frequency, time, \
     retention, status, created_at, updated_at";

/// Filters for listing schedules
#[derive(Debug, Default)]
pub struct ScheduleFilter {
    pub schedule_type: Option<BackupType>,
    pub frequency: Option<String>,
    pub status: Option<ScheduleStatus>,
    pub repository_id: Option<i64>,
}

/// Request to create a backup schedule
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateScheduleRequest {
    pub schedule_id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub schedule_type: BackupType,
    pub frequency: String,
    pub time: String,
    pub retention: String,
    pub status: Option<ScheduleStatus>,
    pub repository_ids: Option<Vec<i64>>,
}

/// Request to update a backup schedule
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateScheduleRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub schedule_type: BackupType,
    pub frequency: String,
    pub time: String,
    pub retention: String,
    pub status: Option<ScheduleStatus>,
    pub repository_ids: Option<Vec<i64>>,
}

/// Backup schedule service
pub struct ScheduleService {
    db: SqlitePool,
}

impl ScheduleService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// List schedules matching the given filters
    pub async fn list(&self, filter: ScheduleFilter) -> Result<Vec<BackupSchedule>> {
        let schedules = sqlx::query_as::<_, BackupSchedule>(&format!(
            r#"
            SELECT {SCHEDULE_COLUMNS}
            FROM backup_schedules
            WHERE (?1 IS NULL OR schedule_type = ?1)
              AND (?2 IS NULL OR frequency = ?2)
              AND (?3 IS NULL OR status = ?3)
              AND (?4 IS NULL OR EXISTS (
                    SELECT 1 FROM backup_schedule_repositories sr
                    WHERE sr.schedule_id = backup_schedules.id AND sr.repository_id = ?4))
            ORDER BY time
            "#
        ))
        .bind(filter.schedule_type)
        .bind(filter.frequency)
        .bind(filter.status)
        .bind(filter.repository_id)
        .fetch_all(&self.db)
        .await?;

        Ok(schedules)
    }

    /// Get a schedule by ID
    pub async fn get(&self, id: i64) -> Result<BackupSchedule> {
        let schedule = sqlx::query_as::<_, BackupSchedule>(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM backup_schedules WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Schedule not found with id: {id}")))?;

        Ok(schedule)
    }

    /// Get a schedule by its SCH-### identifier
    pub async fn get_by_schedule_id(&self, schedule_id: &str) -> Result<Option<BackupSchedule>> {
        let schedule = sqlx::query_as::<_, BackupSchedule>(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM backup_schedules WHERE schedule_id = ?"
        ))
        .bind(schedule_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(schedule)
    }

    /// The repositories covered by a schedule
    pub async fn repository_ids(&self, id: i64) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar(
            "SELECT repository_id FROM backup_schedule_repositories WHERE schedule_id = ? ORDER BY repository_id",
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(ids)
    }

    /// Create a schedule
    pub async fn create(&self, req: CreateScheduleRequest) -> Result<BackupSchedule> {
        if req.name.trim().is_empty() {
            return Err(AppError::Validation("name is required".to_string()));
        }

        let schedule_id = req
            .schedule_id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(generate_schedule_id);
        let status = req.status.unwrap_or(ScheduleStatus::Active);
        let now = Utc::now();

        let mut tx = self.db.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO backup_schedules (
                schedule_id, name, schedule_type, frequency, time, retention,
                status, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&schedule_id)
        .bind(&req.name)
        .bind(req.schedule_type)
        .bind(&req.frequency)
        .bind(&req.time)
        .bind(&req.retention)
        .bind(status)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict(format!("Schedule id already exists: {schedule_id}"))
            }
            other => AppError::Database(other),
        })?
        .last_insert_rowid();

        if let Some(repo_ids) = req.repository_ids {
            replace_schedule_repositories(&mut tx, id, &repo_ids).await?;
        }

        tx.commit().await?;

        self.get(id).await
    }

    /// Update a schedule
    pub async fn update(&self, id: i64, req: UpdateScheduleRequest) -> Result<BackupSchedule> {
        let schedule = self.get(id).await?;

        if req.name.trim().is_empty() {
            return Err(AppError::Validation("name is required".to_string()));
        }

        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            UPDATE backup_schedules
            SET name = ?, schedule_type = ?, frequency = ?, time = ?, retention = ?,
                status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&req.name)
        .bind(req.schedule_type)
        .bind(&req.frequency)
        .bind(&req.time)
        .bind(&req.retention)
        .bind(req.status.unwrap_or(schedule.status))
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if let Some(repo_ids) = req.repository_ids {
            replace_schedule_repositories(&mut tx, id, &repo_ids).await?;
        }

        tx.commit().await?;

        self.get(id).await
    }

    /// Flip a schedule between Active and Inactive
    pub async fn toggle(&self, id: i64) -> Result<BackupSchedule> {
        let schedule = self.get(id).await?;

        sqlx::query("UPDATE backup_schedules SET status = ?, updated_at = ? WHERE id = ?")
            .bind(schedule.status.toggled())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.db)
            .await?;

        self.get(id).await
    }

    /// The schedule with the earliest time of day, if any
    pub async fn next(&self) -> Result<Option<BackupSchedule>> {
        let schedule = sqlx::query_as::<_, BackupSchedule>(&format!(
            r#"
            SELECT {SCHEDULE_COLUMNS}
            FROM backup_schedules
            ORDER BY time ASC
            LIMIT 1
            "#
        ))
        .fetch_optional(&self.db)
        .await?;

        Ok(schedule)
    }

    /// Delete a schedule by ID
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM backup_schedules WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Schedule not found with id: {id}"
            )));
        }

        Ok(())
    }
}

async fn replace_schedule_repositories(
    tx: &mut Transaction<'_, Sqlite>,
    schedule_id: i64,
    repository_ids: &[i64],
) -> Result<()> {
    for repo_id in repository_ids {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM repositories WHERE id = ?")
            .bind(repo_id)
            .fetch_one(&mut **tx)
            .await?;
        if exists == 0 {
            return Err(AppError::NotFound(format!(
                "Repository not found with id: {repo_id}"
            )));
        }
    }

    sqlx::query("DELETE FROM backup_schedule_repositories WHERE schedule_id = ?")
        .bind(schedule_id)
        .execute(&mut **tx)
        .await?;

    for repo_id in repository_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO backup_schedule_repositories (schedule_id, repository_id) VALUES (?, ?)",
        )
        .bind(schedule_id)
        .bind(repo_id)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}
