//! Backup service.
//!
//! Creating a backup records it as "In Progress", fans the status out to the
//! covered repositories and hands the id to the background worker, which
//! finishes it after the configured delay. Only failed backups can be
//! retried; a retry re-enters "In Progress" and goes back onto the queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqlitePool, Transaction};
use utoipa::ToSchema;

use crate::error::{AppError, Result};
use crate::models::backup::{generate_backup_id, Backup, BackupStatus, BackupType};
use crate::services::backup_worker::BackupQueue;

pub(crate) const BACKUP_COLUMNS: &str = "id, backup_id, date, backup_type, status, size, \
     duration, initiated_by, notes, logs, created_at, updated_at";

/// Filters for listing backups
#[derive(Debug, Default)]
pub struct BackupFilter {
    pub status: Option<BackupStatus>,
    pub backup_type: Option<BackupType>,
    pub repository_id: Option<i64>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Request to create a backup
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBackupRequest {
    pub backup_id: Option<String>,
    #[serde(rename = "type")]
    pub backup_type: BackupType,
    pub initiated_by: Option<String>,
    pub notes: Option<String>,
    /// Repositories covered by the backup; omitted or empty means all.
    pub repository_ids: Option<Vec<i64>>,
}

/// Aggregate backup statistics
#[derive(Debug, Serialize, ToSchema)]
pub struct BackupStatistics {
    pub total: i64,
    pub completed: i64,
    pub in_progress: i64,
    pub failed: i64,
    pub total_storage_gb: f64,
}

/// Backup service
pub struct BackupService {
    db: SqlitePool,
    jobs: BackupQueue,
}

impl BackupService {
    pub fn new(db: SqlitePool, jobs: BackupQueue) -> Self {
        Self { db, jobs }
    }

    /// List backups matching the given filters
    pub async fn list(&self, filter: BackupFilter) -> Result<Vec<Backup>> {
        let backups = sqlx::query_as::<_, Backup>(&format!(
            r#"
            SELECT {BACKUP_COLUMNS}
            FROM backups
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR backup_type = ?2)
              AND (?3 IS NULL OR EXISTS (
                    SELECT 1 FROM backup_repositories br
                    WHERE br.backup_id = backups.id AND br.repository_id = ?3))
              AND (?4 IS NULL OR date >= ?4)
              AND (?5 IS NULL OR date <= ?5)
            ORDER BY date DESC
            "#
        ))
        .bind(filter.status)
        .bind(filter.backup_type)
        .bind(filter.repository_id)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(&self.db)
        .await?;

        Ok(backups)
    }

    /// Get a backup by ID
    pub async fn get(&self, id: i64) -> Result<Backup> {
        let backup = sqlx::query_as::<_, Backup>(&format!(
            "SELECT {BACKUP_COLUMNS} FROM backups WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Backup not found with id: {id}")))?;

        Ok(backup)
    }

    /// Get a backup by its BKP-#### identifier
    pub async fn get_by_backup_id(&self, backup_id: &str) -> Result<Option<Backup>> {
        let backup = sqlx::query_as::<_, Backup>(&format!(
            "SELECT {BACKUP_COLUMNS} FROM backups WHERE backup_id = ?"
        ))
        .bind(backup_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(backup)
    }

    /// The repositories covered by a backup
    pub async fn repository_ids(&self, id: i64) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar(
            "SELECT repository_id FROM backup_repositories WHERE backup_id = ? ORDER BY repository_id",
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(ids)
    }

    /// Create a backup covering the given repositories (all when none given)
    /// and queue it for deferred completion
    pub async fn create(&self, req: CreateBackupRequest) -> Result<Backup> {
        let backup_id = req
            .backup_id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(generate_backup_id);
        let now = Utc::now();

        let mut tx = self.db.begin().await?;

        let repo_ids = match req.repository_ids {
            Some(ids) if !ids.is_empty() => {
                for repo_id in &ids {
                    let exists: i64 =
                        sqlx::query_scalar("SELECT COUNT(*) FROM repositories WHERE id = ?")
                            .bind(repo_id)
                            .fetch_one(&mut *tx)
                            .await?;
                    if exists == 0 {
                        return Err(AppError::NotFound(format!(
                            "Repository not found with id: {repo_id}"
                        )));
                    }
                }
                ids
            }
            _ => {
                sqlx::query_scalar("SELECT id FROM repositories ORDER BY id")
                    .fetch_all(&mut *tx)
                    .await?
            }
        };

        let result = sqlx::query(
            r#"
            INSERT INTO backups (
                backup_id, date, backup_type, status, size, duration,
                initiated_by, notes, logs, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, NULL, '0m', ?, ?, 'Backup initiated...', ?, ?)
            "#,
        )
        .bind(&backup_id)
        .bind(now)
        .bind(req.backup_type)
        .bind(BackupStatus::InProgress)
        .bind(&req.initiated_by)
        .bind(&req.notes)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict(format!("Backup id already exists: {backup_id}"))
            }
            other => AppError::Database(other),
        })?;
        let id = result.last_insert_rowid();

        for repo_id in &repo_ids {
            sqlx::query("INSERT INTO backup_repositories (backup_id, repository_id) VALUES (?, ?)")
                .bind(id)
                .bind(repo_id)
                .execute(&mut *tx)
                .await?;
        }

        set_associated_backup_status(&mut tx, id, BackupStatus::InProgress).await?;

        tx.commit().await?;

        self.jobs.submit(id);

        self.get(id).await
    }

    /// Retry a failed backup. The record re-enters "In Progress" and is
    /// queued again; non-failed backups are rejected.
    pub async fn retry(&self, id: i64) -> Result<Backup> {
        let backup = self.get(id).await?;

        if backup.status != BackupStatus::Failed {
            return Err(AppError::InvalidState(
                "Only failed backups can be retried".to_string(),
            ));
        }

        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        // The previous run's size and duration stay visible until the retry
        // settles.
        sqlx::query(
            r#"
            UPDATE backups
            SET status = ?, date = ?, logs = 'Retry initiated...', updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(BackupStatus::InProgress)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        set_associated_backup_status(&mut tx, id, BackupStatus::InProgress).await?;

        tx.commit().await?;

        self.jobs.submit(id);

        self.get(id).await
    }

    /// Delete a backup by ID
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM backups WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Backup not found with id: {id}")));
        }

        Ok(())
    }

    /// Aggregate counts plus the summed storage of completed backups
    pub async fn statistics(&self) -> Result<BackupStatistics> {
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

        let sizes: Vec<String> = sqlx::query_scalar(
            "SELECT size FROM backups WHERE status = ? AND size IS NOT NULL",
        )
        .bind(BackupStatus::Complete)
        .fetch_all(&self.db)
        .await?;

        let total: f64 = sizes.iter().map(|s| parse_size_gb(s)).sum();

        Ok(BackupStatistics {
            total: completed + in_progress + failed,
            completed,
            in_progress,
            failed,
            total_storage_gb: (total * 10.0).round() / 10.0,
        })
    }

    /// The most recent completed full backup, if any
    pub async fn last_full(&self) -> Result<Option<Backup>> {
        let backup = sqlx::query_as::<_, Backup>(&format!(
            r#"
            SELECT {BACKUP_COLUMNS}
            FROM backups
            WHERE backup_type = ? AND status = ?
            ORDER BY date DESC
            LIMIT 1
            "#
        ))
        .bind(BackupType::Full)
        .bind(BackupStatus::Complete)
        .fetch_optional(&self.db)
        .await?;

        Ok(backup)
    }
}

/// Mirror a backup's status onto every repository it covers, inside an open
/// transaction.
pub(crate) async fn set_associated_backup_status(
    tx: &mut Transaction<'_, Sqlite>,
    backup_id: i64,
    status: BackupStatus,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE repositories
        SET backup_status = ?, updated_at = ?
        WHERE id IN (SELECT repository_id FROM backup_repositories WHERE backup_id = ?)
        "#,
    )
    .bind(status)
    .bind(Utc::now())
    .bind(backup_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Parse the leading numeric part of a size label like "15.8 GB" into
/// gigabytes; anything unparseable counts as zero.
pub(crate) fn parse_size_gb(size: &str) -> f64 {
    let trimmed = size.trim();
    let numeric: String = trimmed
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    numeric.parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_gigabyte_labels() {
        assert_eq!(parse_size_gb("15.8 GB"), 15.8);
        assert_eq!(parse_size_gb("1.2 GB"), 1.2);
        assert_eq!(parse_size_gb("120 GB"), 120.0);
    }

    #[test]
    fn unparseable_sizes_count_as_zero() {
        assert_eq!(parse_size_gb("unknown"), 0.0);
        assert_eq!(parse_size_gb(""), 0.0);
    }
}
