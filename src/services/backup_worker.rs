//! Background backup worker.
//!
//! Backups are not finished inline: the creating request returns immediately
//! with the record "In Progress" and pushes the id onto an unbounded channel.
//! A single spawned task picks ids up, waits the configured delay to model
//! the running backup, then marks the record complete (or failed) and mirrors
//! the status onto the covered repositories.

use std::time::Duration;

use chrono::Utc;
use sqlx::SqlitePool;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::models::backup::{BackupStatus, BackupType};
use crate::services::backup_service::set_associated_backup_status;

/// Handle for submitting backup ids to the worker.
#[derive(Clone)]
pub struct BackupQueue {
    tx: mpsc::UnboundedSender<i64>,
}

impl BackupQueue {
    /// Queue a backup for deferred completion.
    pub fn submit(&self, backup_id: i64) {
        if self.tx.send(backup_id).is_err() {
            tracing::warn!(backup_id, "Backup worker is gone, backup will stay in progress");
        }
    }
}

/// Worker that completes queued backups after a fixed delay.
pub struct BackupWorker {
    db: SqlitePool,
    delay: Duration,
    rx: mpsc::UnboundedReceiver<i64>,
}

impl BackupWorker {
    /// Spawn the worker task and return the submission handle.
    pub fn spawn(db: SqlitePool, delay: Duration) -> BackupQueue {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = BackupWorker { db, delay, rx };
        tokio::spawn(worker.run());
        BackupQueue { tx }
    }

    async fn run(mut self) {
        while let Some(backup_id) = self.rx.recv().await {
            tokio::time::sleep(self.delay).await;
            if let Err(e) = Self::complete(&self.db, backup_id).await {
                tracing::warn!(backup_id, error = %e, "Backup completion failed");
                if let Err(e) = Self::fail(&self.db, backup_id, &e.to_string()).await {
                    tracing::error!(backup_id, error = %e, "Could not mark backup as failed");
                }
            }
        }
        tracing::debug!("Backup worker channel closed, worker stopping");
    }

    /// Mark a backup complete with type-appropriate duration and size.
    ///
    /// A backup that was deleted or already moved out of "In Progress" while
    /// queued is skipped.
    pub async fn complete(db: &SqlitePool, backup_id: i64) -> Result<()> {
        let mut tx = db.begin().await?;

        let current: Option<(BackupStatus, BackupType)> =
            sqlx::query_as("SELECT status, backup_type FROM backups WHERE id = ?")
                .bind(backup_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((status, backup_type)) = current else {
            return Ok(());
        };
        if status != BackupStatus::InProgress {
            return Ok(());
        }

        let (duration, size) = completion_details(backup_type);

        sqlx::query(
            r#"
            UPDATE backups
            SET status = ?, duration = ?, size = ?,
                logs = 'Backup completed successfully with no errors.', updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(BackupStatus::Complete)
        .bind(duration)
        .bind(size)
        .bind(Utc::now())
        .bind(backup_id)
        .execute(&mut *tx)
        .await?;

        set_associated_backup_status(&mut tx, backup_id, BackupStatus::Complete).await?;

        tx.commit().await?;

        tracing::info!(backup_id, "Backup completed");
        Ok(())
    }

    /// Mark a backup failed with the given reason.
    pub async fn fail(db: &SqlitePool, backup_id: i64, reason: &str) -> Result<()> {
        let mut tx = db.begin().await?;

        sqlx::query(
            "UPDATE backups SET status = ?, logs = ?, updated_at = ? WHERE id = ?",
        )
        .bind(BackupStatus::Failed)
        .bind(format!("Backup failed: {reason}"))
        .bind(Utc::now())
        .bind(backup_id)
        .execute(&mut *tx)
        .await?;

        set_associated_backup_status(&mut tx, backup_id, BackupStatus::Failed).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Fail every backup still marked "In Progress" at startup. Those were
    /// interrupted by a restart and will never be completed by a worker.
    pub async fn sweep_interrupted(db: &SqlitePool) -> Result<u64> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM backups WHERE status = ?")
            .bind(BackupStatus::InProgress)
            .fetch_all(db)
            .await?;

        for id in &ids {
            Self::fail(db, *id, "Backup interrupted by server restart").await?;
        }

        Ok(ids.len() as u64)
    }
}

/// Duration and size labels recorded when a backup of the given type
/// finishes.
pub fn completion_details(backup_type: BackupType) -> (&'static str, &'static str) {
    match backup_type {
        BackupType::Full => ("1h 05m", "15.8 GB"),
        BackupType::Delta => ("15m", "1.2 GB"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_backups_finish_with_full_details() {
        assert_eq!(completion_details(BackupType::Full), ("1h 05m", "15.8 GB"));
    }

    #[test]
    fn delta_backups_finish_with_delta_details() {
        assert_eq!(completion_details(BackupType::Delta), ("15m", "1.2 GB"));
    }
}
