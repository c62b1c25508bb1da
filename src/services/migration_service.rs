//! Git migration service.
//!
//! Migrations move Not Started -> In Progress -> Completed, with Failed as a
//! terminal state that retry re-enters from. Progress follows the
//! default-progress rule on status changes unless the caller supplies an
//! explicit value, and every write mirrors status and progress onto the
//! linked repository.

use chrono::Utc;
use serde::Deserialize;
use sqlx::{Sqlite, SqlitePool, Transaction};
use utoipa::ToSchema;

use crate::error::{AppError, Result};
use crate::models::migration::{GitMigration, MigrationStatus};
use crate::models::random_color;

const MIGRATION_COLUMNS: &str = "id, name, description, size, status, progress, started_date, \
     completed_date, estimated_time, assigned_to, color_code, repository_id, \
     created_at, updated_at";

/// Filters for listing migrations
#[derive(Debug, Default)]
pub struct MigrationFilter {
    pub status: Option<MigrationStatus>,
    pub assigned_to: Option<String>,
    pub repository_id: Option<i64>,
    pub search: Option<String>,
}

/// Request to create a migration
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMigrationRequest {
    pub name: String,
    pub description: Option<String>,
    pub size: Option<String>,
    pub status: Option<MigrationStatus>,
    pub progress: Option<i64>,
    pub estimated_time: Option<String>,
    pub assigned_to: Option<String>,
    pub color_code: Option<String>,
    pub repository_id: Option<i64>,
}

/// Request to update a migration
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMigrationRequest {
    pub name: String,
    pub description: Option<String>,
    pub size: Option<String>,
    pub estimated_time: Option<String>,
    pub assigned_to: Option<String>,
    pub status: MigrationStatus,
    pub progress: Option<i64>,
}

/// Git migration service
pub struct MigrationService {
    db: SqlitePool,
}

impl MigrationService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// List migrations matching the given filters
    pub async fn list(&self, filter: MigrationFilter) -> Result<Vec<GitMigration>> {
        let migrations = sqlx::query_as::<_, GitMigration>(&format!(
            r#"
            SELECT {MIGRATION_COLUMNS}
            FROM git_migrations
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR assigned_to = ?2)
              AND (?3 IS NULL OR repository_id = ?3)
              AND (?4 IS NULL
                   OR LOWER(name) LIKE '%' || LOWER(?4) || '%'
                   OR LOWER(COALESCE(description, '')) LIKE '%' || LOWER(?4) || '%')
            ORDER BY created_at DESC
            "#
        ))
        .bind(filter.status)
        .bind(filter.assigned_to)
        .bind(filter.repository_id)
        .bind(filter.search)
        .fetch_all(&self.db)
        .await?;

        Ok(migrations)
    }

    /// Get a migration by ID
    pub async fn get(&self, id: i64) -> Result<GitMigration> {
        let migration = sqlx::query_as::<_, GitMigration>(&format!(
            "SELECT {MIGRATION_COLUMNS} FROM git_migrations WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Migration not found with id: {id}")))?;

        Ok(migration)
    }

    /// Create a migration, optionally linked to a repository
    pub async fn create(&self, req: CreateMigrationRequest) -> Result<GitMigration> {
        if req.name.trim().is_empty() {
            return Err(AppError::Validation("name is required".to_string()));
        }

        let status = req.status.unwrap_or(MigrationStatus::NotStarted);
        if status == MigrationStatus::Archived {
            return Err(AppError::Validation(
                "Archived only applies to repositories".to_string(),
            ));
        }
        let progress = match req.progress {
            Some(p) => p.clamp(0, 100),
            None => status.default_progress(0),
        };
        let now = Utc::now();
        let started_date = (status == MigrationStatus::InProgress
            || status == MigrationStatus::Completed)
            .then_some(now);
        let completed_date = (status == MigrationStatus::Completed).then_some(now);
        let color_code = req
            .color_code
            .filter(|s| !s.is_empty())
            .unwrap_or_else(random_color);

        let mut tx = self.db.begin().await?;

        if let Some(repo_id) = req.repository_id {
            let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM repositories WHERE id = ?")
                .bind(repo_id)
                .fetch_one(&mut *tx)
                .await?;
            if exists == 0 {
                return Err(AppError::NotFound(format!(
                    "Repository not found with id: {repo_id}"
                )));
            }
        }

        let id = sqlx::query(
            r#"
            INSERT INTO git_migrations (
                name, description, size, status, progress, started_date, completed_date,
                estimated_time, assigned_to, color_code, repository_id, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&req.name)
        .bind(&req.description)
        .bind(&req.size)
        .bind(status)
        .bind(progress)
        .bind(started_date)
        .bind(completed_date)
        .bind(&req.estimated_time)
        .bind(&req.assigned_to)
        .bind(&color_code)
        .bind(req.repository_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        sync_repository(&mut tx, req.repository_id, status, progress).await?;

        tx.commit().await?;

        self.get(id).await
    }

    /// Update a migration. A status change without explicit progress applies
    /// the default-progress rule; moving to Failed clears the completion date
    /// but keeps the start date. No other transition clears a date.
    pub async fn update(&self, id: i64, req: UpdateMigrationRequest) -> Result<GitMigration> {
        let migration = self.get(id).await?;

        if req.name.trim().is_empty() {
            return Err(AppError::Validation("name is required".to_string()));
        }
        if req.status == MigrationStatus::Archived {
            return Err(AppError::Validation(
                "Archived only applies to repositories".to_string(),
            ));
        }

        let status_changed = req.status != migration.status;
        let progress = match req.progress {
            Some(p) => p.clamp(0, 100),
            None if status_changed => req.status.default_progress(migration.progress),
            None => migration.progress,
        };

        let now = Utc::now();
        let (started_date, completed_date) = if status_changed {
            match req.status {
                MigrationStatus::InProgress => {
                    (migration.started_date.or(Some(now)), migration.completed_date)
                }
                MigrationStatus::Completed => (
                    migration.started_date.or(Some(now)),
                    migration.completed_date.or(Some(now)),
                ),
                MigrationStatus::Failed => (migration.started_date, None),
                MigrationStatus::NotStarted | MigrationStatus::Archived => {
                    (migration.started_date, migration.completed_date)
                }
            }
        } else {
            (migration.started_date, migration.completed_date)
        };

        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            UPDATE git_migrations
            SET name = ?, description = ?, size = ?, status = ?, progress = ?,
                started_date = ?, completed_date = ?, estimated_time = ?,
                assigned_to = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&req.name)
        .bind(&req.description)
        .bind(&req.size)
        .bind(req.status)
        .bind(progress)
        .bind(started_date)
        .bind(completed_date)
        .bind(&req.estimated_time)
        .bind(&req.assigned_to)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sync_repository(&mut tx, migration.repository_id, req.status, progress).await?;

        tx.commit().await?;

        self.get(id).await
    }

    /// Start a migration: In Progress, start date stamped now, zero progress
    /// bumped to 1
    pub async fn start(&self, id: i64) -> Result<GitMigration> {
        let migration = self.get(id).await?;
        let progress = MigrationStatus::InProgress.default_progress(migration.progress);

        self.transition(
            id,
            migration.repository_id,
            MigrationStatus::InProgress,
            progress,
            Some(Utc::now()),
            migration.completed_date,
        )
        .await
    }

    /// Pause a migration back to Not Started, keeping its progress and dates
    pub async fn pause(&self, id: i64) -> Result<GitMigration> {
        let migration = self.get(id).await?;

        self.transition(
            id,
            migration.repository_id,
            MigrationStatus::NotStarted,
            migration.progress,
            migration.started_date,
            migration.completed_date,
        )
        .await
    }

    /// Complete a migration: full progress, completion date set if missing
    pub async fn complete(&self, id: i64) -> Result<GitMigration> {
        let migration = self.get(id).await?;
        let now = Utc::now();

        self.transition(
            id,
            migration.repository_id,
            MigrationStatus::Completed,
            100,
            migration.started_date.or(Some(now)),
            migration.completed_date.or(Some(now)),
        )
        .await
    }

    /// Retry a migration: back to In Progress with progress knocked back by
    /// 10 points, floored at 1
    pub async fn retry(&self, id: i64) -> Result<GitMigration> {
        let migration = self.get(id).await?;
        let progress = (migration.progress - 10).max(1);

        self.transition(
            id,
            migration.repository_id,
            MigrationStatus::InProgress,
            progress,
            Some(Utc::now()),
            None,
        )
        .await
    }

    /// Delete a migration by ID
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM git_migrations WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Migration not found with id: {id}"
            )));
        }

        Ok(())
    }

    async fn transition(
        &self,
        id: i64,
        repository_id: Option<i64>,
        status: MigrationStatus,
        progress: i64,
        started_date: Option<chrono::DateTime<Utc>>,
        completed_date: Option<chrono::DateTime<Utc>>,
    ) -> Result<GitMigration> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            UPDATE git_migrations
            SET status = ?, progress = ?, started_date = ?, completed_date = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status)
        .bind(progress)
        .bind(started_date)
        .bind(completed_date)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sync_repository(&mut tx, repository_id, status, progress).await?;

        tx.commit().await?;

        self.get(id).await
    }
}

/// Mirror a migration's status and progress onto its linked repository, if
/// any.
async fn sync_repository(
    tx: &mut Transaction<'_, Sqlite>,
    repository_id: Option<i64>,
    status: MigrationStatus,
    progress: i64,
) -> Result<()> {
    let Some(repo_id) = repository_id else {
        return Ok(());
    };

    sqlx::query(
        r#"
        UPDATE repositories
        SET migration_status = ?, migration_progress = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(status)
    .bind(progress)
    .bind(Utc::now())
    .bind(repo_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
