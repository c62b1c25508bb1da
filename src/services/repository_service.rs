//! Repository service.
//!
//! Handles repository CRUD, unique-name enforcement, member management
//! (replace-all semantics), and the migration-status patch operation.

use chrono::Utc;
use serde::Deserialize;
use sqlx::{Sqlite, SqlitePool, Transaction};
use utoipa::ToSchema;

use crate::error::{AppError, Result};
use crate::models::backup::BackupStatus;
use crate::models::migration::MigrationStatus;
use crate::models::random_color;
use crate::models::repository::Repository;
use crate::models::user::User;

const REPOSITORY_COLUMNS: &str = "id, name, description, size, backup_status, migration_status, \
     migration_progress, color_code, last_commit, last_commit_by, created_date, \
     created_at, updated_at";

/// Filters for listing repositories
#[derive(Debug, Default)]
pub struct RepositoryFilter {
    pub migration_status: Option<MigrationStatus>,
    pub backup_status: Option<BackupStatus>,
    pub member: Option<i64>,
    pub search: Option<String>,
}

/// Request to create a repository
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRepositoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub size: Option<String>,
    pub color_code: Option<String>,
    pub member_ids: Option<Vec<i64>>,
}

/// Request to update a repository
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRepositoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub size: Option<String>,
    pub backup_status: Option<BackupStatus>,
    pub migration_status: Option<MigrationStatus>,
    pub migration_progress: Option<i64>,
    pub last_commit_by: Option<String>,
    pub member_ids: Option<Vec<i64>>,
}

/// Repository service
pub struct RepositoryService {
    db: SqlitePool,
}

impl RepositoryService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// List repositories matching the given filters
    pub async fn list(&self, filter: RepositoryFilter) -> Result<Vec<Repository>> {
        let repos = sqlx::query_as::<_, Repository>(&format!(
            r#"
            SELECT {REPOSITORY_COLUMNS}
            FROM repositories
            WHERE (?1 IS NULL OR migration_status = ?1)
              AND (?2 IS NULL OR backup_status = ?2)
              AND (?3 IS NULL OR EXISTS (
                    SELECT 1 FROM repository_members rm
                    WHERE rm.repository_id = repositories.id AND rm.user_id = ?3))
              AND (?4 IS NULL
                   OR LOWER(name) LIKE '%' || LOWER(?4) || '%'
                   OR LOWER(COALESCE(description, '')) LIKE '%' || LOWER(?4) || '%')
            ORDER BY name
            "#
        ))
        .bind(filter.migration_status)
        .bind(filter.backup_status)
        .bind(filter.member)
        .bind(filter.search)
        .fetch_all(&self.db)
        .await?;

        Ok(repos)
    }

    /// Get a repository by ID
    pub async fn get(&self, id: i64) -> Result<Repository> {
        let repo = sqlx::query_as::<_, Repository>(&format!(
            "SELECT {REPOSITORY_COLUMNS} FROM repositories WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Repository not found with id: {id}")))?;

        Ok(repo)
    }

    /// Get a repository by its unique name
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Repository>> {
        let repo = sqlx::query_as::<_, Repository>(&format!(
            "SELECT {REPOSITORY_COLUMNS} FROM repositories WHERE name = ?"
        ))
        .bind(name)
        .fetch_optional(&self.db)
        .await?;

        Ok(repo)
    }

    /// List the member users of a repository
    pub async fn members(&self, id: i64) -> Result<Vec<User>> {
        self.get(id).await?;

        let members = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.username, u.email, u.full_name, u.role, u.status, u.group_name,
                   u.initials, u.color_code, u.last_activity, u.created_at, u.updated_at
            FROM users u
            JOIN repository_members rm ON rm.user_id = u.id
            WHERE rm.repository_id = ?
            ORDER BY u.username
            "#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(members)
    }

    /// Create a repository with an optional initial member set
    pub async fn create(&self, req: CreateRepositoryRequest) -> Result<Repository> {
        if req.name.trim().is_empty() {
            return Err(AppError::Validation("name is required".to_string()));
        }
        if self.name_taken(&req.name, None).await? {
            return Err(AppError::Conflict(format!(
                "Repository name already exists: {}",
                req.name
            )));
        }

        let color_code = req
            .color_code
            .filter(|s| !s.is_empty())
            .unwrap_or_else(random_color);
        let now = Utc::now();

        let mut tx = self.db.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO repositories (
                name, description, size, migration_status, migration_progress,
                color_code, last_commit, created_date, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, 0, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&req.name)
        .bind(&req.description)
        .bind(&req.size)
        .bind(MigrationStatus::NotStarted)
        .bind(&color_code)
        .bind(now)
        .bind(now)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        if let Some(member_ids) = req.member_ids {
            replace_members_tx(&mut tx, id, &member_ids).await?;
        }

        tx.commit().await?;

        self.get(id).await
    }

    /// Update a repository, enforcing name uniqueness on rename
    pub async fn update(&self, id: i64, req: UpdateRepositoryRequest) -> Result<Repository> {
        let repo = self.get(id).await?;

        if req.name.trim().is_empty() {
            return Err(AppError::Validation("name is required".to_string()));
        }
        if repo.name != req.name && self.name_taken(&req.name, Some(id)).await? {
            return Err(AppError::Conflict(format!(
                "Repository name already exists: {}",
                req.name
            )));
        }

        // Migration fields keep their current values unless supplied; a status
        // change without explicit progress gets the default-progress rule.
        let migration_status = req.migration_status.unwrap_or(repo.migration_status);
        let migration_progress = match req.migration_progress {
            Some(p) => p.clamp(0, 100),
            None if req.migration_status.is_some() => {
                migration_status.default_progress(repo.migration_progress)
            }
            None => repo.migration_progress,
        };

        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            UPDATE repositories
            SET name = ?, description = ?, size = ?, backup_status = ?,
                migration_status = ?, migration_progress = ?,
                last_commit = ?, last_commit_by = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&req.name)
        .bind(&req.description)
        .bind(&req.size)
        .bind(req.backup_status.or(repo.backup_status))
        .bind(migration_status)
        .bind(migration_progress)
        .bind(now)
        .bind(req.last_commit_by.or(repo.last_commit_by))
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if let Some(member_ids) = req.member_ids {
            replace_members_tx(&mut tx, id, &member_ids).await?;
        }

        tx.commit().await?;

        self.get(id).await
    }

    /// Replace the full member set of a repository
    pub async fn replace_members(&self, id: i64, member_ids: &[i64]) -> Result<Vec<User>> {
        self.get(id).await?;

        let mut tx = self.db.begin().await?;
        replace_members_tx(&mut tx, id, member_ids).await?;
        tx.commit().await?;

        self.members(id).await
    }

    /// Patch the migration status, applying the default-progress rule when no
    /// explicit progress is given
    pub async fn update_migration_status(
        &self,
        id: i64,
        status: MigrationStatus,
        progress: Option<i64>,
    ) -> Result<Repository> {
        let repo = self.get(id).await?;

        let progress = match progress {
            Some(p) => p.clamp(0, 100),
            None => status.default_progress(repo.migration_progress),
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
        .bind(id)
        .execute(&self.db)
        .await?;

        self.get(id).await
    }

    /// Delete a repository by ID
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM repositories WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Repository not found with id: {id}"
            )));
        }

        Ok(())
    }

    async fn name_taken(&self, name: &str, exclude_id: Option<i64>) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM repositories WHERE name = ?1 AND (?2 IS NULL OR id <> ?2)",
        )
        .bind(name)
        .bind(exclude_id)
        .fetch_one(&self.db)
        .await?;

        Ok(count > 0)
    }
}

/// Replace a repository's member rows inside an open transaction, verifying
/// every user id first.
async fn replace_members_tx(
    tx: &mut Transaction<'_, Sqlite>,
    repository_id: i64,
    member_ids: &[i64],
) -> Result<()> {
    for user_id in member_ids {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_one(&mut **tx)
            .await?;
        if exists == 0 {
            return Err(AppError::NotFound(format!(
                "User not found with id: {user_id}"
            )));
        }
    }

    sqlx::query("DELETE FROM repository_members WHERE repository_id = ?")
        .bind(repository_id)
        .execute(&mut **tx)
        .await?;

    for user_id in member_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO repository_members (repository_id, user_id) VALUES (?, ?)",
        )
        .bind(repository_id)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}
