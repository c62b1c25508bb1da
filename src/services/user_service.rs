//! User service.
//!
//! Handles user CRUD, uniqueness enforcement, and the derived display
//! fields (initials, avatar color).

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::error::{AppError, Result};
use crate::models::random_color;
use crate::models::user::{User, UserRole, UserStatus};

const USER_COLUMNS: &str = "id, username, email, full_name, role, status, group_name, \
     initials, color_code, last_activity, created_at, updated_at";

/// Filters for listing users
#[derive(Debug, Default)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub group: Option<String>,
    pub search: Option<String>,
}

/// Request to create a user
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub status: UserStatus,
    #[serde(rename = "group")]
    pub group_name: Option<String>,
    pub initials: Option<String>,
    pub color_code: Option<String>,
}

/// Request to update a user
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub status: UserStatus,
    #[serde(rename = "group")]
    pub group_name: Option<String>,
}

/// User service
pub struct UserService {
    db: SqlitePool,
}

impl UserService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// List users matching the given filters
    pub async fn list(&self, filter: UserFilter) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE (?1 IS NULL OR role = ?1)
              AND (?2 IS NULL OR status = ?2)
              AND (?3 IS NULL OR group_name = ?3)
              AND (?4 IS NULL
                   OR LOWER(username) LIKE '%' || LOWER(?4) || '%'
                   OR LOWER(full_name) LIKE '%' || LOWER(?4) || '%'
                   OR LOWER(email) LIKE '%' || LOWER(?4) || '%')
            ORDER BY username
            "#
        ))
        .bind(filter.role)
        .bind(filter.status)
        .bind(filter.group)
        .bind(filter.search)
        .fetch_all(&self.db)
        .await?;

        Ok(users)
    }

    /// Get a user by ID
    pub async fn get(&self, id: i64) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User not found with id: {id}")))?;

        Ok(user)
    }

    /// Get a user by username
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// Create a user, deriving initials and avatar color when absent
    pub async fn create(&self, req: CreateUserRequest) -> Result<User> {
        if req.username.trim().is_empty()
            || req.email.trim().is_empty()
            || req.full_name.trim().is_empty()
        {
            return Err(AppError::Validation(
                "username, email and full_name are required".to_string(),
            ));
        }

        if self.username_taken(&req.username, None).await? {
            return Err(AppError::Conflict(format!(
                "Username already exists: {}",
                req.username
            )));
        }
        if self.email_taken(&req.email, None).await? {
            return Err(AppError::Conflict(format!(
                "Email already exists: {}",
                req.email
            )));
        }

        let initials = req
            .initials
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| User::derive_initials(&req.full_name));
        let color_code = req
            .color_code
            .filter(|s| !s.is_empty())
            .unwrap_or_else(random_color);
        let now = Utc::now();

        let id = sqlx::query(
            r#"
            INSERT INTO users (
                username, email, full_name, role, status, group_name,
                initials, color_code, last_activity, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&req.username)
        .bind(&req.email)
        .bind(&req.full_name)
        .bind(req.role)
        .bind(req.status)
        .bind(req.group_name.unwrap_or_default())
        .bind(&initials)
        .bind(&color_code)
        .bind(now)
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await?
        .last_insert_rowid();

        self.get(id).await
    }

    /// Update a user's profile, re-checking uniqueness on changed fields
    pub async fn update(&self, id: i64, req: UpdateUserRequest) -> Result<User> {
        let user = self.get(id).await?;

        if user.username != req.username && self.username_taken(&req.username, Some(id)).await? {
            return Err(AppError::Conflict(format!(
                "Username already exists: {}",
                req.username
            )));
        }
        if user.email != req.email && self.email_taken(&req.email, Some(id)).await? {
            return Err(AppError::Conflict(format!(
                "Email already exists: {}",
                req.email
            )));
        }

        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE users
            SET username = ?, email = ?, full_name = ?, role = ?, status = ?,
                group_name = ?, last_activity = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&req.username)
        .bind(&req.email)
        .bind(&req.full_name)
        .bind(req.role)
        .bind(req.status)
        .bind(req.group_name.unwrap_or(user.group_name))
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.db)
        .await?;

        self.get(id).await
    }

    /// Update only a user's status, refreshing the activity timestamp
    pub async fn update_status(&self, id: i64, status: UserStatus) -> Result<User> {
        self.get(id).await?;

        let now = Utc::now();
        sqlx::query("UPDATE users SET status = ?, last_activity = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(now)
            .bind(now)
            .bind(id)
            .execute(&self.db)
            .await?;

        self.get(id).await
    }

    /// Delete a user by ID
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User not found with id: {id}")));
        }

        Ok(())
    }

    async fn username_taken(&self, username: &str, exclude_id: Option<i64>) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE username = ?1 AND (?2 IS NULL OR id <> ?2)",
        )
        .bind(username)
        .bind(exclude_id)
        .fetch_one(&self.db)
        .await?;

        Ok(count > 0)
    }

    async fn email_taken(&self, email: &str, exclude_id: Option<i64>) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE email = ?1 AND (?2 IS NULL OR id <> ?2)",
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.db)
        .await?;

        Ok(count > 0)
    }
}
