//! Shared test fixtures.

#![allow(dead_code)]

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use git_dashboard_backend::models::user::{User, UserRole, UserStatus};
use git_dashboard_backend::models::repository::Repository;
use git_dashboard_backend::services::repository_service::{
    CreateRepositoryRequest, RepositoryService,
};
use git_dashboard_backend::services::user_service::{CreateUserRequest, UserService};

/// Fresh in-memory database with the schema applied. A single connection
/// keeps every handle on the same in-memory store.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");

    pool
}

pub async fn seed_user(pool: &SqlitePool, username: &str, full_name: &str) -> User {
    UserService::new(pool.clone())
        .create(CreateUserRequest {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            full_name: full_name.to_string(),
            role: UserRole::Developer,
            status: UserStatus::Active,
            group_name: Some("Engineering".to_string()),
            initials: None,
            color_code: None,
        })
        .await
        .expect("seed user")
}

pub async fn seed_repository(pool: &SqlitePool, name: &str) -> Repository {
    RepositoryService::new(pool.clone())
        .create(CreateRepositoryRequest {
            name: name.to_string(),
            description: Some(format!("{name} repository")),
            size: Some("2.5 GB".to_string()),
            color_code: None,
            member_ids: None,
        })
        .await
        .expect("seed repository")
}

/// Force a backup into the Failed state directly.
pub async fn mark_backup_failed(pool: &SqlitePool, backup_id: i64) {
    sqlx::query("UPDATE backups SET status = 'Failed', logs = 'Backup failed: disk full' WHERE id = ?")
        .bind(backup_id)
        .execute(pool)
        .await
        .expect("mark backup failed");
}
