//! User and repository integration tests.

mod common;

use git_dashboard_backend::models::migration::MigrationStatus;
use git_dashboard_backend::models::user::{UserRole, UserStatus};
use git_dashboard_backend::services::repository_service::{
    RepositoryFilter, RepositoryService, UpdateRepositoryRequest,
};
use git_dashboard_backend::services::user_service::{CreateUserRequest, UserFilter, UserService};
use git_dashboard_backend::AppError;

#[tokio::test]
async fn created_user_gets_derived_initials_and_palette_color() {
    let pool = common::test_pool().await;

    let user = common::seed_user(&pool, "jdoe", "John Doe").await;

    assert_eq!(user.initials, "JD");
    assert!(user.color_code.starts_with("bg-"));
    assert_eq!(user.role, UserRole::Developer);
}

#[tokio::test]
async fn duplicate_username_and_email_conflict() {
    let pool = common::test_pool().await;
    let service = UserService::new(pool.clone());
    common::seed_user(&pool, "jdoe", "John Doe").await;

    let err = service
        .create(CreateUserRequest {
            username: "jdoe".to_string(),
            email: "other@example.com".to_string(),
            full_name: "Jane Doe".to_string(),
            role: UserRole::Admin,
            status: UserStatus::Active,
            group_name: None,
            initials: None,
            color_code: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = service
        .create(CreateUserRequest {
            username: "jane".to_string(),
            email: "jdoe@example.com".to_string(),
            full_name: "Jane Doe".to_string(),
            role: UserRole::Admin,
            status: UserStatus::Active,
            group_name: None,
            initials: None,
            color_code: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn user_search_matches_name_fragments() {
    let pool = common::test_pool().await;
    let service = UserService::new(pool.clone());
    common::seed_user(&pool, "jdoe", "John Doe").await;
    common::seed_user(&pool, "asmith", "Alice Smith").await;

    let found = service
        .list(UserFilter {
            search: Some("doe".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].username, "jdoe");
}

#[tokio::test]
async fn repository_rename_to_taken_name_conflicts() {
    let pool = common::test_pool().await;
    let service = RepositoryService::new(pool.clone());
    common::seed_repository(&pool, "alpha").await;
    let beta = common::seed_repository(&pool, "beta").await;

    let err = service
        .update(
            beta.id,
            UpdateRepositoryRequest {
                name: "alpha".to_string(),
                description: None,
                size: None,
                backup_status: None,
                migration_status: None,
                migration_progress: None,
                last_commit_by: None,
                member_ids: None,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn member_replacement_is_replace_all() {
    let pool = common::test_pool().await;
    let service = RepositoryService::new(pool.clone());
    let repo = common::seed_repository(&pool, "alpha").await;
    let first = common::seed_user(&pool, "jdoe", "John Doe").await;
    let second = common::seed_user(&pool, "asmith", "Alice Smith").await;

    service.replace_members(repo.id, &[first.id]).await.unwrap();
    let members = service.replace_members(repo.id, &[second.id]).await.unwrap();

    assert_eq!(members.len(), 1);
    assert_eq!(members[0].username, "asmith");
}

#[tokio::test]
async fn member_replacement_rejects_unknown_user() {
    let pool = common::test_pool().await;
    let service = RepositoryService::new(pool.clone());
    let repo = common::seed_repository(&pool, "alpha").await;

    let err = service.replace_members(repo.id, &[999]).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn migration_status_patch_applies_default_progress() {
    let pool = common::test_pool().await;
    let service = RepositoryService::new(pool.clone());
    let repo = common::seed_repository(&pool, "alpha").await;

    let updated = service
        .update_migration_status(repo.id, MigrationStatus::InProgress, None)
        .await
        .unwrap();
    assert_eq!(updated.migration_progress, 1);

    let updated = service
        .update_migration_status(repo.id, MigrationStatus::Completed, None)
        .await
        .unwrap();
    assert_eq!(updated.migration_progress, 100);

    let updated = service
        .update_migration_status(repo.id, MigrationStatus::InProgress, Some(45))
        .await
        .unwrap();
    assert_eq!(updated.migration_progress, 45);
}

#[tokio::test]
async fn member_filter_limits_repository_list() {
    let pool = common::test_pool().await;
    let service = RepositoryService::new(pool.clone());
    let alpha = common::seed_repository(&pool, "alpha").await;
    common::seed_repository(&pool, "beta").await;
    let user = common::seed_user(&pool, "jdoe", "John Doe").await;
    service.replace_members(alpha.id, &[user.id]).await.unwrap();

    let found = service
        .list(RepositoryFilter {
            member: Some(user.id),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "alpha");
}

#[tokio::test]
async fn deleting_missing_user_is_not_found() {
    let pool = common::test_pool().await;
    let err = UserService::new(pool.clone()).delete(42).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
