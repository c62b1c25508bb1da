//! Git migration lifecycle integration tests.

mod common;

use git_dashboard_backend::models::migration::MigrationStatus;
use git_dashboard_backend::services::migration_service::{
    CreateMigrationRequest, MigrationFilter, MigrationService, UpdateMigrationRequest,
};
use git_dashboard_backend::services::repository_service::RepositoryService;
use git_dashboard_backend::AppError;

fn new_migration(name: &str, repository_id: Option<i64>) -> CreateMigrationRequest {
    CreateMigrationRequest {
        name: name.to_string(),
        description: Some("SVN to Git".to_string()),
        size: Some("4.2 GB".to_string()),
        status: None,
        progress: None,
        estimated_time: Some("2 weeks".to_string()),
        assigned_to: Some("alice".to_string()),
        color_code: None,
        repository_id,
    }
}

fn update_with_status(status: MigrationStatus) -> UpdateMigrationRequest {
    UpdateMigrationRequest {
        name: "legacy-app".to_string(),
        description: None,
        size: None,
        estimated_time: None,
        assigned_to: Some("alice".to_string()),
        status,
        progress: None,
    }
}

#[tokio::test]
async fn new_migration_defaults_to_not_started() {
    let pool = common::test_pool().await;
    let service = MigrationService::new(pool.clone());

    let migration = service.create(new_migration("legacy-app", None)).await.unwrap();

    assert_eq!(migration.status, MigrationStatus::NotStarted);
    assert_eq!(migration.progress, 0);
    assert!(migration.started_date.is_none());
    assert!(migration.completed_date.is_none());
}

#[tokio::test]
async fn start_sets_date_and_bumps_zero_progress() {
    let pool = common::test_pool().await;
    let service = MigrationService::new(pool.clone());
    let migration = service.create(new_migration("legacy-app", None)).await.unwrap();

    let started = service.start(migration.id).await.unwrap();

    assert_eq!(started.status, MigrationStatus::InProgress);
    assert_eq!(started.progress, 1);
    assert!(started.started_date.is_some());
}

#[tokio::test]
async fn status_change_applies_default_progress() {
    let pool = common::test_pool().await;
    let service = MigrationService::new(pool.clone());
    let migration = service.create(new_migration("legacy-app", None)).await.unwrap();

    let updated = service
        .update(migration.id, update_with_status(MigrationStatus::Completed))
        .await
        .unwrap();

    assert_eq!(updated.progress, 100);
    assert!(updated.completed_date.is_some());
}

#[tokio::test]
async fn explicit_progress_wins_over_default() {
    let pool = common::test_pool().await;
    let service = MigrationService::new(pool.clone());
    let migration = service.create(new_migration("legacy-app", None)).await.unwrap();

    let mut req = update_with_status(MigrationStatus::InProgress);
    req.progress = Some(250);
    let updated = service.update(migration.id, req).await.unwrap();

    // Clamped to the valid range.
    assert_eq!(updated.progress, 100);
}

#[tokio::test]
async fn failing_keeps_start_date_and_clears_completion() {
    let pool = common::test_pool().await;
    let service = MigrationService::new(pool.clone());
    let migration = service.create(new_migration("legacy-app", None)).await.unwrap();

    service.start(migration.id).await.unwrap();
    service.complete(migration.id).await.unwrap();

    let failed = service
        .update(migration.id, update_with_status(MigrationStatus::Failed))
        .await
        .unwrap();

    assert_eq!(failed.status, MigrationStatus::Failed);
    assert!(failed.started_date.is_some());
    assert!(failed.completed_date.is_none());
}

#[tokio::test]
async fn retry_knocks_progress_back_with_floor_of_one() {
    let pool = common::test_pool().await;
    let service = MigrationService::new(pool.clone());
    let migration = service.create(new_migration("legacy-app", None)).await.unwrap();

    let mut req = update_with_status(MigrationStatus::Failed);
    req.progress = Some(5);
    service.update(migration.id, req).await.unwrap();

    let retried = service.retry(migration.id).await.unwrap();

    assert_eq!(retried.status, MigrationStatus::InProgress);
    assert_eq!(retried.progress, 1);
    assert!(retried.started_date.is_some());
    assert!(retried.completed_date.is_none());
}

#[tokio::test]
async fn retry_subtracts_ten_from_higher_progress() {
    let pool = common::test_pool().await;
    let service = MigrationService::new(pool.clone());
    let migration = service.create(new_migration("legacy-app", None)).await.unwrap();

    let mut req = update_with_status(MigrationStatus::Failed);
    req.progress = Some(60);
    service.update(migration.id, req).await.unwrap();

    let retried = service.retry(migration.id).await.unwrap();
    assert_eq!(retried.progress, 50);
}

#[tokio::test]
async fn not_started_update_preserves_lifecycle_dates() {
    let pool = common::test_pool().await;
    let service = MigrationService::new(pool.clone());
    let migration = service.create(new_migration("legacy-app", None)).await.unwrap();

    let started = service.start(migration.id).await.unwrap();
    let started_date = started.started_date.expect("started date");

    let reset = service
        .update(migration.id, update_with_status(MigrationStatus::NotStarted))
        .await
        .unwrap();

    assert_eq!(reset.status, MigrationStatus::NotStarted);
    assert_eq!(reset.started_date, Some(started_date));
}

#[tokio::test]
async fn in_progress_update_keeps_completion_date() {
    let pool = common::test_pool().await;
    let service = MigrationService::new(pool.clone());
    let migration = service.create(new_migration("legacy-app", None)).await.unwrap();

    let completed = service.complete(migration.id).await.unwrap();
    let completed_date = completed.completed_date.expect("completed date");

    let mut req = update_with_status(MigrationStatus::InProgress);
    req.progress = Some(50);
    let reopened = service.update(migration.id, req).await.unwrap();

    assert_eq!(reopened.status, MigrationStatus::InProgress);
    assert_eq!(reopened.completed_date, Some(completed_date));
}

#[tokio::test]
async fn start_restamps_started_date() {
    let pool = common::test_pool().await;
    let service = MigrationService::new(pool.clone());
    let migration = service.create(new_migration("legacy-app", None)).await.unwrap();

    sqlx::query("UPDATE git_migrations SET started_date = '2020-01-01T00:00:00+00:00' WHERE id = ?")
        .bind(migration.id)
        .execute(&pool)
        .await
        .unwrap();

    let started = service.start(migration.id).await.unwrap();
    let stamped = started.started_date.expect("started date");
    assert!(stamped.timestamp() > 1_600_000_000);
}

#[tokio::test]
async fn archived_is_rejected_for_migration_records() {
    let pool = common::test_pool().await;
    let service = MigrationService::new(pool.clone());
    let migration = service.create(new_migration("legacy-app", None)).await.unwrap();

    let err = service
        .update(migration.id, update_with_status(MigrationStatus::Archived))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let mut req = new_migration("parked", None);
    req.status = Some(MigrationStatus::Archived);
    let err = service.create(req).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn pause_returns_to_not_started_keeping_progress() {
    let pool = common::test_pool().await;
    let service = MigrationService::new(pool.clone());
    let migration = service.create(new_migration("legacy-app", None)).await.unwrap();

    let mut req = update_with_status(MigrationStatus::InProgress);
    req.progress = Some(40);
    service.update(migration.id, req).await.unwrap();

    let paused = service.pause(migration.id).await.unwrap();

    assert_eq!(paused.status, MigrationStatus::NotStarted);
    assert_eq!(paused.progress, 40);
}

#[tokio::test]
async fn lifecycle_mirrors_onto_linked_repository() {
    let pool = common::test_pool().await;
    let repo = common::seed_repository(&pool, "legacy-app").await;
    let service = MigrationService::new(pool.clone());
    let repos = RepositoryService::new(pool.clone());

    let migration = service
        .create(new_migration("legacy-app", Some(repo.id)))
        .await
        .unwrap();

    service.start(migration.id).await.unwrap();
    let linked = repos.get(repo.id).await.unwrap();
    assert_eq!(linked.migration_status, MigrationStatus::InProgress);
    assert_eq!(linked.migration_progress, 1);

    service.complete(migration.id).await.unwrap();
    let linked = repos.get(repo.id).await.unwrap();
    assert_eq!(linked.migration_status, MigrationStatus::Completed);
    assert_eq!(linked.migration_progress, 100);
}

#[tokio::test]
async fn search_is_case_insensitive() {
    let pool = common::test_pool().await;
    let service = MigrationService::new(pool.clone());
    service.create(new_migration("Legacy-App", None)).await.unwrap();
    service.create(new_migration("other", None)).await.unwrap();

    let found = service
        .list(MigrationFilter {
            search: Some("LEGACY".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Legacy-App");
}
