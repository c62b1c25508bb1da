//! Backup lifecycle integration tests: deferred completion, retry rules and
//! the startup sweep.

mod common;

use std::time::Duration;

use git_dashboard_backend::models::backup::{BackupStatus, BackupType};
use git_dashboard_backend::services::backup_service::{BackupService, CreateBackupRequest};
use git_dashboard_backend::services::backup_worker::BackupWorker;
use git_dashboard_backend::services::repository_service::RepositoryService;
use git_dashboard_backend::AppError;

fn full_backup_request(repository_ids: Option<Vec<i64>>) -> CreateBackupRequest {
    CreateBackupRequest {
        backup_id: None,
        backup_type: BackupType::Full,
        initiated_by: Some("admin".to_string()),
        notes: None,
        repository_ids,
    }
}

/// Poll until the backup leaves "In Progress" or the deadline passes.
async fn wait_for_settled(service: &BackupService, id: i64) -> BackupStatus {
    for _ in 0..100 {
        let backup = service.get(id).await.expect("backup fetch");
        if backup.status != BackupStatus::InProgress {
            return backup.status;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    BackupStatus::InProgress
}

#[tokio::test]
async fn created_backup_starts_in_progress() {
    let pool = common::test_pool().await;
    let repo = common::seed_repository(&pool, "core").await;
    let jobs = BackupWorker::spawn(pool.clone(), Duration::from_secs(60));
    let service = BackupService::new(pool.clone(), jobs);

    let backup = service
        .create(full_backup_request(Some(vec![repo.id])))
        .await
        .unwrap();

    assert_eq!(backup.status, BackupStatus::InProgress);
    assert_eq!(backup.duration.as_deref(), Some("0m"));
    assert_eq!(backup.logs.as_deref(), Some("Backup initiated..."));
    assert!(backup.backup_id.starts_with("BKP-"));

    let repo = RepositoryService::new(pool.clone()).get(repo.id).await.unwrap();
    assert_eq!(repo.backup_status, Some(BackupStatus::InProgress));
}

#[tokio::test]
async fn worker_completes_backup_with_full_details() {
    let pool = common::test_pool().await;
    let repo = common::seed_repository(&pool, "core").await;
    let jobs = BackupWorker::spawn(pool.clone(), Duration::from_millis(50));
    let service = BackupService::new(pool.clone(), jobs);

    let backup = service
        .create(full_backup_request(Some(vec![repo.id])))
        .await
        .unwrap();

    assert_eq!(wait_for_settled(&service, backup.id).await, BackupStatus::Complete);

    let backup = service.get(backup.id).await.unwrap();
    assert_eq!(backup.duration.as_deref(), Some("1h 05m"));
    assert_eq!(backup.size.as_deref(), Some("15.8 GB"));
    assert_eq!(
        backup.logs.as_deref(),
        Some("Backup completed successfully with no errors.")
    );

    let repo = RepositoryService::new(pool.clone()).get(repo.id).await.unwrap();
    assert_eq!(repo.backup_status, Some(BackupStatus::Complete));
}

#[tokio::test]
async fn empty_repository_list_covers_all_repositories() {
    let pool = common::test_pool().await;
    let first = common::seed_repository(&pool, "alpha").await;
    let second = common::seed_repository(&pool, "beta").await;
    let jobs = BackupWorker::spawn(pool.clone(), Duration::from_secs(60));
    let service = BackupService::new(pool.clone(), jobs);

    let backup = service.create(full_backup_request(None)).await.unwrap();

    let ids = service.repository_ids(backup.id).await.unwrap();
    assert_eq!(ids, vec![first.id, second.id]);
}

#[tokio::test]
async fn backup_of_unknown_repository_is_rejected() {
    let pool = common::test_pool().await;
    let jobs = BackupWorker::spawn(pool.clone(), Duration::from_secs(60));
    let service = BackupService::new(pool.clone(), jobs);

    let err = service
        .create(full_backup_request(Some(vec![999])))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn only_failed_backups_can_be_retried() {
    let pool = common::test_pool().await;
    common::seed_repository(&pool, "core").await;
    let jobs = BackupWorker::spawn(pool.clone(), Duration::from_secs(60));
    let service = BackupService::new(pool.clone(), jobs);

    let backup = service.create(full_backup_request(None)).await.unwrap();

    let err = service.retry(backup.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
}

#[tokio::test]
async fn retried_failed_backup_completes_again() {
    let pool = common::test_pool().await;
    let repo = common::seed_repository(&pool, "core").await;
    let jobs = BackupWorker::spawn(pool.clone(), Duration::from_millis(50));
    let service = BackupService::new(pool.clone(), jobs);

    let backup = service
        .create(full_backup_request(Some(vec![repo.id])))
        .await
        .unwrap();
    assert_eq!(wait_for_settled(&service, backup.id).await, BackupStatus::Complete);

    common::mark_backup_failed(&pool, backup.id).await;

    let retried = service.retry(backup.id).await.unwrap();
    assert_eq!(retried.status, BackupStatus::InProgress);
    assert_eq!(retried.logs.as_deref(), Some("Retry initiated..."));
    // The previous run's details stay visible while the retry runs.
    assert_eq!(retried.size.as_deref(), Some("15.8 GB"));
    assert_eq!(retried.duration.as_deref(), Some("1h 05m"));

    assert_eq!(wait_for_settled(&service, backup.id).await, BackupStatus::Complete);
}

#[tokio::test]
async fn fail_marks_backup_and_repositories_failed() {
    let pool = common::test_pool().await;
    let repo = common::seed_repository(&pool, "core").await;
    let jobs = BackupWorker::spawn(pool.clone(), Duration::from_secs(60));
    let service = BackupService::new(pool.clone(), jobs);

    let backup = service
        .create(full_backup_request(Some(vec![repo.id])))
        .await
        .unwrap();

    BackupWorker::fail(&pool, backup.id, "disk full").await.unwrap();

    let backup = service.get(backup.id).await.unwrap();
    assert_eq!(backup.status, BackupStatus::Failed);
    assert_eq!(backup.logs.as_deref(), Some("Backup failed: disk full"));

    let repo = RepositoryService::new(pool.clone()).get(repo.id).await.unwrap();
    assert_eq!(repo.backup_status, Some(BackupStatus::Failed));
}

#[tokio::test]
async fn fail_on_closed_pool_errors_instead_of_panicking() {
    let pool = common::test_pool().await;
    pool.close().await;

    // The run loop logs this error; it must surface as Err, never a panic.
    let result = BackupWorker::fail(&pool, 1, "disk full").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn complete_skips_backups_no_longer_in_progress() {
    let pool = common::test_pool().await;
    let repo = common::seed_repository(&pool, "core").await;
    let jobs = BackupWorker::spawn(pool.clone(), Duration::from_secs(60));
    let service = BackupService::new(pool.clone(), jobs);

    let backup = service
        .create(full_backup_request(Some(vec![repo.id])))
        .await
        .unwrap();
    common::mark_backup_failed(&pool, backup.id).await;

    BackupWorker::complete(&pool, backup.id).await.unwrap();

    let backup = service.get(backup.id).await.unwrap();
    assert_eq!(backup.status, BackupStatus::Failed);

    // A deleted backup is skipped the same way.
    BackupWorker::complete(&pool, 9999).await.unwrap();
}

#[tokio::test]
async fn statistics_sum_completed_storage() {
    let pool = common::test_pool().await;
    common::seed_repository(&pool, "core").await;
    let jobs = BackupWorker::spawn(pool.clone(), Duration::from_millis(50));
    let service = BackupService::new(pool.clone(), jobs);

    let full = service.create(full_backup_request(None)).await.unwrap();
    let delta = service
        .create(CreateBackupRequest {
            backup_id: None,
            backup_type: BackupType::Delta,
            initiated_by: None,
            notes: None,
            repository_ids: None,
        })
        .await
        .unwrap();

    assert_eq!(wait_for_settled(&service, full.id).await, BackupStatus::Complete);
    assert_eq!(wait_for_settled(&service, delta.id).await, BackupStatus::Complete);

    let stats = service.statistics().await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.completed, 2);
    assert_eq!(stats.failed, 0);
    // 15.8 + 1.2
    assert_eq!(stats.total_storage_gb, 17.0);

    let last_full = service.last_full().await.unwrap().expect("last full");
    assert_eq!(last_full.id, full.id);
}

#[tokio::test]
async fn startup_sweep_fails_interrupted_backups() {
    let pool = common::test_pool().await;
    let repo = common::seed_repository(&pool, "core").await;
    let jobs = BackupWorker::spawn(pool.clone(), Duration::from_secs(60));
    let service = BackupService::new(pool.clone(), jobs);

    let backup = service
        .create(full_backup_request(Some(vec![repo.id])))
        .await
        .unwrap();

    let swept = BackupWorker::sweep_interrupted(&pool).await.unwrap();
    assert_eq!(swept, 1);

    let backup = service.get(backup.id).await.unwrap();
    assert_eq!(backup.status, BackupStatus::Failed);
    assert_eq!(
        backup.logs.as_deref(),
        Some("Backup failed: Backup interrupted by server restart")
    );

    let repo = RepositoryService::new(pool.clone()).get(repo.id).await.unwrap();
    assert_eq!(repo.backup_status, Some(BackupStatus::Failed));
}
