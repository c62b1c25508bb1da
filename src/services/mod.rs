//! Service layer - business logic over the entity store.

pub mod backup_service;
pub mod backup_worker;
pub mod dashboard_service;
pub mod migration_service;
pub mod repository_service;
pub mod schedule_service;
pub mod superset_client;
pub mod user_service;
