//! Backup model.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::EnumIter;
use utoipa::ToSchema;

/// Backup type enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, EnumIter, ToSchema,
)]
pub enum BackupType {
    Full,
    Delta,
}

impl std::fmt::Display for BackupType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackupType::Full => write!(f, "Full"),
            BackupType::Delta => write!(f, "Delta"),
        }
    }
}

/// Backup status enum.
///
/// Also used for the per-repository `backup_status` field, which mirrors the
/// status of the last backup covering that repository.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, EnumIter, ToSchema,
)]
pub enum BackupStatus {
    #[serde(rename = "In Progress")]
    #[sqlx(rename = "In Progress")]
    InProgress,
    Complete,
    Failed,
}

impl std::fmt::Display for BackupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackupStatus::InProgress => write!(f, "In Progress"),
            BackupStatus::Complete => write!(f, "Complete"),
            BackupStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Backup entity.
///
/// A backup covers a set of repositories (empty meaning "all repositories"
/// at creation time) and carries the free-form size/duration labels shown on
/// the dashboard.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Backup {
    pub id: i64,
    pub backup_id: String,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub backup_type: BackupType,
    pub status: BackupStatus,
    pub size: Option<String>,
    pub duration: Option<String>,
    pub initiated_by: Option<String>,
    pub notes: Option<String>,
    pub logs: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Generate a backup identifier in the BKP-#### format.
pub fn generate_backup_id() -> String {
    let mut rng = rand::rng();
    format!("BKP-{}", 2000 + rng.random_range(0..1000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_backup_id_format() {
        let id = generate_backup_id();
        assert!(id.starts_with("BKP-"));
        let num: i64 = id[4..].parse().unwrap();
        assert!((2000..3000).contains(&num));
    }

    #[test]
    fn backup_status_serializes_with_spaces() {
        assert_eq!(
            serde_json::to_string(&BackupStatus::InProgress).unwrap(),
            "\"In Progress\""
        );
        assert_eq!(
            serde_json::to_string(&BackupStatus::Complete).unwrap(),
            "\"Complete\""
        );
    }
}
