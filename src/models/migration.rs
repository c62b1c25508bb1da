//! Git migration model and the progress-by-status rule.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::EnumIter;
use utoipa::ToSchema;

/// Migration status enum.
///
/// `Archived` only ever appears on repositories (a repository can be parked
/// after migration); migration records themselves move between the other
/// four states.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, EnumIter, ToSchema,
)]
pub enum MigrationStatus {
    #[serde(rename = "Not Started")]
    #[sqlx(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    #[sqlx(rename = "In Progress")]
    InProgress,
    Completed,
    Archived,
    Failed,
}

impl std::fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationStatus::NotStarted => write!(f, "Not Started"),
            MigrationStatus::InProgress => write!(f, "In Progress"),
            MigrationStatus::Completed => write!(f, "Completed"),
            MigrationStatus::Archived => write!(f, "Archived"),
            MigrationStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl MigrationStatus {
    /// Default progress for a status when no explicit progress accompanies a
    /// change: Completed is 100, Not Started is 0, and entering In Progress
    /// bumps a zero progress to 1 so the bar registers movement. Other
    /// statuses keep the current value.
    pub fn default_progress(self, current: i64) -> i64 {
        match self {
            MigrationStatus::Completed => 100,
            MigrationStatus::NotStarted => 0,
            MigrationStatus::InProgress => {
                if current == 0 {
                    1
                } else {
                    current
                }
            }
            MigrationStatus::Archived | MigrationStatus::Failed => current,
        }
    }
}

/// Git migration entity.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct GitMigration {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub size: Option<String>,
    pub status: MigrationStatus,
    pub progress: i64,
    pub started_date: Option<DateTime<Utc>>,
    pub completed_date: Option<DateTime<Utc>>,
    pub estimated_time: Option<String>,
    pub assigned_to: Option<String>,
    pub color_code: String,
    pub repository_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_defaults_to_full_progress() {
        assert_eq!(MigrationStatus::Completed.default_progress(40), 100);
    }

    #[test]
    fn not_started_resets_progress() {
        assert_eq!(MigrationStatus::NotStarted.default_progress(40), 0);
    }

    #[test]
    fn in_progress_bumps_zero_only() {
        assert_eq!(MigrationStatus::InProgress.default_progress(0), 1);
        assert_eq!(MigrationStatus::InProgress.default_progress(55), 55);
    }

    #[test]
    fn failed_keeps_current_progress() {
        assert_eq!(MigrationStatus::Failed.default_progress(73), 73);
    }

    #[test]
    fn status_serializes_with_spaces() {
        assert_eq!(
            serde_json::to_string(&MigrationStatus::NotStarted).unwrap(),
            "\"Not Started\""
        );
    }
}
