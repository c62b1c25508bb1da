//! Backup schedule model.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::EnumIter;
use utoipa::ToSchema;

use super::backup::BackupType;

/// Schedule status enum. Toggled, not state-machine driven.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, EnumIter, ToSchema,
)]
pub enum ScheduleStatus {
    Active,
    Inactive,
}

impl std::fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleStatus::Active => write!(f, "Active"),
            ScheduleStatus::Inactive => write!(f, "Inactive"),
        }
    }
}

impl ScheduleStatus {
    /// The other state of the toggle.
    pub fn toggled(self) -> Self {
        match self {
            ScheduleStatus::Active => ScheduleStatus::Inactive,
            ScheduleStatus::Inactive => ScheduleStatus::Active,
        }
    }
}

/// Backup schedule entity.
///
/// `time` is stored in a sortable canonical form (e.g. "02:00"); the
/// next-scheduled lookup orders lexicographically on it.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct BackupSchedule {
    pub id: i64,
    pub schedule_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub schedule_type: BackupType,
    pub frequency: String,
    pub time: String,
    pub retention: String,
    pub status: ScheduleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Generate a schedule identifier in the SCH-### format.
pub fn generate_schedule_id() -> String {
    let mut rng = rand::rng();
    format!("SCH-{:03}", rng.random_range(0..1000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_both_ways() {
        assert_eq!(ScheduleStatus::Active.toggled(), ScheduleStatus::Inactive);
        assert_eq!(ScheduleStatus::Inactive.toggled(), ScheduleStatus::Active);
    }

    #[test]
    fn generated_schedule_id_format() {
        let id = generate_schedule_id();
        assert!(id.starts_with("SCH-"));
        assert_eq!(id.len(), 7);
        assert!(id[4..].chars().all(|c| c.is_ascii_digit()));
    }
}
