//! Request handlers, one module per resource.

pub mod backups;
pub mod dashboard;
pub mod guest_token;
pub mod health;
pub mod migrations;
pub mod repositories;
pub mod schedules;
pub mod users;
