//! Git dashboard backend.
//!
//! REST backend unifying the entities behind a Git migration dashboard:
//! users, repositories, backups and their schedules, git migrations, plus
//! the aggregated dashboard views and a Superset guest-token proxy for
//! embedded analytics.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
