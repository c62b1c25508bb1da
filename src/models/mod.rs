//! Persisted entity models and their status enums.

pub mod backup;
pub mod migration;
pub mod repository;
pub mod schedule;
pub mod user;

use rand::Rng;

/// Avatar/icon color palette shared by users, repositories, and migrations.
pub const COLOR_PALETTE: [&str; 8] = [
    "bg-blue-500",
    "bg-purple-500",
    "bg-orange-500",
    "bg-red-500",
    "bg-indigo-500",
    "bg-green-500",
    "bg-pink-500",
    "bg-teal-500",
];

/// Pick a color from the fixed palette.
pub fn random_color() -> String {
    let mut rng = rand::rng();
    COLOR_PALETTE[rng.random_range(0..COLOR_PALETTE.len())].to_string()
}
