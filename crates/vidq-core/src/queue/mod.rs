//! Durable queue of deferred downloads (SQLite via sqlx).
//!
//! Stores each scheduled job with its timing window, media file, chosen
//! stream and optional playlist. Nothing here executes downloads.

pub mod db;
mod jobs;
mod manager;

pub use db::{default_db_path, ScheduleDb};
pub use manager::ScheduledDownloadManager;
