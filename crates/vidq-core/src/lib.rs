//! Core engine for vidq: instant downloads tracked in memory, deferred
//! downloads persisted in SQLite, and a facade routing jobs between them.

pub mod config;
pub mod logging;

pub mod downloader;
pub mod error;
pub mod filename;
pub mod manager;
pub mod model;
pub mod queue;
pub mod registry;
pub mod selector;
pub mod source;

pub use error::{DispatchError, DownloadError, QueueError, StartError, ValidationError};
pub use manager::DownloadManager;
