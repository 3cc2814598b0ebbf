//! Error taxonomy shared by the core components.
//!
//! Precondition violations, recoverable download failures and persistence
//! failures each get their own type so callers can tell them apart.

use uuid::Uuid;

/// A required argument was missing, blank or out of range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} must not be blank")]
    Blank(&'static str),
    #[error("{field} is {value}, expected {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },
    #[error("timing of type {0} has fields that do not match its type")]
    TimingShape(&'static str),
}

/// Recoverable failure of an instant download, reported through the
/// registry's event channel rather than returned to the starter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DownloadError {
    #[error("Could not find requested stream in {source_name}.")]
    StreamNotFound { source_name: String },
    #[error("Download was canceled.")]
    Canceled,
    #[error("{0}")]
    Failed(String),
}

impl DownloadError {
    /// Stable machine-readable code for UI consumers.
    pub fn code(&self) -> &'static str {
        match self {
            DownloadError::StreamNotFound { .. } => "StreamNotFound",
            DownloadError::Canceled => "DownloadCanceled",
            DownloadError::Failed(_) => "DownloadFailed",
        }
    }
}

/// Error returned synchronously by `start_download`.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("prepare output path: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistence failure in the scheduled queue.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("no scheduled download with id {0}")]
    NotFound(Uuid),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("corrupt stored job: {0}")]
    Corrupt(String),
}

/// Error from routing a job through the facade: the instant path fails
/// synchronously only while starting, the scheduled path while persisting.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Start(#[from] StartError),
    #[error(transparent)]
    Queue(#[from] QueueError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_error_codes_and_messages() {
        let e = DownloadError::StreamNotFound {
            source_name: "remote".to_string(),
        };
        assert_eq!(e.code(), "StreamNotFound");
        assert_eq!(e.to_string(), "Could not find requested stream in remote.");
        assert_eq!(DownloadError::Canceled.code(), "DownloadCanceled");
        assert_eq!(DownloadError::Canceled.to_string(), "Download was canceled.");
        let e = DownloadError::Failed("connection reset".to_string());
        assert_eq!(e.code(), "DownloadFailed");
        assert_eq!(e.to_string(), "connection reset");
    }
}
