//! Records of downloads currently in flight.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::model::ScheduledDownload;
use crate::source::ProgressSink;

/// Registry entry for a running download. Owns the cancellation handle;
/// the job itself is shared with the transfer task.
pub(crate) struct DownloadingItem {
    job: Arc<ScheduledDownload>,
    output_path: PathBuf,
    cancel: CancellationToken,
    progress: Arc<watch::Sender<f64>>,
    on_progress: Option<ProgressSink>,
}

impl DownloadingItem {
    pub(crate) fn new(
        job: Arc<ScheduledDownload>,
        output_path: PathBuf,
        on_progress: Option<ProgressSink>,
    ) -> Self {
        let (progress, _) = watch::channel(0.0);
        Self {
            job,
            output_path,
            cancel: CancellationToken::new(),
            progress: Arc::new(progress),
            on_progress,
        }
    }

    pub(crate) fn job_id(&self) -> Uuid {
        self.job.id()
    }

    pub(crate) fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub(crate) fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Sink handed to the transfer: stores the latest fraction and forwards
    /// it to the caller's callback, if any.
    pub(crate) fn progress_sink(&self) -> ProgressSink {
        let progress = Arc::clone(&self.progress);
        let callback = self.on_progress.clone();
        Arc::new(move |fraction| {
            progress.send_replace(fraction);
            if let Some(callback) = &callback {
                callback(fraction);
            }
        })
    }

    pub(crate) fn view(&self) -> DownloadingItemView {
        DownloadingItemView {
            job: Arc::clone(&self.job),
            output_path: self.output_path.clone(),
            progress: self.progress.subscribe(),
            cancel: self.cancel.clone(),
        }
    }
}

/// Read-only snapshot of a running download handed out by the registry.
#[derive(Debug, Clone)]
pub struct DownloadingItemView {
    job: Arc<ScheduledDownload>,
    output_path: PathBuf,
    progress: watch::Receiver<f64>,
    cancel: CancellationToken,
}

impl DownloadingItemView {
    pub fn job(&self) -> &ScheduledDownload {
        &self.job
    }

    pub fn job_id(&self) -> Uuid {
        self.job.id()
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Latest reported completion fraction.
    pub fn progress(&self) -> f64 {
        *self.progress.borrow()
    }

    /// Receiver that wakes on every progress update.
    pub fn watch_progress(&self) -> watch::Receiver<f64> {
        self.progress.clone()
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
