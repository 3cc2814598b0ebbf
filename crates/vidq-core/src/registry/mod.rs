//! Registry of instant downloads currently running.
//!
//! `start_download` validates the job, reserves an output path, records a
//! [`DownloadingItem`] and spawns a supervised transfer task. When the task
//! ends its record is removed and exactly one [`DownloadEvent`] is delivered
//! to every subscriber for the job id: `Completed` on success, `Failed`
//! otherwise (including cancellation and a panicking transfer).
//!
//! An output path stays reserved until its task has ended, even after the
//! record is dropped by a cancel, so a new job never lands on a file the old
//! task may still write or remove.

mod item;

use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::downloader::Downloader;
use crate::error::{DownloadError, StartError, ValidationError};
use crate::filename::{self, DEFAULT_MAX_FILE_NAME_LEN, MAX_FILE_NAME_LEN_LIMIT};
use crate::model::ScheduledDownload;
use crate::source::ProgressSink;

pub(crate) use item::DownloadingItem;
pub use item::DownloadingItemView;

/// Outcome of a download, delivered to every subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent {
    Completed(Uuid),
    Failed(Uuid, DownloadError),
}

impl DownloadEvent {
    pub fn job_id(&self) -> Uuid {
        match self {
            DownloadEvent::Completed(id) | DownloadEvent::Failed(id, _) => *id,
        }
    }
}

/// Where and how instant downloads are written.
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    pub download_root: PathBuf,
    pub max_file_name_len: usize,
    /// Upper bound on transfers running at once; `None` is unbounded.
    pub max_concurrent_downloads: Option<usize>,
}

impl RegistrySettings {
    pub fn new(download_root: impl Into<PathBuf>) -> Self {
        Self {
            download_root: download_root.into(),
            max_file_name_len: DEFAULT_MAX_FILE_NAME_LEN,
            max_concurrent_downloads: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.download_root.as_os_str().is_empty() {
            return Err(ValidationError::Blank("download root"));
        }
        if !(1..=MAX_FILE_NAME_LEN_LIMIT).contains(&self.max_file_name_len) {
            return Err(ValidationError::OutOfRange {
                field: "max_file_name_len",
                value: self.max_file_name_len,
                min: 1,
                max: MAX_FILE_NAME_LEN_LIMIT,
            });
        }
        if self.max_concurrent_downloads == Some(0) {
            return Err(ValidationError::OutOfRange {
                field: "max_concurrent_downloads",
                value: 0,
                min: 1,
                max: usize::MAX,
            });
        }
        Ok(())
    }
}

/// Tracks running instant downloads. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CurrentDownloadManager {
    inner: Arc<Inner>,
}

struct Inner {
    downloader: Downloader,
    settings: RegistrySettings,
    state: Mutex<State>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<DownloadEvent>>>,
    limit: Option<Arc<Semaphore>>,
}

#[derive(Default)]
struct State {
    items: Vec<DownloadingItem>,
    /// Output paths of every task that has not finished yet.
    reserved: HashSet<PathBuf>,
}

impl CurrentDownloadManager {
    pub fn new(downloader: Downloader, settings: RegistrySettings) -> Result<Self, ValidationError> {
        settings.validate()?;
        let limit = settings
            .max_concurrent_downloads
            .map(|n| Arc::new(Semaphore::new(n)));
        Ok(Self {
            inner: Arc::new(Inner {
                downloader,
                settings,
                state: Mutex::new(State::default()),
                subscribers: Mutex::new(Vec::new()),
                limit,
            }),
        })
    }

    /// Starts `job` in the background and returns once it is registered.
    ///
    /// Must be called from within a tokio runtime. Transfer failures are not
    /// returned here; they arrive as [`DownloadEvent::Failed`].
    pub fn start_download(
        &self,
        job: ScheduledDownload,
        on_progress: Option<ProgressSink>,
    ) -> Result<(), StartError> {
        job.validate()?;
        let job = Arc::new(job);
        let settings = &self.inner.settings;

        let dir = filename::prepare_output_dir(
            &settings.download_root,
            &job,
            settings.max_file_name_len,
        )?;

        let (output_path, cancel, progress) = {
            let mut state = self.inner.state.lock();
            let output_path =
                filename::unique_output_path(&dir, &job, settings.max_file_name_len, |p| {
                    state.reserved.contains(p)
                })?;
            Downloader::check_request(job.media_file().source_id(), &output_path)?;
            let item = DownloadingItem::new(Arc::clone(&job), output_path.clone(), on_progress);
            let handles = (output_path.clone(), item.cancellation_token(), item.progress_sink());
            state.reserved.insert(output_path);
            state.items.push(item);
            handles
        };

        tracing::info!(
            job_id = %job.id(),
            title = job.media_file().title(),
            path = %output_path.display(),
            "download started"
        );
        tokio::spawn(supervise(Arc::clone(&self.inner), job, output_path, cancel, progress));
        Ok(())
    }

    /// Cancels the running download with `job_id` and drops its record.
    /// Returns `false` when no such download is running.
    pub fn cancel_download(&self, job_id: Uuid) -> bool {
        let removed = take_item(&mut self.inner.state.lock().items, job_id);
        match removed {
            Some(item) => {
                item.cancel();
                tracing::info!(job_id = %job_id, "download canceled");
                true
            }
            None => {
                tracing::debug!(job_id = %job_id, "cancel requested for unknown download");
                false
            }
        }
    }

    /// Snapshot of the downloads running right now.
    pub fn downloading_items(&self) -> Vec<DownloadingItemView> {
        self.inner.state.lock().items.iter().map(DownloadingItem::view).collect()
    }

    pub fn get(&self, job_id: Uuid) -> Option<DownloadingItemView> {
        self.inner
            .state
            .lock()
            .items
            .iter()
            .find(|i| i.job_id() == job_id)
            .map(DownloadingItem::view)
    }

    /// Receives every completion and failure event emitted after this call.
    /// The channel is unbounded, so a slow reader never misses an event.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<DownloadEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.subscribers.lock().push(tx);
        rx
    }

    pub fn download_root(&self) -> &Path {
        &self.inner.settings.download_root
    }
}

impl Inner {
    fn finish(&self, job_id: Uuid, output_path: &Path, outcome: Result<(), DownloadError>) {
        let removed = {
            let mut state = self.state.lock();
            state.reserved.remove(output_path);
            take_item(&mut state.items, job_id).is_some()
        };
        let event = match outcome {
            Ok(()) => {
                tracing::debug!(job_id = %job_id, removed, "download record closed after completion");
                DownloadEvent::Completed(job_id)
            }
            Err(e) => {
                tracing::debug!(job_id = %job_id, removed, code = e.code(), "download record closed after failure");
                DownloadEvent::Failed(job_id, e)
            }
        };
        // Dropped receivers fall out here.
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

fn take_item(items: &mut Vec<DownloadingItem>, job_id: Uuid) -> Option<DownloadingItem> {
    let index = items.iter().position(|i| i.job_id() == job_id)?;
    Some(items.remove(index))
}

/// Runs the transfer in its own task so a panic there still yields a
/// `Failed` event and removes the record.
async fn supervise(
    inner: Arc<Inner>,
    job: Arc<ScheduledDownload>,
    output_path: PathBuf,
    cancel: CancellationToken,
    progress: ProgressSink,
) {
    let job_id = job.id();
    let task_inner = Arc::clone(&inner);
    let task_path = output_path.clone();
    let transfer = tokio::spawn(async move {
        let _permit = match &task_inner.limit {
            Some(limit) => tokio::select! {
                _ = cancel.cancelled() => return Err(DownloadError::Canceled),
                permit = Arc::clone(limit).acquire_owned() => match permit {
                    Ok(permit) => Some(permit),
                    Err(_) => return Err(DownloadError::Failed("download limiter closed".to_string())),
                },
            },
            None => None,
        };
        let media = job.media_file();
        task_inner
            .downloader
            .download_media(job_id, media.stream(), media.source_id(), &task_path, progress, cancel)
            .await
    });

    let outcome = match transfer.await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(job_id = %job_id, error = %e, "download task panicked");
            Err(DownloadError::Failed(format!("download task failed: {e}")))
        }
    };
    inner.finish(job_id, &output_path, outcome);
}
