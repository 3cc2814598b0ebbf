//! Facade over the instant registry and the scheduled queue.
//!
//! A job's kind decides its path once, at submission: `Instant` goes to
//! [`CurrentDownloadManager`], `Scheduled` to [`ScheduledDownloadManager`].

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::VidqConfig;
use crate::downloader::Downloader;
use crate::error::{DispatchError, QueueError, StartError};
use crate::model::{DownloadingType, ScheduledDownload};
use crate::queue::{ScheduleDb, ScheduledDownloadManager};
use crate::registry::{CurrentDownloadManager, DownloadEvent, DownloadingItemView};
use crate::source::{HttpMediaSource, MediaSource, ProgressSink};

#[derive(Clone)]
pub struct DownloadManager {
    current: CurrentDownloadManager,
    scheduled: ScheduledDownloadManager,
}

impl DownloadManager {
    pub fn new(current: CurrentDownloadManager, scheduled: ScheduledDownloadManager) -> Self {
        Self { current, scheduled }
    }

    /// Wires the HTTP media source, the registry and the schedule database
    /// from configuration.
    pub async fn from_config(cfg: &VidqConfig) -> Result<Self> {
        cfg.validate()?;
        let manifest_url = cfg
            .source
            .manifest_url
            .as_deref()
            .context("source.manifest_url is not configured")?;
        let source: Arc<dyn MediaSource> =
            Arc::new(HttpMediaSource::new(cfg.source.name.clone(), manifest_url)?);
        let db = match &cfg.database_path {
            Some(path) => ScheduleDb::open_at(path).await?,
            None => ScheduleDb::open_default().await?,
        };
        Self::with_source(source, db, cfg)
    }

    /// Wires an arbitrary media source with an already open database.
    pub fn with_source(
        source: Arc<dyn MediaSource>,
        db: ScheduleDb,
        cfg: &VidqConfig,
    ) -> Result<Self> {
        let current = CurrentDownloadManager::new(Downloader::new(source), cfg.registry_settings())?;
        Ok(Self::new(current, ScheduledDownloadManager::new(db)))
    }

    /// Starts an instant job now or persists a scheduled one, by kind.
    pub async fn initiate_downloading(
        &self,
        job: ScheduledDownload,
        on_progress: Option<ProgressSink>,
    ) -> Result<(), DispatchError> {
        tracing::debug!(job_id = %job.id(), kind = %job.downloading_type(), "dispatching job");
        match job.downloading_type() {
            DownloadingType::Instant => self.current.start_download(job, on_progress)?,
            DownloadingType::Scheduled => self.scheduled.schedule_download(&job).await?,
        }
        Ok(())
    }

    pub async fn schedule_download(&self, job: &ScheduledDownload) -> Result<(), QueueError> {
        self.scheduled.schedule_download(job).await
    }

    pub async fn cancel_schedule(&self, id: Uuid) -> Result<(), QueueError> {
        self.scheduled.cancel_schedule(id).await
    }

    pub fn start_download(
        &self,
        job: ScheduledDownload,
        on_progress: Option<ProgressSink>,
    ) -> Result<(), StartError> {
        self.current.start_download(job, on_progress)
    }

    pub fn cancel_download(&self, id: Uuid) -> bool {
        self.current.cancel_download(id)
    }

    pub async fn scheduled_items(&self) -> Result<Vec<ScheduledDownload>, QueueError> {
        self.scheduled.scheduled_items().await
    }

    pub async fn due_items(&self, at: NaiveDateTime) -> Result<Vec<ScheduledDownload>, QueueError> {
        self.scheduled.due_items(at).await
    }

    pub fn downloading_items(&self) -> Vec<DownloadingItemView> {
        self.current.downloading_items()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<DownloadEvent> {
        self.current.subscribe()
    }

    pub fn current(&self) -> &CurrentDownloadManager {
        &self.current
    }

    pub fn scheduled(&self) -> &ScheduledDownloadManager {
        &self.scheduled
    }
}
