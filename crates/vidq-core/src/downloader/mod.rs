//! Executes one transfer: resolve the source's variants, pick the one that
//! matches the job's stream, and write it to the output path.
//!
//! On cancellation or failure the partially written file is removed so a
//! later retry starts from a clean path.

use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{DownloadError, ValidationError};
use crate::model::{require_non_blank, MediaStream};
use crate::selector::select_variant;
use crate::source::{MediaSource, ProgressSink, SourceError};

/// Downloads media streams from a single [`MediaSource`].
#[derive(Clone)]
pub struct Downloader {
    source: Arc<dyn MediaSource>,
}

impl Downloader {
    pub fn new(source: Arc<dyn MediaSource>) -> Self {
        Self { source }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Preconditions for [`Downloader::download_media`]; callers check these
    /// before any task is spawned.
    pub fn check_request(media_id: &str, output_path: &Path) -> Result<(), ValidationError> {
        require_non_blank(media_id, "media id")?;
        require_non_blank(&output_path.to_string_lossy(), "output path")
    }

    /// Downloads the variant of `media_id` matching `stream` into
    /// `output_path`.
    ///
    /// Returns [`DownloadError::StreamNotFound`] when the source has no
    /// exact match, [`DownloadError::Canceled`] when `cancel` fires and
    /// [`DownloadError::Failed`] for any other transfer error.
    pub async fn download_media(
        &self,
        job_id: Uuid,
        stream: &MediaStream,
        media_id: &str,
        output_path: &Path,
        progress: ProgressSink,
        cancel: CancellationToken,
    ) -> Result<(), DownloadError> {
        if let Err(e) = Self::check_request(media_id, output_path) {
            return Err(DownloadError::Failed(e.to_string()));
        }
        tracing::debug!(
            job_id = %job_id,
            media_id,
            container = stream.container(),
            quality = stream.quality(),
            path = %output_path.display(),
            "transfer starting"
        );

        let outcome = self
            .try_download(stream, media_id, output_path, progress, &cancel)
            .await;
        match &outcome {
            Ok(()) => {
                tracing::info!(job_id = %job_id, path = %output_path.display(), "download complete");
            }
            Err(DownloadError::StreamNotFound { source_name }) => {
                tracing::warn!(
                    job_id = %job_id,
                    source = %source_name,
                    container = stream.container(),
                    quality = stream.quality(),
                    size = stream.size_in_bytes(),
                    "no matching stream"
                );
            }
            Err(e) => {
                tracing::warn!(job_id = %job_id, code = e.code(), error = %e, "download did not complete");
                remove_partial(output_path).await;
            }
        }
        outcome
    }

    async fn try_download(
        &self,
        stream: &MediaStream,
        media_id: &str,
        output_path: &Path,
        progress: ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<(), DownloadError> {
        if cancel.is_cancelled() {
            return Err(DownloadError::Canceled);
        }
        let variants = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DownloadError::Canceled),
            r = self.source.resolve_variants(media_id) => r,
        }
        .map_err(|e| classify(e, cancel))?;

        let candidates = variants.for_stream_type(stream.stream_type());
        let Some(variant) = select_variant(stream, candidates) else {
            return Err(DownloadError::StreamNotFound {
                source_name: self.source.name().to_string(),
            });
        };
        self.source
            .transfer(variant, output_path, progress, cancel.clone())
            .await
            .map_err(|e| classify(e, cancel))
    }
}

/// A transport error observed after cancellation is still a cancellation.
fn classify(err: SourceError, cancel: &CancellationToken) -> DownloadError {
    match err {
        SourceError::Canceled => DownloadError::Canceled,
        _ if cancel.is_cancelled() => DownloadError::Canceled,
        SourceError::Transfer(message) => DownloadError::Failed(message),
    }
}

async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "removed partial file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not remove partial file"),
    }
}
