//! `vidq submit <job.json>` – hand a job to the download manager.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;
use vidq_core::config::VidqConfig;
use vidq_core::model::{DownloadingType, ScheduledDownload};
use vidq_core::registry::DownloadEvent;
use vidq_core::source::ProgressSink;
use vidq_core::DownloadManager;

pub async fn run_submit(cfg: &VidqConfig, path: &Path) -> Result<()> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("read job file {}", path.display()))?;
    let job: ScheduledDownload =
        serde_json::from_str(&data).with_context(|| format!("parse job file {}", path.display()))?;
    let id = job.id();
    let kind = job.downloading_type();

    let manager = DownloadManager::from_config(cfg).await?;
    // Subscribe before starting so the completion event cannot be missed.
    let mut events = manager.subscribe();
    let progress = (kind == DownloadingType::Instant).then(percent_printer);
    manager.initiate_downloading(job, progress).await?;

    match kind {
        DownloadingType::Scheduled => {
            println!("Scheduled job {id}.");
            Ok(())
        }
        // The transfer runs on this process's runtime, so stay until it ends.
        DownloadingType::Instant => {
            let outcome = wait_for_outcome(&mut events, id).await;
            eprintln!();
            outcome?;
            println!("Downloaded job {id}.");
            Ok(())
        }
    }
}

/// Waits for the event that closes job `id`, skipping other jobs' events.
async fn wait_for_outcome(events: &mut UnboundedReceiver<DownloadEvent>, id: Uuid) -> Result<()> {
    while let Some(event) = events.recv().await {
        match event {
            DownloadEvent::Completed(done) if done == id => return Ok(()),
            DownloadEvent::Failed(done, err) if done == id => {
                anyhow::bail!("job {id} failed ({}): {err}", err.code());
            }
            _ => {}
        }
    }
    anyhow::bail!("download manager stopped before job {id} finished")
}

/// Prints whole-percent progress to stderr, skipping repeats.
fn percent_printer() -> ProgressSink {
    let last = Arc::new(AtomicI64::new(-1));
    Arc::new(move |fraction: f64| {
        let percent = (fraction * 100.0).floor() as i64;
        if last.swap(percent, Ordering::Relaxed) != percent {
            let mut err = std::io::stderr().lock();
            let _ = write!(err, "\r{percent:>3}%");
            let _ = err.flush();
        }
    })
}
