//! `vidq cancel <id>` – remove a scheduled job.

use anyhow::Result;
use uuid::Uuid;
use vidq_core::queue::ScheduledDownloadManager;

pub async fn run_cancel(queue: &ScheduledDownloadManager, id: Uuid) -> Result<()> {
    queue.cancel_schedule(id).await?;
    println!("Canceled scheduled job {id}.");
    Ok(())
}
