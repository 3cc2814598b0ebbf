//! `vidq status` – list scheduled jobs.

use anyhow::Result;
use vidq_core::queue::ScheduledDownloadManager;

use super::print_jobs;

pub async fn run_status(queue: &ScheduledDownloadManager) -> Result<()> {
    let jobs = queue.scheduled_items().await?;
    print_jobs(&jobs, "No scheduled jobs.");
    Ok(())
}
