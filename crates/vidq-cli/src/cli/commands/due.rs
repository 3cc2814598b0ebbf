//! `vidq due [--at]` – scheduled jobs whose window is open.

use anyhow::Result;
use chrono::NaiveDateTime;
use vidq_core::queue::ScheduledDownloadManager;

use super::print_jobs;

pub async fn run_due(queue: &ScheduledDownloadManager, at: NaiveDateTime) -> Result<()> {
    let jobs = queue.due_items(at).await?;
    print_jobs(&jobs, &format!("No scheduled jobs due at {at}."));
    Ok(())
}
