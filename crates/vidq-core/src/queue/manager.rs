//! Transactional schedule/cancel on top of [`ScheduleDb`].

use chrono::NaiveDateTime;
use uuid::Uuid;

use super::db::ScheduleDb;
use crate::error::QueueError;
use crate::model::ScheduledDownload;

/// Persists and removes deferred jobs. Each write runs in its own
/// transaction; on failure the transaction is rolled back and the error is
/// logged and returned. Failures are not retried.
#[derive(Clone)]
pub struct ScheduledDownloadManager {
    db: ScheduleDb,
}

impl ScheduledDownloadManager {
    pub fn new(db: ScheduleDb) -> Self {
        Self { db }
    }

    pub async fn schedule_download(&self, job: &ScheduledDownload) -> Result<(), QueueError> {
        job.validate()?;
        let mut tx = self.db.begin().await?;
        if let Err(e) = ScheduleDb::insert_job(&mut tx, job).await {
            tracing::error!(job_id = %job.id(), error = %e, "scheduling failed, rolling back");
            rollback(tx).await;
            return Err(e);
        }
        tx.commit().await.map_err(|e| {
            tracing::error!(job_id = %job.id(), error = %e, "commit of scheduled job failed");
            QueueError::from(e)
        })?;
        tracing::info!(
            job_id = %job.id(),
            timing = %job.timing().timing_type(),
            title = job.media_file().title(),
            "download scheduled"
        );
        Ok(())
    }

    /// Removes the scheduled job `id`. An id with no stored job is
    /// [`QueueError::NotFound`] and changes nothing.
    pub async fn cancel_schedule(&self, id: Uuid) -> Result<(), QueueError> {
        let mut tx = self.db.begin().await?;
        let outcome = match ScheduleDb::delete_job(&mut tx, id).await {
            Ok(0) => Err(QueueError::NotFound(id)),
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            tracing::error!(job_id = %id, error = %e, "cancel of scheduled job failed, rolling back");
            rollback(tx).await;
            return Err(e);
        }
        tx.commit().await.map_err(|e| {
            tracing::error!(job_id = %id, error = %e, "commit of schedule cancel failed");
            QueueError::from(e)
        })?;
        tracing::info!(job_id = %id, "scheduled download canceled");
        Ok(())
    }

    /// All persisted jobs, in the order they were scheduled.
    pub async fn scheduled_items(&self) -> Result<Vec<ScheduledDownload>, QueueError> {
        self.db.list_jobs().await
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<ScheduledDownload>, QueueError> {
        self.db.get_job(id).await
    }

    /// Scheduled jobs whose timing window contains `at`. Promotion to an
    /// instant download is left to the caller.
    pub async fn due_items(&self, at: NaiveDateTime) -> Result<Vec<ScheduledDownload>, QueueError> {
        let mut items = self.db.list_jobs().await?;
        items.retain(|job| job.timing().contains(at));
        Ok(items)
    }
}

async fn rollback(tx: sqlx::Transaction<'static, sqlx::Sqlite>) {
    if let Err(e) = tx.rollback().await {
        tracing::warn!(error = %e, "rollback failed");
    }
}
