//! Job write operations: insert and delete, always inside a caller's
//! transaction.

use sqlx::{Sqlite, Transaction};
use uuid::Uuid;

use super::super::db::{unix_timestamp, ScheduleDb};
use crate::error::QueueError;
use crate::model::{MediaFile, PlayList, ScheduledDownload};

impl ScheduleDb {
    /// Inserts the job with its media file, stream and playlist.
    pub async fn insert_job(
        tx: &mut Transaction<'_, Sqlite>,
        job: &ScheduledDownload,
    ) -> Result<(), QueueError> {
        let timing = job.timing();
        sqlx::query(
            r#"
            INSERT INTO scheduled_downloads (
                id, downloading_type, timing_id, timing_type,
                start_date, end_date, start_time, end_time, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(job.id().to_string())
        .bind(job.downloading_type().as_str())
        .bind(timing.id().to_string())
        .bind(timing.timing_type().as_str())
        .bind(timing.start_date().map(|d| d.to_string()))
        .bind(timing.end_date().map(|d| d.to_string()))
        .bind(timing.start_time().map(|t| t.to_string()))
        .bind(timing.end_time().map(|t| t.to_string()))
        .bind(unix_timestamp())
        .execute(&mut **tx)
        .await?;

        insert_media_file(tx, job.id(), job.media_file()).await?;
        if let Some(playlist) = job.playlist() {
            insert_playlist(tx, job.id(), playlist).await?;
        }
        Ok(())
    }

    /// Deletes the job and, by cascade, its children. Returns the number of
    /// job rows removed.
    pub async fn delete_job(tx: &mut Transaction<'_, Sqlite>, id: Uuid) -> Result<u64, QueueError> {
        let result = sqlx::query("DELETE FROM scheduled_downloads WHERE id = ?1")
            .bind(id.to_string())
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected())
    }
}

async fn insert_media_file(
    tx: &mut Transaction<'_, Sqlite>,
    job_id: Uuid,
    media: &MediaFile,
) -> Result<(), QueueError> {
    let thumbnail = media.thumbnail();
    sqlx::query(
        r#"
        INSERT INTO media_files (
            id, job_id, source_id, url, title, author_name, description,
            duration_ms, thumbnail_url, thumbnail_image
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(media.id().to_string())
    .bind(job_id.to_string())
    .bind(media.source_id())
    .bind(media.url())
    .bind(media.title())
    .bind(media.author_name())
    .bind(media.description())
    .bind(media.duration().as_millis() as i64)
    .bind(thumbnail.map(|t| t.url().to_string()))
    .bind(thumbnail.map(|t| t.image().to_vec()))
    .execute(&mut **tx)
    .await?;

    let stream = media.stream();
    sqlx::query(
        r#"
        INSERT INTO media_streams (
            id, media_file_id, size_in_bytes, container, quality, stream_type
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(stream.id().to_string())
    .bind(media.id().to_string())
    // Stored as the same 64 bits; sizes above i64::MAX read back unchanged.
    .bind(stream.size_in_bytes() as i64)
    .bind(stream.container())
    .bind(stream.quality())
    .bind(stream.stream_type().as_str())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_playlist(
    tx: &mut Transaction<'_, Sqlite>,
    job_id: Uuid,
    playlist: &PlayList,
) -> Result<(), QueueError> {
    let thumbnail = playlist.thumbnail();
    sqlx::query(
        r#"
        INSERT INTO playlists (
            id, job_id, source_id, url, title, author_name,
            thumbnail_url, thumbnail_image
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(playlist.id().to_string())
    .bind(job_id.to_string())
    .bind(playlist.source_id())
    .bind(playlist.url())
    .bind(playlist.title())
    .bind(playlist.author_name())
    .bind(thumbnail.map(|t| t.url().to_string()))
    .bind(thumbnail.map(|t| t.image().to_vec()))
    .execute(&mut **tx)
    .await?;
    Ok(())
}
