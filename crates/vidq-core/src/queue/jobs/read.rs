//! Job read operations: list and get. Each call reads all four tables inside
//! one transaction so a concurrent cancel cannot leave a job without its
//! children halfway through. Nothing returned is tracked for later writes.

use chrono::{NaiveDate, NaiveTime};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use super::super::db::ScheduleDb;
use crate::error::QueueError;
use crate::model::{
    DownloadingType, MediaFile, MediaStream, PlayList, ScheduledDownload, StreamType, Thumbnail,
    Timing, TimingType,
};

const JOB_COLUMNS: &str = "id, downloading_type, timing_id, timing_type, \
     start_date, end_date, start_time, end_time";
const MEDIA_COLUMNS: &str = "id, job_id, source_id, url, title, author_name, description, \
     duration_ms, thumbnail_url, thumbnail_image";
const STREAM_COLUMNS: &str = "id, media_file_id, size_in_bytes, container, quality, stream_type";
const PLAYLIST_COLUMNS: &str = "id, job_id, source_id, url, title, author_name, \
     thumbnail_url, thumbnail_image";

impl ScheduleDb {
    /// All scheduled jobs in insertion order.
    pub async fn list_jobs(&self) -> Result<Vec<ScheduledDownload>, QueueError> {
        let mut tx = self.pool.begin().await?;
        let jobs = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM scheduled_downloads ORDER BY created_at, rowid"
        ))
        .fetch_all(&mut *tx)
        .await?;
        let media = sqlx::query(&format!("SELECT {MEDIA_COLUMNS} FROM media_files"))
            .fetch_all(&mut *tx)
            .await?;
        let streams = sqlx::query(&format!("SELECT {STREAM_COLUMNS} FROM media_streams"))
            .fetch_all(&mut *tx)
            .await?;
        let playlists = sqlx::query(&format!("SELECT {PLAYLIST_COLUMNS} FROM playlists"))
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;
        assemble(jobs, media, streams, playlists)
    }

    pub async fn get_job(&self, id: Uuid) -> Result<Option<ScheduledDownload>, QueueError> {
        let key = id.to_string();
        let mut tx = self.pool.begin().await?;
        let jobs = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM scheduled_downloads WHERE id = ?1"
        ))
        .bind(&key)
        .fetch_all(&mut *tx)
        .await?;
        if jobs.is_empty() {
            return Ok(None);
        }
        let media = sqlx::query(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media_files WHERE job_id = ?1"
        ))
        .bind(&key)
        .fetch_all(&mut *tx)
        .await?;
        let streams = sqlx::query(
            "SELECT s.id, s.media_file_id, s.size_in_bytes, s.container, s.quality, s.stream_type \
             FROM media_streams s JOIN media_files m ON m.id = s.media_file_id \
             WHERE m.job_id = ?1",
        )
        .bind(&key)
        .fetch_all(&mut *tx)
        .await?;
        let playlists = sqlx::query(&format!(
            "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE job_id = ?1"
        ))
        .bind(&key)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(assemble(jobs, media, streams, playlists)?.into_iter().next())
    }
}

fn assemble(
    jobs: Vec<SqliteRow>,
    media: Vec<SqliteRow>,
    streams: Vec<SqliteRow>,
    playlists: Vec<SqliteRow>,
) -> Result<Vec<ScheduledDownload>, QueueError> {
    let mut streams_by_file: HashMap<Uuid, MediaStream> = HashMap::new();
    for row in &streams {
        let stream = stream_from_row(row)?;
        streams_by_file.insert(stream.media_file_id(), stream);
    }
    let mut media_by_job: HashMap<Uuid, MediaFile> = HashMap::new();
    for row in &media {
        let file = media_from_row(row, &mut streams_by_file)?;
        media_by_job.insert(file.job_id(), file);
    }
    let mut playlist_by_job: HashMap<Uuid, PlayList> = HashMap::new();
    for row in &playlists {
        let playlist = playlist_from_row(row)?;
        playlist_by_job.insert(playlist.job_id(), playlist);
    }

    let mut out = Vec::with_capacity(jobs.len());
    for row in &jobs {
        let id = uuid_col(row, "id")?;
        let downloading_type: DownloadingType = enum_col(row, "downloading_type")?;
        let timing = timing_from_row(row)?;
        let media_file = media_by_job
            .remove(&id)
            .ok_or_else(|| corrupt(format!("job {id} has no media file")))?;
        let playlist = playlist_by_job.remove(&id);
        out.push(ScheduledDownload::from_stored(
            id,
            downloading_type,
            timing,
            media_file,
            playlist,
        ));
    }
    Ok(out)
}

fn timing_from_row(row: &SqliteRow) -> Result<Timing, QueueError> {
    let timing_type: TimingType = enum_col(row, "timing_type")?;
    let timing = Timing::from_stored(
        uuid_col(row, "timing_id")?,
        timing_type,
        parsed_col::<NaiveDate>(row, "start_date")?,
        parsed_col::<NaiveDate>(row, "end_date")?,
        parsed_col::<NaiveTime>(row, "start_time")?,
        parsed_col::<NaiveTime>(row, "end_time")?,
    )
    .map_err(|e| corrupt(e.to_string()))?;
    Ok(timing)
}

fn media_from_row(
    row: &SqliteRow,
    streams: &mut HashMap<Uuid, MediaStream>,
) -> Result<MediaFile, QueueError> {
    let id = uuid_col(row, "id")?;
    let stream = streams
        .remove(&id)
        .ok_or_else(|| corrupt(format!("media file {id} has no stream")))?;
    let duration_ms: i64 = row.try_get("duration_ms")?;
    Ok(MediaFile::from_stored(
        id,
        row.try_get("source_id")?,
        row.try_get("url")?,
        row.try_get("title")?,
        row.try_get("author_name")?,
        row.try_get("description")?,
        Duration::from_millis(duration_ms.max(0) as u64),
        thumbnail_cols(row)?,
        uuid_col(row, "job_id")?,
        stream,
    ))
}

fn stream_from_row(row: &SqliteRow) -> Result<MediaStream, QueueError> {
    let size: i64 = row.try_get("size_in_bytes")?;
    Ok(MediaStream::from_stored(
        uuid_col(row, "id")?,
        size as u64,
        row.try_get("container")?,
        row.try_get("quality")?,
        enum_col::<StreamType>(row, "stream_type")?,
        uuid_col(row, "media_file_id")?,
    ))
}

fn playlist_from_row(row: &SqliteRow) -> Result<PlayList, QueueError> {
    Ok(PlayList::from_stored(
        uuid_col(row, "id")?,
        row.try_get("source_id")?,
        row.try_get("url")?,
        row.try_get("title")?,
        row.try_get("author_name")?,
        thumbnail_cols(row)?,
        uuid_col(row, "job_id")?,
    ))
}

fn thumbnail_cols(row: &SqliteRow) -> Result<Option<Thumbnail>, QueueError> {
    let url: Option<String> = row.try_get("thumbnail_url")?;
    let image: Option<Vec<u8>> = row.try_get("thumbnail_image")?;
    match url {
        Some(url) => Thumbnail::new(url, image.unwrap_or_default())
            .map(Some)
            .map_err(|e| corrupt(e.to_string())),
        None => Ok(None),
    }
}

fn uuid_col(row: &SqliteRow, column: &str) -> Result<Uuid, QueueError> {
    let raw: String = row.try_get(column)?;
    Uuid::parse_str(&raw).map_err(|e| corrupt(format!("{column} {raw:?}: {e}")))
}

/// Enum columns must hold a known variant name. Anything else means the
/// database was written by something other than this crate.
fn enum_col<T>(row: &SqliteRow, column: &str) -> Result<T, QueueError>
where
    T: FromStr<Err = crate::model::UnknownVariant>,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>().map_err(|e| {
        tracing::error!(column, error = %e, "unknown value in schedule database");
        corrupt(e.to_string())
    })
}

fn parsed_col<T>(row: &SqliteRow, column: &str) -> Result<Option<T>, QueueError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| s.parse::<T>().map_err(|e| corrupt(format!("{column} {s:?}: {e}"))))
        .transpose()
}

fn corrupt(message: String) -> QueueError {
    QueueError::Corrupt(message)
}
