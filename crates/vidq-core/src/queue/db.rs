//! SQLite-backed store of scheduled jobs.
//!
//! Handles connection and migrations. Job reads and writes live in `jobs`.

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, Transaction};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::QueueError;

/// Percent-encode a path for use in a sqlite:// URI so spaces and special chars don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

/// Default database location: `~/.local/state/vidq/schedule.db`.
pub fn default_db_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("vidq")?;
    Ok(xdg_dirs.get_state_home().join("vidq").join("schedule.db"))
}

/// Handle to the scheduled-job database.
#[derive(Clone)]
pub struct ScheduleDb {
    pub(crate) pool: Pool<Sqlite>,
}

impl ScheduleDb {
    /// Open (or create) the database under the XDG state directory.
    pub async fn open_default() -> Result<Self> {
        Self::open_at(default_db_path()?).await
    }

    /// Open (or create) the database at a specific path. Creates parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let uri = path_to_sqlite_uri(path) + "?mode=rwc";
        // WAL lets a list read its snapshot while a cancel commits.
        let options = SqliteConnectOptions::from_str(&uri)?
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;
        let db = ScheduleDb { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Starts the transaction that scopes one logical write.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, QueueError> {
        Ok(self.pool.begin().await?)
    }

    async fn migrate(&self) -> Result<()> {
        // One row per job, with exactly one media file, one stream and at
        // most one playlist hanging off it. Children go with the job.
        // Timing columns are nullable; which ones are set depends on
        // `timing_type`.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scheduled_downloads (
                id TEXT PRIMARY KEY NOT NULL,
                downloading_type TEXT NOT NULL,
                timing_id TEXT NOT NULL,
                timing_type TEXT NOT NULL,
                start_date TEXT,
                end_date TEXT,
                start_time TEXT,
                end_time TEXT,
                created_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS media_files (
                id TEXT PRIMARY KEY NOT NULL,
                job_id TEXT NOT NULL UNIQUE
                    REFERENCES scheduled_downloads(id) ON DELETE CASCADE,
                source_id TEXT NOT NULL,
                url TEXT NOT NULL,
                title TEXT NOT NULL,
                author_name TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                duration_ms INTEGER NOT NULL DEFAULT 0,
                thumbnail_url TEXT,
                thumbnail_image BLOB
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS media_streams (
                id TEXT PRIMARY KEY NOT NULL,
                media_file_id TEXT NOT NULL UNIQUE
                    REFERENCES media_files(id) ON DELETE CASCADE,
                size_in_bytes INTEGER NOT NULL,
                container TEXT NOT NULL,
                quality TEXT NOT NULL,
                stream_type TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS playlists (
                id TEXT PRIMARY KEY NOT NULL,
                job_id TEXT NOT NULL UNIQUE
                    REFERENCES scheduled_downloads(id) ON DELETE CASCADE,
                source_id TEXT NOT NULL,
                url TEXT NOT NULL,
                title TEXT NOT NULL,
                author_name TEXT NOT NULL DEFAULT '',
                thumbnail_url TEXT,
                thumbnail_image BLOB
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Current time as Unix seconds (for DB timestamps).
pub(crate) fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
/// Open an in-memory database for tests (no disk I/O).
pub(crate) async fn open_memory() -> Result<ScheduleDb> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    let db = ScheduleDb { pool };
    db.migrate().await?;
    Ok(db)
}
