//! CLI for the vidq download scheduler.

mod commands;

use anyhow::Result;
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;
use vidq_core::config::{self, VidqConfig};
use vidq_core::queue::{ScheduleDb, ScheduledDownloadManager};

use commands::{run_cancel, run_due, run_status, run_submit};

/// Top-level CLI for vidq.
#[derive(Debug, Parser)]
#[command(name = "vidq")]
#[command(about = "vidq: instant and scheduled media downloads", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Submit a job described in a JSON file. Instant jobs run now and the
    /// command waits for them to finish; scheduled jobs are stored for their
    /// timing window.
    Submit {
        /// Path to the job JSON.
        path: PathBuf,
    },

    /// List scheduled jobs.
    Status,

    /// Remove a scheduled job by its ID.
    Cancel {
        /// Job identifier.
        id: Uuid,
    },

    /// List scheduled jobs whose timing window contains a moment.
    Due {
        /// Local date-time, e.g. 2024-05-01T22:30:00 (default: now).
        #[arg(long, value_name = "DATETIME")]
        at: Option<NaiveDateTime>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Submit { path } => run_submit(&cfg, &path).await?,
            CliCommand::Status => run_status(&open_queue(&cfg).await?).await?,
            CliCommand::Cancel { id } => run_cancel(&open_queue(&cfg).await?, id).await?,
            CliCommand::Due { at } => {
                let at = at.unwrap_or_else(|| chrono::Local::now().naive_local());
                run_due(&open_queue(&cfg).await?, at).await?;
            }
        }

        Ok(())
    }
}

/// Queue-only commands do not need a media source.
async fn open_queue(cfg: &VidqConfig) -> Result<ScheduledDownloadManager> {
    let db = match &cfg.database_path {
        Some(path) => ScheduleDb::open_at(path).await?,
        None => ScheduleDb::open_default().await?,
    };
    Ok(ScheduledDownloadManager::new(db))
}

#[cfg(test)]
mod tests;
