//! CLI command handlers, one file per command.

mod cancel;
mod due;
mod status;
mod submit;

pub use cancel::run_cancel;
pub use due::run_due;
pub use status::run_status;
pub use submit::run_submit;

use vidq_core::model::ScheduledDownload;

/// One table row per job, shared by `status` and `due`.
pub(crate) fn print_jobs(jobs: &[ScheduledDownload], empty: &str) {
    if jobs.is_empty() {
        println!("{empty}");
        return;
    }
    println!("{:<36} {:<22} {:<10} {}", "ID", "TIMING", "FORMAT", "TITLE");
    for job in jobs {
        let stream = job.media_file().stream();
        println!(
            "{:<36} {:<22} {:<10} {}",
            job.id(),
            job.timing().timing_type(),
            format!("{}/{}", stream.container(), stream.quality()),
            job.media_file().title()
        );
    }
}
