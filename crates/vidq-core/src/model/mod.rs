//! Job entities: what to download, when, and which encoding.

mod job;
mod media;
mod playlist;
mod thumbnail;
mod timing;

pub use job::{DownloadingType, ScheduledDownload};
pub use media::{MediaFile, MediaStream, StreamType};
pub use playlist::PlayList;
pub use thumbnail::Thumbnail;
pub use timing::{Timing, TimingType};

use crate::error::ValidationError;

/// A stored enum string that matches no known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

pub(crate) fn require_non_blank(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Blank(field))
    } else {
        Ok(())
    }
}
