//! The download job itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{MediaFile, PlayList, Timing, UnknownVariant};
use crate::error::ValidationError;

/// Whether a job runs now or waits for its timing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DownloadingType {
    Instant,
    Scheduled,
}

impl DownloadingType {
    pub fn as_str(self) -> &'static str {
        match self {
            DownloadingType::Instant => "Instant",
            DownloadingType::Scheduled => "Scheduled",
        }
    }
}

impl fmt::Display for DownloadingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for DownloadingType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Instant" => Ok(DownloadingType::Instant),
            "Scheduled" => Ok(DownloadingType::Scheduled),
            other => Err(UnknownVariant {
                kind: "downloading type",
                value: other.to_string(),
            }),
        }
    }
}

/// One media item to download, either immediately or inside a timing window.
///
/// Kind, timing and media file are always present; the setters take owned
/// values and keep the children's owning ids in sync with this job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "JobRepr")]
pub struct ScheduledDownload {
    id: Uuid,
    downloading_type: DownloadingType,
    timing: Timing,
    media_file: MediaFile,
    playlist: Option<PlayList>,
}

#[derive(Deserialize)]
struct JobRepr {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    downloading_type: DownloadingType,
    timing: Timing,
    media_file: MediaFile,
    #[serde(default)]
    playlist: Option<PlayList>,
}

impl From<JobRepr> for ScheduledDownload {
    fn from(r: JobRepr) -> Self {
        let mut job = Self {
            id: r.id,
            downloading_type: r.downloading_type,
            timing: r.timing,
            media_file: r.media_file,
            playlist: r.playlist,
        };
        job.relink();
        job
    }
}

impl ScheduledDownload {
    pub fn new(downloading_type: DownloadingType, timing: Timing, media_file: MediaFile) -> Self {
        let mut job = Self {
            id: Uuid::new_v4(),
            downloading_type,
            timing,
            media_file,
            playlist: None,
        };
        job.relink();
        job
    }

    pub fn with_playlist(mut self, playlist: PlayList) -> Self {
        self.set_playlist(Some(playlist));
        self
    }

    pub(crate) fn from_stored(
        id: Uuid,
        downloading_type: DownloadingType,
        timing: Timing,
        media_file: MediaFile,
        playlist: Option<PlayList>,
    ) -> Self {
        Self {
            id,
            downloading_type,
            timing,
            media_file,
            playlist,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn downloading_type(&self) -> DownloadingType {
        self.downloading_type
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn media_file(&self) -> &MediaFile {
        &self.media_file
    }

    pub fn playlist(&self) -> Option<&PlayList> {
        self.playlist.as_ref()
    }

    pub fn set_downloading_type(&mut self, downloading_type: DownloadingType) {
        self.downloading_type = downloading_type;
    }

    pub fn set_timing(&mut self, timing: Timing) {
        self.timing = timing;
    }

    pub fn set_media_file(&mut self, media_file: MediaFile) {
        self.media_file = media_file;
        self.relink();
    }

    pub fn set_playlist(&mut self, playlist: Option<PlayList>) {
        self.playlist = playlist;
        self.relink();
    }

    /// Full precondition check. Entities built through constructors always
    /// pass; deserialized ones may not.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.timing.validate()?;
        self.media_file.validate()?;
        if let Some(playlist) = &self.playlist {
            playlist.validate()?;
        }
        Ok(())
    }

    fn relink(&mut self) {
        self.media_file.attach_to(self.id);
        if let Some(playlist) = self.playlist.as_mut() {
            playlist.attach_to(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MediaStream, StreamType};
    use chrono::NaiveTime;
    use std::time::Duration;

    fn media_file(title: &str) -> MediaFile {
        let stream = MediaStream::new(2000, "mp3", "128Kbit/s", StreamType::AudioOnly).unwrap();
        MediaFile::new("abc", "https://v/abc", title, "a", "d", Duration::ZERO, None, stream).unwrap()
    }

    fn timing() -> Timing {
        Timing::for_time_fixed_only(
            NaiveTime::from_hms_opt(1, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
        )
    }

    #[test]
    fn children_point_at_the_job() {
        let playlist = PlayList::new("PL", "https://p/PL", "Mix", "", None).unwrap();
        let job = ScheduledDownload::new(DownloadingType::Scheduled, timing(), media_file("x"))
            .with_playlist(playlist);
        assert_eq!(job.media_file().job_id(), job.id());
        assert_eq!(job.playlist().unwrap().job_id(), job.id());
        assert_eq!(
            job.media_file().stream().media_file_id(),
            job.media_file().id()
        );
    }

    #[test]
    fn setters_replace_and_relink() {
        let mut job = ScheduledDownload::new(DownloadingType::Instant, timing(), media_file("a"));
        job.set_media_file(media_file("b"));
        job.set_downloading_type(DownloadingType::Scheduled);
        assert_eq!(job.media_file().title(), "b");
        assert_eq!(job.media_file().job_id(), job.id());
        assert_eq!(job.downloading_type(), DownloadingType::Scheduled);
    }

    #[test]
    fn deserialized_job_is_linked_and_validated() {
        let json = r#"{
            "downloading_type": "Instant",
            "timing": {"type": "TimeFixedOnly", "start_time": "01:00:00", "end_time": "02:00:00"},
            "media_file": {
                "source_id": "abc",
                "url": "https://v/abc",
                "title": "Clip",
                "stream": {"size_in_bytes": 10, "container": "mp4", "quality": "720p", "stream_type": "Mixed"}
            }
        }"#;
        let job: ScheduledDownload = serde_json::from_str(json).unwrap();
        assert_eq!(job.media_file().job_id(), job.id());
        assert!(job.validate().is_ok());

        let bad = json.replace("\"Clip\"", "\"\"");
        let job: ScheduledDownload = serde_json::from_str(&bad).unwrap();
        assert_eq!(job.validate(), Err(ValidationError::Blank("title")));
    }
}
