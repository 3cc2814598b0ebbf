//! Media file and the chosen stream encoding.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use super::{require_non_blank, Thumbnail, UnknownVariant};
use crate::error::ValidationError;

/// Broad category of an encoded stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamType {
    VideoOnly,
    AudioOnly,
    Mixed,
}

impl StreamType {
    pub fn as_str(self) -> &'static str {
        match self {
            StreamType::VideoOnly => "VideoOnly",
            StreamType::AudioOnly => "AudioOnly",
            StreamType::Mixed => "Mixed",
        }
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for StreamType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VideoOnly" => Ok(StreamType::VideoOnly),
            "AudioOnly" => Ok(StreamType::AudioOnly),
            "Mixed" => Ok(StreamType::Mixed),
            other => Err(UnknownVariant {
                kind: "stream type",
                value: other.to_string(),
            }),
        }
    }
}

/// The one encoding of a media file that a job downloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaStream {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    size_in_bytes: u64,
    container: String,
    quality: String,
    stream_type: StreamType,
    #[serde(skip)]
    media_file_id: Uuid,
}

impl MediaStream {
    /// Creates a detached stream; the owning media file id is set when it is
    /// attached with [`MediaFile::new`] or [`MediaFile::set_stream`].
    pub fn new(
        size_in_bytes: u64,
        container: impl Into<String>,
        quality: impl Into<String>,
        stream_type: StreamType,
    ) -> Result<Self, ValidationError> {
        let container = container.into();
        let quality = quality.into();
        require_non_blank(&container, "container")?;
        require_non_blank(&quality, "quality")?;
        Ok(Self {
            id: Uuid::new_v4(),
            size_in_bytes,
            container,
            quality,
            stream_type,
            media_file_id: Uuid::nil(),
        })
    }

    pub(crate) fn from_stored(
        id: Uuid,
        size_in_bytes: u64,
        container: String,
        quality: String,
        stream_type: StreamType,
        media_file_id: Uuid,
    ) -> Self {
        Self {
            id,
            size_in_bytes,
            container,
            quality,
            stream_type,
            media_file_id,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn size_in_bytes(&self) -> u64 {
        self.size_in_bytes
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn quality(&self) -> &str {
        &self.quality
    }

    pub fn stream_type(&self) -> StreamType {
        self.stream_type
    }

    pub fn media_file_id(&self) -> Uuid {
        self.media_file_id
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank(&self.container, "container")?;
        require_non_blank(&self.quality, "quality")
    }
}

/// A single remote media item selected for download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    source_id: String,
    url: String,
    title: String,
    #[serde(default)]
    author_name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    duration: Duration,
    #[serde(default)]
    thumbnail: Option<Thumbnail>,
    #[serde(skip)]
    job_id: Uuid,
    stream: MediaStream,
}

impl MediaFile {
    /// `source_id`, `url` and `title` must be non-blank. Author and
    /// description may be empty.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source_id: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
        author_name: impl Into<String>,
        description: impl Into<String>,
        duration: Duration,
        thumbnail: Option<Thumbnail>,
        stream: MediaStream,
    ) -> Result<Self, ValidationError> {
        let source_id = source_id.into();
        let url = url.into();
        let title = title.into();
        require_non_blank(&source_id, "source_id")?;
        require_non_blank(&url, "url")?;
        require_non_blank(&title, "title")?;
        let mut file = Self {
            id: Uuid::new_v4(),
            source_id,
            url,
            title,
            author_name: author_name.into(),
            description: description.into(),
            duration,
            thumbnail,
            job_id: Uuid::nil(),
            stream,
        };
        file.relink();
        Ok(file)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_stored(
        id: Uuid,
        source_id: String,
        url: String,
        title: String,
        author_name: String,
        description: String,
        duration: Duration,
        thumbnail: Option<Thumbnail>,
        job_id: Uuid,
        stream: MediaStream,
    ) -> Self {
        Self {
            id,
            source_id,
            url,
            title,
            author_name,
            description,
            duration,
            thumbnail,
            job_id,
            stream,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Identifier of the media item on the remote platform.
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author_name(&self) -> &str {
        &self.author_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn thumbnail(&self) -> Option<&Thumbnail> {
        self.thumbnail.as_ref()
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn stream(&self) -> &MediaStream {
        &self.stream
    }

    /// Replaces the chosen stream and points it at this file.
    pub fn set_stream(&mut self, stream: MediaStream) {
        self.stream = stream;
        self.relink();
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank(&self.source_id, "source_id")?;
        require_non_blank(&self.url, "url")?;
        require_non_blank(&self.title, "title")?;
        if let Some(thumbnail) = &self.thumbnail {
            thumbnail.validate()?;
        }
        self.stream.validate()
    }

    pub(crate) fn attach_to(&mut self, job_id: Uuid) {
        self.job_id = job_id;
        self.relink();
    }

    fn relink(&mut self) {
        self.stream.media_file_id = self.id;
    }
}
