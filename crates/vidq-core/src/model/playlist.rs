//! Playlist a job's media file belongs to.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{require_non_blank, Thumbnail};
use crate::error::ValidationError;

/// Parent collection of a media file. Its title names the sub-directory the
/// file is written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayList {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    source_id: String,
    url: String,
    title: String,
    #[serde(default)]
    author_name: String,
    #[serde(default)]
    thumbnail: Option<Thumbnail>,
    #[serde(skip)]
    job_id: Uuid,
}

impl PlayList {
    pub fn new(
        source_id: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
        author_name: impl Into<String>,
        thumbnail: Option<Thumbnail>,
    ) -> Result<Self, ValidationError> {
        let source_id = source_id.into();
        let url = url.into();
        let title = title.into();
        require_non_blank(&source_id, "source_id")?;
        require_non_blank(&url, "url")?;
        require_non_blank(&title, "title")?;
        Ok(Self {
            id: Uuid::new_v4(),
            source_id,
            url,
            title,
            author_name: author_name.into(),
            thumbnail,
            job_id: Uuid::nil(),
        })
    }

    pub(crate) fn from_stored(
        id: Uuid,
        source_id: String,
        url: String,
        title: String,
        author_name: String,
        thumbnail: Option<Thumbnail>,
        job_id: Uuid,
    ) -> Self {
        Self {
            id,
            source_id,
            url,
            title,
            author_name,
            thumbnail,
            job_id,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

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

    pub fn thumbnail(&self) -> Option<&Thumbnail> {
        self.thumbnail.as_ref()
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank(&self.source_id, "source_id")?;
        require_non_blank(&self.url, "url")?;
        require_non_blank(&self.title, "title")?;
        if let Some(thumbnail) = &self.thumbnail {
            thumbnail.validate()?;
        }
        Ok(())
    }

    pub(crate) fn attach_to(&mut self, job_id: Uuid) {
        self.job_id = job_id;
    }
}
