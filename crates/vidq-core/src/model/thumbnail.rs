//! Thumbnail image attached to media files and playlists.

use serde::{Deserialize, Serialize};

use super::require_non_blank;
use crate::error::ValidationError;

/// Source url plus raw image bytes. Two thumbnails are equal when both
/// parts are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Thumbnail {
    url: String,
    #[serde(default)]
    image: Vec<u8>,
}

impl Thumbnail {
    pub fn new(url: impl Into<String>, image: Vec<u8>) -> Result<Self, ValidationError> {
        let url = url.into();
        require_non_blank(&url, "thumbnail url")?;
        Ok(Self { url, image })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn image(&self) -> &[u8] {
        &self.image
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank(&self.url, "thumbnail url")
    }
}
