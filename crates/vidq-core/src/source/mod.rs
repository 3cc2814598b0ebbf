//! Boundary with the remote media platform.
//!
//! A [`MediaSource`] resolves a media id to the encoded variants available
//! for it and transfers the bytes of one variant to disk. The core only
//! depends on this trait; [`HttpMediaSource`] is the bundled implementation.

#[cfg(test)]
pub(crate) mod fake;
mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::model::StreamType;

pub use http::HttpMediaSource;

/// Callback receiving fractional completion in `[0.0, 1.0]`.
pub type ProgressSink = Arc<dyn Fn(f64) + Send + Sync>;

/// One encoded rendition offered by the remote platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteVariant {
    pub container: String,
    pub quality: String,
    pub size_in_bytes: u64,
    pub url: String,
}

/// All variants of a media item, grouped by stream category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSet {
    #[serde(default)]
    pub audio_only: Vec<RemoteVariant>,
    #[serde(default)]
    pub video_only: Vec<RemoteVariant>,
    #[serde(default)]
    pub muxed: Vec<RemoteVariant>,
}

impl VariantSet {
    /// The subset to search for a stream of the given type.
    pub fn for_stream_type(&self, stream_type: StreamType) -> &[RemoteVariant] {
        match stream_type {
            StreamType::AudioOnly => &self.audio_only,
            StreamType::VideoOnly => &self.video_only,
            StreamType::Mixed => &self.muxed,
        }
    }
}

/// Failure reported by a media source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("transfer canceled")]
    Canceled,
    #[error("{0}")]
    Transfer(String),
}

#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Human-readable platform name, used in error messages.
    fn name(&self) -> &str;

    async fn resolve_variants(&self, media_id: &str) -> Result<VariantSet, SourceError>;

    /// Writes the variant's bytes to `destination`. Must observe `cancel`
    /// during the transfer and return [`SourceError::Canceled`] promptly.
    async fn transfer(
        &self,
        variant: &RemoteVariant,
        destination: &Path,
        progress: ProgressSink,
        cancel: CancellationToken,
    ) -> Result<(), SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subset_by_stream_type() {
        let v = |c: &str| RemoteVariant {
            container: c.to_string(),
            quality: "q".to_string(),
            size_in_bytes: 1,
            url: format!("https://cdn/{c}"),
        };
        let set = VariantSet {
            audio_only: vec![v("mp3")],
            video_only: vec![v("webm")],
            muxed: vec![v("mp4")],
        };
        assert_eq!(set.for_stream_type(StreamType::AudioOnly)[0].container, "mp3");
        assert_eq!(set.for_stream_type(StreamType::VideoOnly)[0].container, "webm");
        assert_eq!(set.for_stream_type(StreamType::Mixed)[0].container, "mp4");
    }

    #[test]
    fn manifest_json_groups_default_to_empty() {
        let set: VariantSet = serde_json::from_str(
            r#"{"muxed":[{"container":"mp4","quality":"360p","size_in_bytes":7,"url":"https://cdn/x"}]}"#,
        )
        .unwrap();
        assert!(set.audio_only.is_empty());
        assert!(set.video_only.is_empty());
        assert_eq!(set.muxed.len(), 1);
    }
}
