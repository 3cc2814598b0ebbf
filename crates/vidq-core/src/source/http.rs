//! Manifest-backed media source over HTTP (libcurl).
//!
//! Variants are listed in a JSON manifest fetched from a URL template where
//! `{id}` is replaced by the media id. Bytes are fetched with a single GET per
//! variant, written sequentially to the destination file.

use async_trait::async_trait;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::{MediaSource, ProgressSink, RemoteVariant, SourceError, VariantSet};

const ID_PLACEHOLDER: &str = "{id}";

/// Media source that reads variant manifests and media bytes over HTTP.
#[derive(Debug, Clone)]
pub struct HttpMediaSource {
    name: String,
    manifest_url: String,
}

impl HttpMediaSource {
    /// `manifest_url` must contain `{id}`.
    pub fn new(name: impl Into<String>, manifest_url: impl Into<String>) -> anyhow::Result<Self> {
        let manifest_url = manifest_url.into();
        if !manifest_url.contains(ID_PLACEHOLDER) {
            anyhow::bail!("manifest url {manifest_url:?} has no {ID_PLACEHOLDER} placeholder");
        }
        Ok(Self {
            name: name.into(),
            manifest_url,
        })
    }

    fn manifest_url_for(&self, media_id: &str) -> Result<Url, SourceError> {
        let encoded: String = url::form_urlencoded::byte_serialize(media_id.as_bytes()).collect();
        let raw = self.manifest_url.replace(ID_PLACEHOLDER, &encoded);
        Url::parse(&raw).map_err(|e| SourceError::Transfer(format!("invalid manifest url {raw}: {e}")))
    }
}

#[async_trait]
impl MediaSource for HttpMediaSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve_variants(&self, media_id: &str) -> Result<VariantSet, SourceError> {
        let url = self.manifest_url_for(media_id)?;
        let body = tokio::task::spawn_blocking(move || fetch_body(url.as_str()))
            .await
            .map_err(|e| SourceError::Transfer(format!("manifest task join: {e}")))??;
        serde_json::from_slice(&body)
            .map_err(|e| SourceError::Transfer(format!("invalid manifest for {media_id}: {e}")))
    }

    async fn transfer(
        &self,
        variant: &RemoteVariant,
        destination: &Path,
        progress: ProgressSink,
        cancel: CancellationToken,
    ) -> Result<(), SourceError> {
        let url = variant.url.clone();
        let expected = variant.size_in_bytes;
        let destination = destination.to_path_buf();
        tokio::task::spawn_blocking(move || {
            download_to_file(&url, &destination, expected, progress, cancel)
        })
        .await
        .map_err(|e| SourceError::Transfer(format!("transfer task join: {e}")))?
    }
}

fn configure(easy: &mut curl::easy::Easy, url: &str) -> Result<(), curl::Error> {
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(Duration::from_secs(30))?;
    easy.low_speed_limit(1024)?;
    easy.low_speed_time(Duration::from_secs(60))?;
    Ok(())
}

fn check_status(easy: &mut curl::easy::Easy, url: &str) -> Result<(), SourceError> {
    let code = easy
        .response_code()
        .map_err(|e| SourceError::Transfer(format!("no response code: {e}")))?;
    if !(200..300).contains(&code) {
        return Err(SourceError::Transfer(format!("GET {url} returned HTTP {code}")));
    }
    Ok(())
}

/// Fetches a small response body into memory. Blocking.
fn fetch_body(url: &str) -> Result<Vec<u8>, SourceError> {
    let mut body = Vec::new();
    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, url).map_err(|e| SourceError::Transfer(format!("curl: {e}")))?;
    easy.timeout(Duration::from_secs(60))
        .map_err(|e| SourceError::Transfer(format!("curl: {e}")))?;
    {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(|e| SourceError::Transfer(format!("curl: {e}")))?;
        transfer
            .perform()
            .map_err(|e| SourceError::Transfer(format!("GET {url} failed: {e}")))?;
    }
    check_status(&mut easy, url)?;
    Ok(body)
}

/// Streams `url` into `destination`, reporting progress and polling `cancel`
/// from the curl progress callback. Blocking.
fn download_to_file(
    url: &str,
    destination: &Path,
    expected_len: u64,
    progress: ProgressSink,
    cancel: CancellationToken,
) -> Result<(), SourceError> {
    let mut file = File::create(destination)
        .map_err(|e| SourceError::Transfer(format!("create {}: {e}", destination.display())))?;
    let mut written: u64 = 0;
    let mut write_error: Option<std::io::Error> = None;

    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, url).map_err(|e| SourceError::Transfer(format!("curl: {e}")))?;
    easy.progress(true)
        .map_err(|e| SourceError::Transfer(format!("curl: {e}")))?;

    let result = {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| match file.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    write_error = Some(e);
                    Ok(0) // abort transfer
                }
            })
            .map_err(|e| SourceError::Transfer(format!("curl: {e}")))?;
        transfer
            .progress_function(|dltotal, dlnow, _, _| {
                if cancel.is_cancelled() {
                    return false;
                }
                let total = if dltotal > 0.0 {
                    dltotal
                } else {
                    expected_len as f64
                };
                if total > 0.0 {
                    progress((dlnow / total).clamp(0.0, 1.0));
                }
                true
            })
            .map_err(|e| SourceError::Transfer(format!("curl: {e}")))?;
        transfer.perform()
    };

    if cancel.is_cancelled() {
        return Err(SourceError::Canceled);
    }
    if let Some(e) = write_error {
        return Err(SourceError::Transfer(format!(
            "write {}: {e}",
            destination.display()
        )));
    }
    result.map_err(|e| SourceError::Transfer(format!("GET {url} failed: {e}")))?;
    check_status(&mut easy, url)?;
    file.flush()
        .map_err(|e| SourceError::Transfer(format!("flush {}: {e}", destination.display())))?;

    if expected_len > 0 && written != expected_len {
        return Err(SourceError::Transfer(format!(
            "partial transfer: wrote {written} of {expected_len} bytes"
        )));
    }
    progress(1.0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_url_requires_placeholder() {
        assert!(HttpMediaSource::new("remote", "https://example.com/manifest.json").is_err());
    }

    #[test]
    fn manifest_url_encodes_media_id() {
        let source = HttpMediaSource::new("remote", "https://example.com/m/{id}.json").unwrap();
        let url = source.manifest_url_for("a b&c").unwrap();
        assert_eq!(url.as_str(), "https://example.com/m/a+b%26c.json");
    }
}
