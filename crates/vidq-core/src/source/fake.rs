//! In-process media source for unit tests.

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use super::{MediaSource, ProgressSink, RemoteVariant, SourceError, VariantSet};

pub(crate) const BODY: &[u8] = b"0123456789";

/// Offers one muxed `mp4 / 720p / 10 B` variant. Transfers write half the
/// body, then optionally wait on `gate` (or cancellation) before finishing.
pub(crate) struct FakeSource {
    pub variants: VariantSet,
    pub gate: Option<Arc<Notify>>,
    pub fail_with: Option<String>,
    pub panics: bool,
    pub resolve_calls: AtomicUsize,
    pub transfer_calls: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self {
            variants: VariantSet {
                muxed: vec![RemoteVariant {
                    container: "mp4".to_string(),
                    quality: "720p".to_string(),
                    size_in_bytes: BODY.len() as u64,
                    url: "fake://clip".to_string(),
                }],
                ..VariantSet::default()
            },
            gate: None,
            fail_with: None,
            panics: false,
            resolve_calls: AtomicUsize::new(0),
            transfer_calls: AtomicUsize::new(0),
        }
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::new()
        }
    }

    pub fn panicking() -> Self {
        Self {
            panics: true,
            ..Self::new()
        }
    }

    pub fn transfers(&self) -> usize {
        self.transfer_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaSource for FakeSource {
    fn name(&self) -> &str {
        "fake"
    }

    async fn resolve_variants(&self, _media_id: &str) -> Result<VariantSet, SourceError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.variants.clone())
    }

    async fn transfer(
        &self,
        _variant: &RemoteVariant,
        destination: &Path,
        progress: ProgressSink,
        cancel: CancellationToken,
    ) -> Result<(), SourceError> {
        self.transfer_calls.fetch_add(1, Ordering::SeqCst);
        if self.panics {
            panic!("fake source exploded");
        }
        let half = BODY.len() / 2;
        tokio::fs::write(destination, &BODY[..half])
            .await
            .map_err(|e| SourceError::Transfer(e.to_string()))?;
        progress(0.5);

        if let Some(gate) = &self.gate {
            tokio::select! {
                _ = cancel.cancelled() => return Err(SourceError::Canceled),
                _ = gate.notified() => {}
            }
        }
        if let Some(message) = &self.fail_with {
            return Err(SourceError::Transfer(message.clone()));
        }
        tokio::fs::write(destination, BODY)
            .await
            .map_err(|e| SourceError::Transfer(e.to_string()))?;
        progress(1.0);
        Ok(())
    }
}
