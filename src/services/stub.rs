//! Scripted extraction engine for tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::models::MediaMetadata;
use crate::services::extractor::{ExtractionError, MediaExtractor};

/// Engine that returns fixed metadata and writes a fixed payload.
pub struct StubExtractor {
    metadata: MediaMetadata,
    payload: Vec<u8>,
    failure: Option<ExtractionError>,
    write_payload: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubExtractor {
    pub fn new(title: &str, extension: &str, payload: &[u8]) -> Self {
        Self {
            metadata: MediaMetadata::new(title, extension, "stub"),
            payload: payload.to_vec(),
            failure: None,
            write_payload: true,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail every probe with `error`.
    pub fn failing(error: ExtractionError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new("unused", "mp4", b"")
        }
    }

    /// Report success from `fetch` without writing anything.
    pub fn without_payload(mut self) -> Self {
        self.write_payload = false;
        self
    }

    /// Sleep this long inside `fetch`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `probe` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaExtractor for StubExtractor {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn probe(&self, _url: &Url) -> Result<MediaMetadata, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(self.metadata.clone()),
        }
    }

    async fn fetch(
        &self,
        _url: &Url,
        metadata: &MediaMetadata,
        scratch_dir: &Path,
    ) -> Result<PathBuf, ExtractionError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let path = scratch_dir.join(format!("media.{}", metadata.extension));
        if self.write_payload {
            tokio::fs::write(&path, &self.payload)
                .await
                .map_err(|e| ExtractionError::engine(e.to_string()))?;
        }
        Ok(path)
    }
}
