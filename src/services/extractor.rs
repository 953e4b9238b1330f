// src/services/extractor.rs

//! Extraction adapter contract.
//!
//! An extraction engine turns a source URL into media bytes plus metadata.
//! Engines are two-phase: [`MediaExtractor::probe`] resolves metadata without
//! committing to a transfer, [`MediaExtractor::fetch`] materializes the bytes
//! inside a scratch directory owned by the caller.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::error::Result;
use crate::models::{EngineKind, ExtractorConfig, MediaMetadata};
use crate::services::{DirectExtractor, YtDlpExtractor};
use crate::utils::url::check_source_url;

/// Failure reported by an extraction engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// Rejected before contacting anything
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Network, DNS or upstream server failure
    #[error("source unreachable: {0}")]
    Unreachable(String),

    /// The engine cannot handle this source
    #[error("unsupported source: {0}")]
    Unsupported(String),

    /// Anything else the engine reported
    #[error("engine failure: {0}")]
    Engine(String),
}

impl ExtractionError {
    pub fn invalid_url(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine(message.into())
    }
}

/// Metadata plus the scratch file holding the downloaded bytes.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub metadata: MediaMetadata,
    pub scratch_file: PathBuf,
}

/// An external extraction engine.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Engine name for log lines.
    fn name(&self) -> &'static str;

    /// Resolve metadata for `url` without downloading the media.
    async fn probe(&self, url: &Url) -> std::result::Result<MediaMetadata, ExtractionError>;

    /// Download the media described by `metadata` into `scratch_dir`.
    ///
    /// Returns the path of the written file. Leaves partial files behind on
    /// failure; the caller owns `scratch_dir` and cleans it up.
    async fn fetch(
        &self,
        url: &Url,
        metadata: &MediaMetadata,
        scratch_dir: &Path,
    ) -> std::result::Result<PathBuf, ExtractionError>;

    /// Check the URL, then probe, then fetch.
    ///
    /// Non-http(s) or host-less URLs fail with `InvalidUrl` before the
    /// engine is contacted.
    async fn extract(
        &self,
        url: &Url,
        scratch_dir: &Path,
    ) -> std::result::Result<Extraction, ExtractionError> {
        check_source_url(url)?;
        let metadata = self.probe(url).await?;
        log::debug!(
            "{} probed {}: title={:?} ext={} format={}",
            self.name(),
            url,
            metadata.title,
            metadata.extension,
            metadata.raw_format_hint
        );
        let scratch_file = self.fetch(url, &metadata, scratch_dir).await?;
        Ok(Extraction {
            metadata,
            scratch_file,
        })
    }
}

/// Build the engine selected by configuration.
pub fn build_extractor(config: &ExtractorConfig) -> Result<Arc<dyn MediaExtractor>> {
    let extractor: Arc<dyn MediaExtractor> = match config.engine {
        EngineKind::YtDlp => Arc::new(YtDlpExtractor::new(config)),
        EngineKind::Direct => Arc::new(DirectExtractor::new(config)?),
    };
    Ok(extractor)
}

/// Locate the file an engine wrote into `scratch_dir`.
///
/// Prefers `reported` when the engine named a file and it lies inside the
/// scratch directory; otherwise takes the first regular file found.
pub(crate) async fn locate_scratch_file(
    scratch_dir: &Path,
    reported: Option<&Path>,
) -> std::result::Result<PathBuf, ExtractionError> {
    if let Some(path) = reported {
        if path.starts_with(scratch_dir) && tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file())
        {
            return Ok(path.to_path_buf());
        }
        log::debug!("Engine reported {:?}, scanning scratch dir instead", path);
    }

    let mut entries = tokio::fs::read_dir(scratch_dir)
        .await
        .map_err(|e| ExtractionError::engine(format!("cannot read scratch dir: {e}")))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ExtractionError::engine(format!("cannot read scratch dir: {e}")))?
    {
        let is_partial = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(".part") || name.ends_with(".ytdl"));
        if !is_partial && entry.file_type().await.is_ok_and(|t| t.is_file()) {
            return Ok(entry.path());
        }
    }

    Err(ExtractionError::engine(
        "engine finished without producing a file",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn locate_prefers_reported_path() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.mp4");
        let b = tmp.path().join("b.mp4");
        tokio::fs::write(&a, b"a").await.unwrap();
        tokio::fs::write(&b, b"b").await.unwrap();

        let found = locate_scratch_file(tmp.path(), Some(&b)).await.unwrap();
        assert_eq!(found, b);
    }

    #[tokio::test]
    async fn locate_ignores_paths_outside_scratch() {
        let tmp = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let outside = other.path().join("x.mp4");
        tokio::fs::write(&outside, b"x").await.unwrap();
        let inside = tmp.path().join("media.webm");
        tokio::fs::write(&inside, b"y").await.unwrap();

        let found = locate_scratch_file(tmp.path(), Some(&outside)).await.unwrap();
        assert_eq!(found, inside);
    }

    #[tokio::test]
    async fn locate_skips_partial_downloads() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("media.mp4.part"), b"p")
            .await
            .unwrap();

        let err = locate_scratch_file(tmp.path(), None).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Engine(_)));
    }

    #[tokio::test]
    async fn extract_rejects_non_http_urls_before_the_engine() {
        use crate::services::stub::StubExtractor;

        let tmp = TempDir::new().unwrap();
        let stub = StubExtractor::new("x", "mp4", b"x");
        let direct = DirectExtractor::new(&ExtractorConfig::default()).unwrap();

        for raw in ["ftp://example.com/clip.mp4", "file:///etc/passwd"] {
            let url = Url::parse(raw).unwrap();
            assert!(
                matches!(
                    stub.extract(&url, tmp.path()).await,
                    Err(ExtractionError::InvalidUrl { .. })
                ),
                "{raw}"
            );
            assert!(
                matches!(
                    direct.extract(&url, tmp.path()).await,
                    Err(ExtractionError::InvalidUrl { .. })
                ),
                "{raw}"
            );
        }
        assert_eq!(stub.calls(), 0);
    }

    #[test]
    fn build_extractor_honours_engine_kind() {
        let mut config = ExtractorConfig::default();
        assert_eq!(build_extractor(&config).unwrap().name(), "yt-dlp");

        config.engine = EngineKind::Direct;
        assert_eq!(build_extractor(&config).unwrap().name(), "direct");
    }
}
