// src/services/retriever.rs

//! Retrieval orchestrator.
//!
//! Validates a request, runs the extraction engine inside a private scratch
//! directory, and moves the result into storage. Either a fully stored
//! artifact comes back or an error does; nothing in between is published.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Config, RetrievalRequest, StoredArtifact};
use crate::services::extractor::{MediaExtractor, build_extractor};
use crate::storage::LocalStorage;
use crate::utils::url::get_domain;

/// Coordinates extraction and persistence for one request at a time; share
/// it behind an `Arc` to serve many concurrently.
pub struct Retriever {
    extractor: Arc<dyn MediaExtractor>,
    storage: LocalStorage,
    timeout: Duration,
}

impl Retriever {
    pub fn new(extractor: Arc<dyn MediaExtractor>, storage: LocalStorage, timeout: Duration) -> Self {
        Self {
            extractor,
            storage,
            timeout,
        }
    }

    /// Build the engine and open storage as configured.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let extractor = build_extractor(&config.extractor)?;
        let storage =
            LocalStorage::open(&config.storage.root_dir, config.storage.scratch_dir()).await?;
        Ok(Self::new(
            extractor,
            storage,
            Duration::from_secs(config.extractor.timeout_secs),
        ))
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    pub fn extractor_name(&self) -> &'static str {
        self.extractor.name()
    }

    /// Retrieve one URL into storage.
    pub async fn retrieve(&self, request: &RetrievalRequest) -> Result<StoredArtifact> {
        let url = request.validate()?;
        let started = Instant::now();
        log::info!(
            "Retrieving {} from {} via {}",
            url,
            get_domain(&url),
            self.extractor.name()
        );

        let scratch_dir = self.storage.create_scratch_dir().await?;
        let result = self.retrieve_into(&url, &scratch_dir).await;
        self.storage.remove_scratch_dir(&scratch_dir).await;

        match &result {
            Ok(artifact) => log::info!(
                "Stored '{}' ({} bytes) in {:.1}s",
                artifact.relative_path,
                artifact.size_bytes,
                started.elapsed().as_secs_f64()
            ),
            Err(e) => log::warn!("Retrieval of {} failed: {}", url, e),
        }
        result
    }

    async fn retrieve_into(&self, url: &Url, scratch_dir: &Path) -> Result<StoredArtifact> {
        let extraction = match tokio::time::timeout(
            self.timeout,
            self.extractor.extract(url, scratch_dir),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(AppError::UnreachableSource(format!(
                    "extraction timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        self.storage
            .persist(&extraction.scratch_file, &extraction.metadata)
            .await
    }
}
