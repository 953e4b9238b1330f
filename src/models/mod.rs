// src/models/mod.rs

//! Domain models for the retrieval service.
//!
//! This module contains the data structures shared across the pipeline,
//! organized by their primary purpose.

mod config;
mod media;

// Re-export all public types
pub use config::{Config, EngineKind, ExtractorConfig, LoggingConfig, ServerConfig, StorageConfig};
pub use media::{MediaMetadata, RetrievalRequest, StoredArtifact};
