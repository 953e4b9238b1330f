//! Artifact storage.
//!
//! A single local directory holds every retrieved artifact. There is no
//! index: whether an artifact exists is answered by the filesystem alone.

pub mod local;

// Re-export for convenience
pub use local::{ArtifactEntry, ArtifactHandle, LocalStorage};
