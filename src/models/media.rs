//! Request and artifact data structures.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;
use crate::utils::url::parse_source_url;

/// A client's request to retrieve one media URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RetrievalRequest {
    /// Source URL as supplied by the client
    pub source_url: String,
}

impl RetrievalRequest {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
        }
    }

    /// Check the request shape and return the parsed URL.
    pub fn validate(&self) -> Result<Url> {
        Ok(parse_source_url(&self.source_url)?)
    }
}

/// Metadata resolved by an extraction engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Human-readable title (untrusted, sanitized before use on disk)
    pub title: String,

    /// File extension without the leading dot
    pub extension: String,

    /// Engine-specific format identifier
    #[serde(default)]
    pub raw_format_hint: String,
}

impl MediaMetadata {
    pub fn new(
        title: impl Into<String>,
        extension: impl Into<String>,
        raw_format_hint: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            extension: extension.into(),
            raw_format_hint: raw_format_hint.into(),
        }
    }
}

/// A file persisted under the storage root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredArtifact {
    /// Path relative to the storage root (always a single file name)
    pub relative_path: String,

    /// File size in bytes
    pub size_bytes: u64,
}

impl StoredArtifact {
    /// Public download link for this artifact.
    pub fn download_path(&self) -> String {
        format!("/download-file/{}", urlencoding::encode(&self.relative_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn validate_accepts_http_urls() {
        let url = RetrievalRequest::new("https://example.com/video123")
            .validate()
            .unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn validate_rejects_garbage() {
        for raw in ["", "   ", "not a url", "ftp://example.com/a", "/relative/path"] {
            let err = RetrievalRequest::new(raw).validate().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidUrl, "{raw:?}");
        }
    }

    #[test]
    fn download_path_is_percent_encoded() {
        let artifact = StoredArtifact {
            relative_path: "Sample Clip.mp4".to_string(),
            size_bytes: 3,
        };
        assert_eq!(artifact.download_path(), "/download-file/Sample%20Clip.mp4");
    }
}
