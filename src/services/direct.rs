// src/services/direct.rs

//! Direct-link extraction engine.
//!
//! For URLs that already point at a media file: `probe` issues a `HEAD`
//! request and derives the title and extension from the response headers or
//! the URL path, `fetch` streams the body into the scratch directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap};
use reqwest::{Client, StatusCode};
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::error::Result;
use crate::models::{ExtractorConfig, MediaMetadata};
use crate::services::extractor::{ExtractionError, MediaExtractor};
use crate::services::namer::sanitize_extension;
use crate::utils::http::create_async_client;
use crate::utils::url::last_path_segment;

/// Extraction engine for direct file links.
#[derive(Debug, Clone)]
pub struct DirectExtractor {
    client: Client,
}

impl DirectExtractor {
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
        })
    }

    /// Headers for `url`, falling back to a body-less `GET` when `HEAD` is
    /// not allowed.
    async fn response_headers(&self, url: &Url) -> std::result::Result<HeaderMap, ExtractionError> {
        let response = self
            .client
            .head(url.as_str())
            .send()
            .await
            .map_err(classify_request_error)?;

        let response = match response.status() {
            StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED => self
                .client
                .get(url.as_str())
                .send()
                .await
                .map_err(classify_request_error)?,
            _ => response,
        };

        check_status(response.status())?;
        Ok(response.headers().clone())
    }
}

#[async_trait]
impl MediaExtractor for DirectExtractor {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn probe(&self, url: &Url) -> std::result::Result<MediaMetadata, ExtractionError> {
        let headers = self.response_headers(url).await?;
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        if content_type.starts_with("text/html") {
            return Err(ExtractionError::unsupported(
                "URL serves a web page, not a media file",
            ));
        }

        let file_name = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .or_else(|| last_path_segment(url));

        Ok(metadata_from_name(file_name.as_deref(), &content_type))
    }

    async fn fetch(
        &self,
        url: &Url,
        metadata: &MediaMetadata,
        scratch_dir: &Path,
    ) -> std::result::Result<PathBuf, ExtractionError> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(classify_request_error)?;
        check_status(response.status())?;

        let path = scratch_dir.join(format!("media.{}", sanitize_extension(&metadata.extension)));
        let scratch_error = |e: std::io::Error| ExtractionError::engine(format!("writing scratch file: {e}"));

        let mut file = tokio::fs::File::create(&path).await.map_err(scratch_error)?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(classify_request_error)?;
            file.write_all(&chunk).await.map_err(scratch_error)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(scratch_error)?;

        log::debug!("Streamed {} bytes from {} into {:?}", written, url, path);
        Ok(path)
    }
}

/// Map an upstream status to an extraction error.
fn check_status(status: StatusCode) -> std::result::Result<(), ExtractionError> {
    if status.is_success() {
        Ok(())
    } else if status.is_client_error() {
        Err(ExtractionError::unsupported(format!("source answered {status}")))
    } else {
        Err(ExtractionError::unreachable(format!("source answered {status}")))
    }
}

fn classify_request_error(err: reqwest::Error) -> ExtractionError {
    if let Some(status) = err.status() {
        return match check_status(status) {
            Err(e) => e,
            Ok(()) => ExtractionError::engine(err.to_string()),
        };
    }
    if err.is_connect() || err.is_timeout() || err.is_request() || err.is_body() {
        ExtractionError::unreachable(err.to_string())
    } else {
        ExtractionError::engine(err.to_string())
    }
}

/// Filename from a `Content-Disposition` header value.
///
/// Prefers the RFC 5987 `filename*` parameter over plain `filename`.
fn filename_from_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    for param in value.split(';').map(str::trim) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                let encoded = raw.trim().rsplit('\'').next().unwrap_or_default();
                if let Ok(decoded) = urlencoding::decode(encoded) {
                    if !decoded.is_empty() {
                        return Some(decoded.into_owned());
                    }
                }
            }
            "filename" => {
                let name = raw.trim().trim_matches('"');
                if !name.is_empty() {
                    plain = Some(name.to_string());
                }
            }
            _ => {}
        }
    }
    plain
}

/// Split a file name into title and extension, falling back to the content
/// type for the extension.
fn metadata_from_name(file_name: Option<&str>, content_type: &str) -> MediaMetadata {
    let (stem, ext) = match file_name {
        Some(name) => match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
                (stem.to_string(), Some(ext.to_string()))
            }
            _ => (name.to_string(), None),
        },
        None => ("media".to_string(), None),
    };

    let extension = ext
        .unwrap_or_else(|| extension_for_content_type(content_type).to_string())
        .to_ascii_lowercase();

    MediaMetadata {
        title: stem,
        extension,
        raw_format_hint: content_type.to_string(),
    }
}

/// Map a content-type to a file extension.
fn extension_for_content_type(ct: &str) -> &'static str {
    let base = ct.split(';').next().unwrap_or(ct).trim();
    match base {
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/x-matroska" => "mkv",
        "video/quicktime" => "mov",
        "video/x-flv" => "flv",
        "video/mp2t" => "ts",
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/mp4" | "audio/x-m4a" => "m4a",
        "audio/ogg" | "audio/opus" => "ogg",
        "audio/webm" => "weba",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/flac" => "flac",
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}
