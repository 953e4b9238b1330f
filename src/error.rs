// src/error.rs

//! Unified error handling for the retrieval service.
//!
//! Every failure that can reach a client is one of the [`ErrorKind`]s below.
//! Adapter failures arrive as [`ExtractionError`] and are translated here,
//! keeping the engine's diagnostic as the message.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::services::ExtractionError;

/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Client-facing error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidUrl,
    InvalidReference,
    UnreachableSource,
    UnsupportedSource,
    EngineFailure,
    StorageFailure,
    NotFound,
    Internal,
}

impl ErrorKind {
    /// Short retry hint shown next to the message.
    pub fn hint(&self) -> &'static str {
        match self {
            ErrorKind::InvalidUrl | ErrorKind::UnsupportedSource => "check the URL",
            ErrorKind::InvalidReference | ErrorKind::NotFound => "check the file reference",
            ErrorKind::UnreachableSource | ErrorKind::EngineFailure => "try again later",
            ErrorKind::StorageFailure | ErrorKind::Internal => {
                "try again later or contact the operator"
            }
        }
    }
}

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// The source URL is empty or not an absolute http(s) URL
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A requested artifact name would resolve outside the storage root
    #[error("Invalid file reference '{0}'")]
    InvalidReference(String),

    /// Network or DNS failure while contacting the source
    #[error("Source unreachable: {0}")]
    UnreachableSource(String),

    /// The extraction engine cannot handle the source
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    /// Any other extraction engine failure
    #[error("Extraction engine failed: {0}")]
    EngineFailure(String),

    /// Moving the downloaded file into the storage root failed
    #[error("Storage failure while {context}: {source}")]
    StorageFailure {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// No artifact with that name exists
    #[error("File not found: {0}")]
    NotFound(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client setup failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create an invalid URL error.
    pub fn invalid_url(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid reference error.
    pub fn invalid_reference(name: impl Into<String>) -> Self {
        Self::InvalidReference(name.into())
    }

    /// Create a storage failure with context.
    pub fn storage(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::StorageFailure {
            context: context.into(),
            source,
        }
    }

    /// Create a not-found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Classify this error for clients.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidUrl { .. } | AppError::Url(_) => ErrorKind::InvalidUrl,
            AppError::InvalidReference(_) => ErrorKind::InvalidReference,
            AppError::UnreachableSource(_) => ErrorKind::UnreachableSource,
            AppError::UnsupportedSource(_) => ErrorKind::UnsupportedSource,
            AppError::EngineFailure(_) => ErrorKind::EngineFailure,
            AppError::StorageFailure { .. } => ErrorKind::StorageFailure,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Io(_)
            | AppError::Http(_)
            | AppError::Json(_)
            | AppError::Toml(_)
            | AppError::Config(_)
            | AppError::Validation(_) => ErrorKind::Internal,
        }
    }
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::InvalidUrl { url, reason } => AppError::InvalidUrl { url, reason },
            ExtractionError::Unreachable(message) => AppError::UnreachableSource(message),
            ExtractionError::Unsupported(message) => AppError::UnsupportedSource(message),
            ExtractionError::Engine(message) => AppError::EngineFailure(message),
        }
    }
}
