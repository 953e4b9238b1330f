//! HTTP handlers.

use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;

use crate::error::{AppError, ErrorKind};
use crate::models::{RetrievalRequest, StoredArtifact};
use crate::server::AppState;
use crate::server::response::error_response;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
  <head><meta charset="utf-8"><title>mediadrop</title></head>
  <body>
    <h1>Download media</h1>
    <form action="/download" method="get">
      <input type="url" name="url" placeholder="https://..." required>
      <button type="submit">Download</button>
    </form>
  </body>
</html>
"#;

#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    pub url: Option<String>,
}

/// `GET /download` success body.
#[derive(Debug, Serialize, Deserialize)]
pub struct DownloadResponse {
    pub filename: String,
    pub url: String,
    pub size_bytes: u64,
}

impl From<StoredArtifact> for DownloadResponse {
    fn from(artifact: StoredArtifact) -> Self {
        Self {
            url: artifact.download_path(),
            filename: artifact.relative_path,
            size_bytes: artifact.size_bytes,
        }
    }
}

/// `GET /`
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `GET /download?url=...`
///
/// The retrieval runs in its own task, so a client hanging up does not
/// abort it halfway.
pub async fn download(State(state): State<AppState>, Query(query): Query<DownloadQuery>) -> Response {
    let request = RetrievalRequest::new(query.url.unwrap_or_default());
    let retriever = Arc::clone(&state.retriever);

    let task = tokio::spawn(async move { retriever.retrieve(&request).await });
    match task.await {
        Ok(Ok(artifact)) => Json(DownloadResponse::from(artifact)).into_response(),
        Ok(Err(e)) => e.into_response(),
        Err(join_error) => task_failure(join_error).into_response(),
    }
}

/// A retrieval task that panicked or was cancelled is an internal error.
fn task_failure(join_error: tokio::task::JoinError) -> AppError {
    AppError::Io(std::io::Error::other(format!(
        "retrieval task failed: {join_error}"
    )))
}

/// `GET /download-file/{filename}`
///
/// Absent files and names failing the traversal check both answer 404.
pub async fn download_file(State(state): State<AppState>, Path(filename): Path<String>) -> Response {
    let artifact = match state.retriever.storage().open_artifact(&filename).await {
        Ok(artifact) => artifact,
        Err(e) if matches!(e.kind(), ErrorKind::InvalidReference | ErrorKind::NotFound) => {
            return error_response(StatusCode::NOT_FOUND, &e);
        }
        Err(e) => return e.into_response(),
    };

    let disposition = HeaderValue::from_str(&content_disposition(&artifact.name))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    let body = Body::from_stream(ReaderStream::new(artifact.file));

    (
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_LENGTH, HeaderValue::from(artifact.size_bytes)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

/// `attachment` disposition with an ASCII fallback and the UTF-8 name.
fn content_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(name)
    )
}
