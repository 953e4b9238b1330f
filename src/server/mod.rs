// src/server/mod.rs

//! HTTP front end.
//!
//! - `GET /` entry form
//! - `GET /download?url=...` retrieve into storage, answer with a reference
//! - `GET /download-file/{filename}` stream a stored artifact
//! - `GET /health` liveness

mod handlers;
mod response;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::error::Result;
use crate::models::ServerConfig;
use crate::services::Retriever;

pub use handlers::{DownloadQuery, DownloadResponse};
pub use response::{ErrorBody, ErrorDetail, status_for};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub retriever: Arc<Retriever>,
}

/// Build the application router.
pub fn router(retriever: Arc<Retriever>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/download", get(handlers::download))
        .route("/download/", get(handlers::download))
        .route("/download-file/{filename}", get(handlers::download_file))
        .with_state(AppState { retriever })
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &ServerConfig, retriever: Arc<Retriever>) -> Result<()> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!(
        "Listening on http://{} (engine: {}, storage: {})",
        listener.local_addr()?,
        retriever.extractor_name(),
        retriever.storage().root_dir().display()
    );

    axum::serve(listener, router(retriever))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ExtractionError;
    use crate::services::stub::StubExtractor;
    use crate::storage::LocalStorage;
    use std::time::Duration;
    use tempfile::TempDir;

    async fn start_app(tmp: &TempDir, stub: Arc<StubExtractor>) -> (String, Arc<Retriever>) {
        let root = tmp.path().join("downloads");
        let storage = LocalStorage::open(&root, root.join(".scratch")).await.unwrap();
        let retriever = Arc::new(Retriever::new(stub, storage, Duration::from_secs(5)));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(Arc::clone(&retriever));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), retriever)
    }

    #[tokio::test]
    async fn unreachable_source_is_502_and_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let stub = Arc::new(StubExtractor::failing(ExtractionError::unreachable(
            "Unable to download webpage: Name or service not known",
        )));
        let (base, retriever) = start_app(&tmp, stub).await;

        let resp = reqwest::get(format!(
            "{base}/download?url=https://example.com/video123"
        ))
        .await
        .unwrap();

        assert_eq!(resp.status(), reqwest::StatusCode::BAD_GATEWAY);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["error"]["kind"], "unreachable_source");
        assert!(
            body["error"]["message"]
                .as_str()
                .unwrap()
                .to_lowercase()
                .contains("unreachable")
        );
        assert_eq!(body["error"]["hint"], "try again later");
        assert!(retriever.storage().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn download_then_fetch_round_trip() {
        let tmp = TempDir::new().unwrap();
        let payload = b"\x00\x01binary media payload\xff".to_vec();
        let stub = Arc::new(StubExtractor::new("Sample Clip", "mp4", &payload));
        let (base, _retriever) = start_app(&tmp, stub).await;

        let client = reqwest::Client::new();
        let resp = client
            .get(format!("{base}/download"))
            .query(&[("url", "https://example.com/video123")])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let created: DownloadResponse = resp.json().await.unwrap();
        assert_eq!(created.filename, "Sample Clip.mp4");
        assert_eq!(created.url, "/download-file/Sample%20Clip.mp4");
        assert_eq!(created.size_bytes, payload.len() as u64);

        let resp = client
            .get(format!("{base}{}", created.url))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(
            resp.headers()[reqwest::header::CONTENT_TYPE],
            "application/octet-stream"
        );
        let disposition = resp.headers()[reqwest::header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("filename=\"Sample Clip.mp4\""));
        assert_eq!(resp.bytes().await.unwrap().as_ref(), payload.as_slice());
    }

    #[tokio::test]
    async fn traversal_and_missing_files_are_404() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("secret.txt"), b"s").await.unwrap();
        let stub = Arc::new(StubExtractor::new("x", "mp4", b"x"));
        let (base, _retriever) = start_app(&tmp, stub).await;

        for path in ["..%2Fsecret.txt", "%2Fetc%2Fpasswd", ".scratch", "missing.mp4"] {
            let resp = reqwest::get(format!("{base}/download-file/{path}"))
                .await
                .unwrap();
            assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND, "{path}");
        }
    }

    #[tokio::test]
    async fn bad_requests_map_to_client_errors() {
        let tmp = TempDir::new().unwrap();
        let stub = Arc::new(StubExtractor::new("x", "mp4", b"x"));
        let (base, _retriever) = start_app(&tmp, Arc::clone(&stub)).await;

        let resp = reqwest::get(format!("{base}/download")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["error"]["kind"], "invalid_url");
        assert_eq!(body["error"]["hint"], "check the URL");

        let resp = reqwest::get(format!("{base}/download/?url=not-a-url"))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn unsupported_source_is_422() {
        let tmp = TempDir::new().unwrap();
        let stub = Arc::new(StubExtractor::failing(ExtractionError::unsupported(
            "Unsupported URL: https://example.com/page",
        )));
        let (base, _retriever) = start_app(&tmp, stub).await;

        let resp = reqwest::get(format!("{base}/download?url=https://example.com/page"))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn client_disconnect_does_not_abort_retrieval() {
        let tmp = TempDir::new().unwrap();
        let stub = Arc::new(
            StubExtractor::new("Sample Clip", "mp4", b"payload")
                .with_delay(Duration::from_millis(300)),
        );
        let (base, retriever) = start_app(&tmp, stub).await;

        let impatient = reqwest::Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        let result = impatient
            .get(format!("{base}/download?url=https://example.com/video123"))
            .send()
            .await;
        assert!(result.unwrap_err().is_timeout());

        let mut stored = Vec::new();
        for _ in 0..40 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            stored = retriever.storage().list().await.unwrap();
            if !stored.is_empty() {
                break;
            }
        }
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "Sample Clip.mp4");

        // Scratch cleanup runs right after the move.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let mut scratch = tokio::fs::read_dir(retriever.storage().scratch_dir())
            .await
            .unwrap();
        assert!(scratch.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn index_and_health_respond() {
        let tmp = TempDir::new().unwrap();
        let stub = Arc::new(StubExtractor::new("x", "mp4", b"x"));
        let (base, _retriever) = start_app(&tmp, stub).await;

        let page = reqwest::get(format!("{base}/")).await.unwrap();
        assert_eq!(page.status(), reqwest::StatusCode::OK);
        assert!(page.text().await.unwrap().contains("action=\"/download\""));

        let health: serde_json::Value = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");
    }
}
