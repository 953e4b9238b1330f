//! JSON error bodies and status mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::{AppError, ErrorKind};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,
    pub hint: &'static str,
}

/// HTTP status for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidUrl | ErrorKind::InvalidReference => StatusCode::BAD_REQUEST,
        ErrorKind::UnsupportedSource => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::UnreachableSource | ErrorKind::EngineFailure => StatusCode::BAD_GATEWAY,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::StorageFailure | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Render `err` with an explicit status.
pub fn error_response(status: StatusCode, err: &AppError) -> Response {
    let kind = err.kind();
    if status.is_server_error() {
        log::error!("{} {}: {}", status.as_u16(), serde_kind(kind), err);
    } else {
        log::debug!("{} {}: {}", status.as_u16(), serde_kind(kind), err);
    }

    let body = ErrorBody {
        error: ErrorDetail {
            kind,
            message: err.to_string(),
            hint: kind.hint(),
        },
    };
    (status, Json(body)).into_response()
}

fn serde_kind(kind: ErrorKind) -> String {
    serde_json::to_value(kind)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error_response(status_for(self.kind()), &self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::InvalidUrl), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::InvalidReference), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::UnreachableSource), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorKind::EngineFailure), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(ErrorKind::StorageFailure),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_serde_kind() {
        assert_eq!(serde_kind(ErrorKind::StorageFailure), "storage_failure");
    }
}
