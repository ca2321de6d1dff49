//! Handler error type.
//!
//! Every handler failure is turned into a JSON `{"error": ...}` body with a
//! matching status code. The response also carries an [`ErrorKind`]
//! extension so the instrumentation middleware can count failures by kind
//! without inspecting bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Error classification attached to failed responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorKind(pub &'static str);

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("Simulated error")]
    Simulated,

    #[error("Internal server error")]
    HandlerPanicked,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    // ---
    pub fn status(&self) -> StatusCode {
        // ---
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Simulated | AppError::HandlerPanicked | AppError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        // ---
        match self {
            AppError::NotFound(_) => ErrorKind("not_found"),
            AppError::Simulated => ErrorKind("simulated_error"),
            AppError::HandlerPanicked => ErrorKind("panic"),
            AppError::Storage(_) => ErrorKind("storage"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // ---
        let message = match &self {
            AppError::Storage(err) => {
                tracing::error!(error = ?err, "Storage operation failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let mut response = (self.status(), Json(json!({ "error": message }))).into_response();
        response.extensions_mut().insert(self.kind());
        response
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn storage_errors_hide_details_and_are_tagged() {
        // ---
        let response = AppError::from(anyhow::anyhow!("connection reset")).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.extensions().get::<ErrorKind>(), Some(&ErrorKind("storage")));
    }

    #[test]
    fn not_found_maps_to_404() {
        // ---
        let err = AppError::NotFound("Item not found");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.kind(), ErrorKind("not_found"));
        assert_eq!(err.to_string(), "Item not found");
    }
}
