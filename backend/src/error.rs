//! Error types and error handling for the application
//!
//! This module defines custom error types that can be converted to HTTP responses.
//! Every error is rendered as a short plain-text body, even though successful
//! responses are JSON.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Application-level error types
///
/// All errors that can occur while serving a request are represented by this enum.
/// Each variant implements automatic conversion to HTTP responses via `IntoResponse`.
#[derive(Error, Debug)]
pub enum AppError {
    /// `id`, `name` or the `image` file was absent from a create request
    #[error("Missing required fields")]
    MissingFields,

    /// No item has the requested id
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Requested upload does not exist or cannot be read
    #[error("Image not found: {0}")]
    ImageNotFound(String),

    /// No handler matches the path and method
    #[error("Route not found")]
    RouteNotFound,

    /// Multipart parsing, size limit or upload write failure
    #[error("Upload error: {0}")]
    Upload(String),

    /// Update body is not a JSON object
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Error occurred while reading or writing the item collection
    #[error("Persistence error: {0}")]
    Persistence(#[from] crate::state::PersistenceError),
}

impl AppError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingFields => StatusCode::BAD_REQUEST,
            AppError::ItemNotFound(_) | AppError::ImageNotFound(_) | AppError::RouteNotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::Upload(_) | AppError::InvalidBody(_) | AppError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Plain-text body sent to the client
    ///
    /// Details stay in the logs; clients only see a fixed message per kind.
    pub fn public_message(&self) -> &'static str {
        match self {
            AppError::MissingFields => "Missing required fields",
            AppError::ItemNotFound(_) => "Item not found",
            AppError::ImageNotFound(_) => "Image not found",
            AppError::RouteNotFound => "Route not found",
            AppError::Upload(_) => "Error processing image upload",
            AppError::InvalidBody(_) | AppError::Persistence(_) => INTERNAL_ERROR_MESSAGE,
        }
    }
}

/// Body of every 500 response that is not an upload failure
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Build a plain-text response with the given status
pub fn plain_text(status: StatusCode, body: &'static str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        plain_text(status, self.public_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PersistenceError;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        String::from_utf8(bytes.to_vec()).expect("Body should be UTF-8")
    }

    #[tokio::test]
    async fn test_not_found_is_plain_text() {
        let response = AppError::ItemNotFound("999".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(body_text(response).await, "Item not found");
    }

    #[tokio::test]
    async fn test_missing_fields_is_bad_request() {
        let response = AppError::MissingFields.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Missing required fields");
    }

    #[tokio::test]
    async fn test_upload_error_message() {
        let response = AppError::Upload("stream ended early".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Error processing image upload");
    }

    #[tokio::test]
    async fn test_internal_errors_hide_details() {
        let errors = vec![
            AppError::InvalidBody("expected value at line 1".to_string()),
            AppError::Persistence(PersistenceError::InvalidData("not a list".to_string())),
            AppError::Persistence(PersistenceError::Json(
                serde_json::from_str::<serde_json::Value>("[{").unwrap_err(),
            )),
        ];

        for err in errors {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body_text(response).await, "Internal server error");
        }
    }

    #[test]
    fn test_route_not_found_status() {
        assert_eq!(AppError::RouteNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::RouteNotFound.public_message(), "Route not found");
    }
}
