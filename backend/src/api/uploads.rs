//! Upload API handlers
//!
//! Serves stored images back under `/uploads/<filename>`.

use crate::error::AppError;
use crate::services::uploads::UploadService;
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

/// GET /uploads/*filename - Serve a stored image with a content type inferred from its extension
pub async fn serve_upload(
    State(state): State<SharedState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let upload_dir = state.read().await.store.upload_dir().to_path_buf();
    let (data, content_type) = UploadService::read_image(&upload_dir, &filename).await?;

    Ok(([(header::CONTENT_TYPE, content_type)], data).into_response())
}

/// GET /uploads/ - No filename, so there is nothing to serve
pub async fn missing_upload() -> AppError {
    AppError::ImageNotFound(String::new())
}

/// Fallback for every unmatched path or method
pub async fn route_not_found() -> AppError {
    AppError::RouteNotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AppState, ItemStore};
    use axum::http::StatusCode;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_serve_upload_sets_content_type() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let store = ItemStore::new(
            temp_dir.path().join("items.json"),
            temp_dir.path().join("uploads"),
        );
        store.init().await.unwrap();
        std::fs::write(store.upload_dir().join("pic.jpeg"), b"jpeg bytes").unwrap();
        let state = AppState::new(store).into_shared();

        let response = serve_upload(State(state.clone()), Path("pic.jpeg".to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");

        let missing = serve_upload(State(state), Path("gone.png".to_string())).await;
        assert!(matches!(missing, Err(AppError::ImageNotFound(_))));
    }

    #[tokio::test]
    async fn test_missing_upload_is_image_not_found() {
        let response = missing_upload().await.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Image not found");
    }

    #[tokio::test]
    async fn test_route_not_found() {
        let response = route_not_found().await.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
