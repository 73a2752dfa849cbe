//! API module
//!
//! Contains HTTP request handlers for the item endpoints and the router that
//! wires them together.

pub mod items;
pub mod middleware;
pub mod uploads;

use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

/// Allowance on top of the image size for multipart framing and text fields
pub const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Build the application router
///
/// Unknown paths and unsupported methods on known paths both answer
/// 404 "Route not found". HEAD is registered explicitly so it is not
/// served by the GET handlers.
pub fn router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route(
            "/items",
            get(items::get_items)
                .post(items::create_item)
                .put(items::replace_item)
                .patch(items::update_item)
                .delete(items::delete_item)
                .head(uploads::route_not_found)
                .fallback(uploads::route_not_found)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/uploads/",
            get(uploads::missing_upload)
                .head(uploads::route_not_found)
                .fallback(uploads::route_not_found),
        )
        .route(
            "/uploads/*filename",
            get(uploads::serve_upload)
                .head(uploads::route_not_found)
                .fallback(uploads::route_not_found),
        )
        .fallback(uploads::route_not_found)
        // Middleware (order matters - panics are caught inside the request span)
        .layer(CatchPanicLayer::custom(middleware::panic_response))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state.into_shared())
}
