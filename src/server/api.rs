//! API route definitions

use std::sync::Arc;
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::header::CONTENT_LENGTH,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::error::TabClassError;

use super::error::ServerError;
use super::handlers;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let max_upload_size = state.storage.max_upload_size;

    // CORS configured via CORS_ORIGIN env var (default: allow all)
    let cors = match std::env::var("CORS_ORIGIN") {
        Ok(origin) if !origin.is_empty() && origin != "*" => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<axum::http::HeaderValue>()
                    .unwrap_or_else(|_| axum::http::HeaderValue::from_static("*")),
            )
            .allow_methods(Any)
            .allow_headers(Any),
        _ => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    Router::new()
        .route("/upload", post(handlers::upload_dataset))
        .route("/health", get(handlers::health_check))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            enforce_upload_ceiling,
        ))
        // Slack above the ceiling covers multipart framing overhead; the
        // middleware enforces the real limit
        .layer(DefaultBodyLimit::max(max_upload_size + 64 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Reject oversized uploads from the declared content length, before the
/// body is read.
async fn enforce_upload_ceiling(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let declared = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    if let Some(length) = declared {
        if length > state.storage.max_upload_size {
            let err: ServerError = TabClassError::UploadTooLarge {
                limit: state.storage.max_upload_size,
            }
            .into();
            return err.into_response();
        }
    }

    next.run(request).await
}
