use super::handlers;
use super::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Voice notes travel in the same JSON body as the photo
const AUDIO_BODY_ALLOWANCE: usize = 16 * 1024 * 1024;

/// Room for the other JSON fields
const FIELDS_BODY_ALLOWANCE: usize = 64 * 1024;

/// Largest `POST /actions` body: a base64 photo at the configured limit
/// plus a voice note
pub fn request_body_limit(max_photo_bytes: u64) -> usize {
    let photo = usize::try_from(max_photo_bytes).unwrap_or(usize::MAX);
    photo
        .div_ceil(3)
        .saturating_mul(4)
        .saturating_add(AUDIO_BODY_ALLOWANCE)
        .saturating_add(FIELDS_BODY_ALLOWANCE)
}

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let media = ServeDir::new(&state.media_root);
    let body_limit = request_body_limit(state.max_photo_bytes);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Eco actions
        .route(
            "/actions",
            get(handlers::list_actions).post(handlers::submit_action),
        )
        .route("/actions/refresh", post(handlers::refresh_actions))
        .route("/stats", get(handlers::get_stats))
        // Assistant
        .route(
            "/assistant",
            get(handlers::get_assistant_thread).post(handlers::ask_assistant),
        )
        // Uploaded attachments
        .nest_service("/media", media)
        // Base64 photos outgrow axum's 2 MB default
        .layer(DefaultBodyLimit::max(body_limit))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
