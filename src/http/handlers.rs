use super::state::AppState;
use crate::actions::EcoAction;
use crate::assistant::ChatMessageView;
use crate::attachments::{AttachmentPreviewManager, PhotoFile};
use crate::audio::{AudioClip, WAV_CONTENT_TYPE};
use crate::composer::ActionDraft;
use crate::error::{AttachmentError, DraftError};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PhotoUpload {
    pub name: String,
    pub content_type: String,
    /// Base64-encoded file bytes
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub struct AudioUpload {
    pub content_type: Option<String>,
    /// Base64-encoded audio bytes
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitActionRequest {
    #[serde(default)]
    pub description: String,

    /// Explicit score; omitted means the placeholder heuristic picks one
    pub impact_score: Option<u32>,

    pub photo: Option<PhotoUpload>,

    pub audio: Option<AudioUpload>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub action_count: usize,
    pub total_points: u64,
    pub goal_points: u32,
    pub progress_percent: u8,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub loaded: usize,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn decode(field: &str, data: &str) -> Result<Vec<u8>, Response> {
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, format!("Invalid base64 in {}: {}", field, e)))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /actions
/// The user's actions, newest first
pub async fn list_actions(State(state): State<AppState>) -> Json<Vec<EcoAction>> {
    Json(state.pipeline.list().snapshot().await)
}

/// POST /actions
/// Log a new eco action
pub async fn submit_action(
    State(state): State<AppState>,
    Json(req): Json<SubmitActionRequest>,
) -> Response {
    // Same slot rules as the composer form
    let mut attachments =
        AttachmentPreviewManager::with_photo_limit(Arc::clone(&state.previews), state.max_photo_bytes);

    if let Some(photo) = req.photo {
        let bytes = match decode("photo", &photo.data) {
            Ok(bytes) => bytes,
            Err(resp) => return resp,
        };
        if let Err(e @ AttachmentError::FileTooLarge { .. }) =
            attachments.attach_photo(PhotoFile::new(photo.name, photo.content_type, bytes))
        {
            warn!("Rejected photo upload: {}", e);
            return error_response(StatusCode::PAYLOAD_TOO_LARGE, e.to_string());
        }
    }

    if let Some(audio) = req.audio {
        let bytes = match decode("audio", &audio.data) {
            Ok(bytes) => bytes,
            Err(resp) => return resp,
        };
        let content_type = audio.content_type.unwrap_or_else(|| WAV_CONTENT_TYPE.to_string());
        attachments.attach_audio(AudioClip::from_encoded(bytes, content_type));
    }

    let (photo, audio) = attachments.take_media();
    let draft = match ActionDraft::new(&req.description, photo, audio) {
        Ok(draft) => draft,
        Err(e @ DraftError::EmptyDraft) => {
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string());
        }
    };
    let draft = match req.impact_score {
        Some(score) => draft.with_impact_score(score),
        None => draft,
    };

    match state.pipeline.submit(draft).await {
        Ok(receipt) => {
            info!("Logged action {} over HTTP", receipt.action.id);
            (StatusCode::CREATED, Json(receipt)).into_response()
        }
        Err(e) => {
            error!("Submission failed: {}", e);
            error_response(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

/// POST /actions/refresh
/// Reload the list from the record store
pub async fn refresh_actions(State(state): State<AppState>) -> Response {
    match state.pipeline.refresh().await {
        Ok(loaded) => (StatusCode::OK, Json(RefreshResponse { loaded })).into_response(),
        Err(e) => error_response(
            StatusCode::BAD_GATEWAY,
            format!("Failed to load your eco actions: {:#}", e),
        ),
    }
}

/// GET /stats
/// Point tally and progress toward the goal
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let list = state.pipeline.list();
    Json(StatsResponse {
        action_count: list.len().await,
        total_points: list.total_points().await,
        goal_points: state.goal_points,
        progress_percent: list.progress_percent(state.goal_points).await,
    })
}

/// GET /assistant
/// Conversation so far
pub async fn get_assistant_thread(State(state): State<AppState>) -> Json<Vec<ChatMessageView>> {
    Json(state.assistant.lock().await.views())
}

/// POST /assistant
/// Ask the assistant something
pub async fn ask_assistant(State(state): State<AppState>, Json(req): Json<AskRequest>) -> Response {
    let draft = match ActionDraft::new(&req.message, None, None) {
        Ok(draft) => draft,
        Err(e) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
    };

    let delay = {
        let mut assistant = state.assistant.lock().await;
        assistant.post_user(draft);
        assistant.thinking_delay()
    };

    // Thread stays readable while the assistant "thinks"
    tokio::time::sleep(delay).await;

    let reply = ChatMessageView::from(state.assistant.lock().await.post_reply());

    (StatusCode::OK, Json(reply)).into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
