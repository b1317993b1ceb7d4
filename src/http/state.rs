use crate::assistant::EcoAssistant;
use crate::attachments::PreviewRegistry;
use crate::pipeline::ActionSubmissionPipeline;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Submission pipeline for the configured user
    pub pipeline: Arc<ActionSubmissionPipeline>,

    /// Single assistant conversation
    pub assistant: Arc<Mutex<EcoAssistant>>,

    /// Registry backing attachment previews
    pub previews: Arc<PreviewRegistry>,

    /// Directory served under `/media`
    pub media_root: PathBuf,

    pub max_photo_bytes: u64,

    pub goal_points: u32,
}

impl AppState {
    pub fn new(
        pipeline: Arc<ActionSubmissionPipeline>,
        assistant: EcoAssistant,
        previews: Arc<PreviewRegistry>,
        media_root: PathBuf,
    ) -> Self {
        Self {
            pipeline,
            assistant: Arc::new(Mutex::new(assistant)),
            previews,
            media_root,
            max_photo_bytes: crate::config::DEFAULT_MAX_PHOTO_BYTES,
            goal_points: 50,
        }
    }
}
