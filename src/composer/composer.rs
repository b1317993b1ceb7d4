use std::sync::Arc;

use tracing::{info, warn};

use super::draft::{is_submittable, ActionDraft};
use crate::attachments::{AttachmentPreviewManager, PhotoFile, PreviewRegistry};
use crate::audio::MicrophoneDevice;
use crate::error::{AttachmentError, CaptureError, ComposeError, DraftError};
use crate::pipeline::{ActionSubmissionPipeline, SubmissionReceipt};
use crate::recording::{MediaRecorderSession, RecorderState};

/// The "log new eco action" form: free text, one photo, one voice note.
pub struct ActionComposer {
    text: String,
    attachments: AttachmentPreviewManager,
    recorder: MediaRecorderSession,
}

impl ActionComposer {
    pub fn new(microphone: Arc<dyn MicrophoneDevice>, previews: Arc<PreviewRegistry>) -> Self {
        Self {
            text: String::new(),
            attachments: AttachmentPreviewManager::new(previews),
            recorder: MediaRecorderSession::new(microphone),
        }
    }

    pub fn with_photo_limit(mut self, max_photo_bytes: u64) -> Self {
        let registry = Arc::clone(self.attachments.registry());
        self.attachments = AttachmentPreviewManager::with_photo_limit(registry, max_photo_bytes);
        self
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attachments(&self) -> &AttachmentPreviewManager {
        &self.attachments
    }

    pub fn recorder(&self) -> &MediaRecorderSession {
        &self.recorder
    }

    pub fn attach_photo(&mut self, file: PhotoFile) -> Result<String, AttachmentError> {
        self.attachments.attach_photo(file).map_err(|e| {
            warn!("Photo rejected: {}", e);
            e
        })
    }

    pub fn remove_photo(&mut self) {
        self.attachments.remove_photo();
    }

    pub async fn start_recording(&mut self) -> Result<(), CaptureError> {
        self.recorder.start().await
    }

    /// Stop the recorder and attach the clip as this draft's voice note.
    /// Returns the preview reference.
    pub async fn stop_recording(&mut self) -> Result<String, CaptureError> {
        let clip = self.recorder.stop().await?;
        Ok(self.attachments.attach_audio(clip))
    }

    /// Drop the voice note and return the recorder to idle
    pub fn discard_recording(&mut self) {
        self.attachments.remove_audio();
        self.recorder.reset();
    }

    pub fn can_submit(&self) -> bool {
        is_submittable(
            &self.text,
            self.attachments.photo().is_some(),
            self.attachments.audio().is_some(),
        )
    }

    /// Snapshot the draft and clear the form in one step, so the same draft
    /// can never be handed out twice. On `EmptyDraft` nothing changes.
    pub fn take_draft(&mut self) -> Result<ActionDraft, DraftError> {
        if !self.can_submit() {
            return Err(DraftError::EmptyDraft);
        }

        // A take still running is not part of the draft
        if self.recorder.state() == RecorderState::Recording {
            warn!("Submitting while recording, the unfinished voice note is discarded");
        }

        let (photo, audio) = self.attachments.take_media();
        let draft = ActionDraft::new(&self.text, photo, audio)?;

        self.reset();

        Ok(draft)
    }

    /// Clear text, attachments and recorder
    pub fn reset(&mut self) {
        self.text.clear();
        self.attachments.clear();
        self.recorder.reset();
    }

    /// Take the draft and run it through the pipeline. The form is already
    /// cleared when the pipeline starts; a failed submission does not
    /// restore it.
    pub async fn submit(
        &mut self,
        pipeline: &ActionSubmissionPipeline,
    ) -> Result<SubmissionReceipt, ComposeError> {
        let draft = self.take_draft().map_err(|e| {
            info!("{}", e);
            e
        })?;

        Ok(pipeline.submit(draft).await?)
    }
}
