pub mod actions;
pub mod assistant;
pub mod attachments;
pub mod audio;
pub mod composer;
pub mod config;
pub mod error;
pub mod http;
pub mod nats;
pub mod pipeline;
pub mod recording;
pub mod store;

pub use actions::{ActionList, ActionQuery, EcoAction, NewEcoAction};
pub use assistant::{ChatMessage, EcoAssistant, Role};
pub use attachments::{AttachmentKind, AttachmentPreviewManager, PhotoFile, PreviewHandle, PreviewRegistry};
pub use audio::{
    AudioClip, AudioFrame, MediaStream, MediaTrack, MicrophoneDevice, MicrophoneFactory,
    SyntheticMicrophone,
};
pub use composer::{ActionComposer, ActionDraft};
pub use config::Config;
pub use error::{AttachmentError, CaptureError, ComposeError, DraftError, SubmitError};
pub use http::{create_router, AppState};
pub use nats::NatsRealtimeStore;
pub use pipeline::{ActionSubmissionPipeline, ImpactScorer, PipelineConfig, SubmissionReceipt, UploadFailure};
pub use recording::{MediaRecorderSession, RecorderState};
pub use store::{LocalObjectStore, MemoryRecordStore, ObjectStore, RecordStore};
