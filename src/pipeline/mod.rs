//! Submission pipeline
//!
//! Composing → Uploading → Persisting → Committed (or Failed), plus the
//! realtime subscription that reconciles pushed inserts with optimistic
//! ones by id.

mod pipeline;
mod realtime;
mod scoring;

pub use pipeline::{ActionSubmissionPipeline, PipelineConfig, SubmissionReceipt, SubmissionStage, UploadFailure};
pub use realtime::RealtimeSubscription;
pub use scoring::{ImpactScorer, MAX_IMPACT_SCORE, MIN_IMPACT_SCORE};
