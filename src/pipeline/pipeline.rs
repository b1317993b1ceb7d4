use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::realtime::RealtimeSubscription;
use super::scoring::ImpactScorer;
use crate::actions::{ActionList, ActionQuery, EcoAction, NewEcoAction};
use crate::attachments::{AttachmentKind, PhotoFile};
use crate::audio::AudioClip;
use crate::composer::{ActionDraft, MEDIA_ONLY_DESCRIPTION};
use crate::config::StorageConfig;
use crate::error::SubmitError;
use crate::store::{ObjectStore, RecordStore};

/// Where a submission is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    Composing,
    Uploading,
    Persisting,
    Committed,
    Failed,
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Composing => "composing",
            Self::Uploading => "uploading",
            Self::Persisting => "persisting",
            Self::Committed => "committed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// An attachment that could not be uploaded. The action was still logged,
/// just without that attachment's URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadFailure {
    pub kind: AttachmentKind,
    pub reason: String,
}

/// Outcome of a committed submission
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub action: EcoAction,
    pub upload_failures: Vec<UploadFailure>,
}

impl SubmissionReceipt {
    /// Every attachment made it into the record
    pub fn is_complete(&self) -> bool {
        self.upload_failures.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub photo_bucket: String,
    pub audio_bucket: String,
    pub scorer: ImpactScorer,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let storage = StorageConfig::default();
        Self {
            photo_bucket: storage.photo_bucket,
            audio_bucket: storage.audio_bucket,
            scorer: ImpactScorer::Random,
        }
    }
}

impl PipelineConfig {
    pub fn from_storage(storage: &StorageConfig) -> Self {
        Self {
            photo_bucket: storage.photo_bucket.clone(),
            audio_bucket: storage.audio_bucket.clone(),
            scorer: ImpactScorer::Random,
        }
    }
}

/// Turns drafts into persisted eco actions for the signed-in user.
///
/// Attachments are best effort: an upload that fails is logged and left
/// out of the record, and the action is logged anyway. Only a failed insert
/// fails the submission. In-flight submissions cannot be cancelled.
pub struct ActionSubmissionPipeline {
    user_id: RwLock<String>,
    records: Arc<dyn RecordStore>,
    objects: Arc<dyn ObjectStore>,
    list: ActionList,
    config: PipelineConfig,
    subscription: Mutex<Option<RealtimeSubscription>>,
}

impl ActionSubmissionPipeline {
    pub fn new(
        user_id: impl Into<String>,
        records: Arc<dyn RecordStore>,
        objects: Arc<dyn ObjectStore>,
        list: ActionList,
        config: PipelineConfig,
    ) -> Self {
        Self {
            user_id: RwLock::new(user_id.into()),
            records,
            objects,
            list,
            config,
            subscription: Mutex::new(None),
        }
    }

    pub fn list(&self) -> &ActionList {
        &self.list
    }

    pub async fn user_id(&self) -> String {
        self.user_id.read().await.clone()
    }

    /// Submit one draft
    pub async fn submit(&self, draft: ActionDraft) -> Result<SubmissionReceipt, SubmitError> {
        let user_id = self.user_id().await;
        let mut stage = SubmissionStage::Composing;

        let (text, photo, audio, requested_score) = draft.into_parts();

        if photo.is_some() || audio.is_some() {
            stage = self.advance(stage, SubmissionStage::Uploading);
        }

        // Both uploads settle before the insert goes out
        let (photo_result, audio_result) = tokio::join!(
            self.upload_photo(&user_id, photo),
            self.upload_audio(&user_id, audio),
        );

        let mut upload_failures = Vec::new();
        let photo_url = settle_upload(AttachmentKind::Photo, photo_result, &mut upload_failures);
        let audio_url = settle_upload(AttachmentKind::Audio, audio_result, &mut upload_failures);

        stage = self.advance(stage, SubmissionStage::Persisting);

        let description = if text.is_empty() {
            MEDIA_ONLY_DESCRIPTION.to_string()
        } else {
            text
        };

        let new_action = NewEcoAction {
            user_id: user_id.clone(),
            description,
            impact_score: self.config.scorer.score(requested_score),
            action_date: Utc::now().date_naive(),
            photo_url,
            audio_url,
        };

        let action = match self.records.insert(new_action).await {
            Ok(action) => action,
            Err(e) => {
                error!("Error adding eco action: {:#}", e);
                self.advance(stage, SubmissionStage::Failed);
                return Err(SubmitError::Persistence(e));
            }
        };

        // The signed-in user may have changed while the insert was in flight
        let current_user = self.user_id().await;
        if action.user_id == current_user {
            self.list.insert_front(action.clone()).await;
        } else {
            info!(
                "Action {} belongs to {}, not listing it for {}",
                action.id, action.user_id, current_user
            );
        }
        self.advance(stage, SubmissionStage::Committed);

        info!(
            "Action logged! {} earned {} eco points ({})",
            user_id, action.impact_score, action.id
        );

        Ok(SubmissionReceipt {
            action,
            upload_failures,
        })
    }

    fn advance(&self, from: SubmissionStage, to: SubmissionStage) -> SubmissionStage {
        info!("Submission {} -> {}", from, to);
        to
    }

    async fn upload_photo(&self, user_id: &str, photo: Option<PhotoFile>) -> Option<Result<String>> {
        let photo = photo?;
        let path = object_path(user_id, &photo.extension());
        Some(
            self.objects
                .upload(&self.config.photo_bucket, &path, photo.bytes, &photo.content_type)
                .await,
        )
    }

    async fn upload_audio(&self, user_id: &str, audio: Option<AudioClip>) -> Option<Result<String>> {
        let audio = audio?;
        let path = object_path(user_id, audio.extension());
        Some(
            self.objects
                .upload(&self.config.audio_bucket, &path, audio.bytes, &audio.content_type)
                .await,
        )
    }

    /// Replace the local list with the store's view, newest first
    pub async fn refresh(&self) -> Result<usize> {
        let user_id = self.user_id().await;
        let actions = self.records.query(&ActionQuery::for_user(&user_id)).await.map_err(|e| {
            error!("Error fetching eco actions: {:#}", e);
            e
        })?;

        let count = actions.len();
        self.list.replace_all(actions).await;
        info!("Loaded {} eco actions for {}", count, user_id);

        Ok(count)
    }

    /// Start folding realtime pushes for the current user into the list.
    /// Replaces any existing subscription.
    pub async fn open_realtime(&self) -> Result<()> {
        let user_id = self.user_id().await;
        let mut slot = self.subscription.lock().await;

        // Old listener goes before the new one starts
        slot.take();

        let subscription =
            RealtimeSubscription::open(self.records.as_ref(), &user_id, self.list.clone()).await?;
        *slot = Some(subscription);

        Ok(())
    }

    pub async fn close_realtime(&self) {
        if let Some(subscription) = self.subscription.lock().await.take() {
            subscription.unsubscribe();
        }
    }

    /// User the open subscription is filtered on, if any
    pub async fn realtime_user(&self) -> Option<String> {
        self.subscription
            .lock()
            .await
            .as_ref()
            .filter(|s| s.is_active())
            .map(|s| s.user_id().to_string())
    }

    /// Change identity: drop the old user's subscription, reload the list
    /// for the new user and resubscribe if a subscription was open.
    pub async fn switch_user(&self, user_id: impl Into<String>) -> Result<()> {
        let user_id = user_id.into();
        let was_subscribed = self.subscription.lock().await.take().is_some();

        info!("Switching user to {}", user_id);
        *self.user_id.write().await = user_id;

        self.list.replace_all(Vec::new()).await;
        if let Err(e) = self.refresh().await {
            warn!("List not reloaded after user switch: {:#}", e);
        }

        if was_subscribed {
            self.open_realtime().await?;
        }

        Ok(())
    }
}

fn object_path(user_id: &str, extension: &str) -> String {
    format!("{}/{}.{}", user_id, Uuid::new_v4(), extension)
}

fn settle_upload(
    kind: AttachmentKind,
    result: Option<Result<String>>,
    failures: &mut Vec<UploadFailure>,
) -> Option<String> {
    match result? {
        Ok(url) => Some(url),
        Err(e) => {
            warn!("{:?} upload failed, logging action without it: {:#}", kind, e);
            failures.push(UploadFailure {
                kind,
                reason: format!("{:#}", e),
            });
            None
        }
    }
}
