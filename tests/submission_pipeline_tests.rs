// Integration tests for the submission pipeline
//
// Covers optimistic insert, best-effort uploads, persistence failure,
// realtime reconciliation and identity switches.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::Utc;
use eco_echo::actions::{ActionList, ActionQuery, EcoAction, NewEcoAction};
use eco_echo::attachments::{AttachmentKind, PhotoFile, PreviewRegistry};
use eco_echo::audio::{AudioClip, SyntheticMicrophone};
use eco_echo::composer::{ActionComposer, ActionDraft, MEDIA_ONLY_DESCRIPTION};
use eco_echo::error::{ComposeError, DraftError, SubmitError};
use eco_echo::pipeline::{ActionSubmissionPipeline, ImpactScorer, PipelineConfig};
use eco_echo::recording::RecorderState;
use eco_echo::store::{LocalObjectStore, MemoryRecordStore, ObjectStore, RecordFeed, RecordStore};

/// Object store that refuses every upload
struct FailingObjectStore;

#[async_trait::async_trait]
impl ObjectStore for FailingObjectStore {
    async fn upload(&self, bucket: &str, _path: &str, _bytes: Vec<u8>, _content_type: &str) -> Result<String> {
        bail!("bucket {} is unavailable", bucket)
    }
}

/// Record store whose inserts always fail
struct FailingRecordStore {
    inner: MemoryRecordStore,
}

#[async_trait::async_trait]
impl RecordStore for FailingRecordStore {
    async fn insert(&self, _action: NewEcoAction) -> Result<EcoAction> {
        bail!("row level security violation")
    }

    async fn query(&self, query: &ActionQuery) -> Result<Vec<EcoAction>> {
        self.inner.query(query).await
    }

    async fn subscribe(&self, user_id: &str) -> Result<RecordFeed> {
        self.inner.subscribe(user_id).await
    }
}

/// Record store that holds every insert until the test lets it through
struct GatedRecordStore {
    inner: MemoryRecordStore,
    entered: tokio::sync::Notify,
    release: tokio::sync::Notify,
}

#[async_trait::async_trait]
impl RecordStore for GatedRecordStore {
    async fn insert(&self, action: NewEcoAction) -> Result<EcoAction> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.insert(action).await
    }

    async fn query(&self, query: &ActionQuery) -> Result<Vec<EcoAction>> {
        self.inner.query(query).await
    }

    async fn subscribe(&self, user_id: &str) -> Result<RecordFeed> {
        self.inner.subscribe(user_id).await
    }
}

struct Harness {
    pipeline: ActionSubmissionPipeline,
    records: Arc<MemoryRecordStore>,
    _media: tempfile::TempDir,
}

fn harness(user: &str) -> Harness {
    let media = tempfile::tempdir().unwrap();
    let records = Arc::new(MemoryRecordStore::new());
    let objects = Arc::new(LocalObjectStore::new(media.path(), "http://test/media"));

    let pipeline = ActionSubmissionPipeline::new(
        user,
        records.clone(),
        objects,
        ActionList::new(),
        PipelineConfig {
            scorer: ImpactScorer::Fixed(3),
            ..PipelineConfig::default()
        },
    );

    Harness {
        pipeline,
        records,
        _media: media,
    }
}

fn photo() -> PhotoFile {
    PhotoFile::new("bike.png", "image/png", vec![7; 64])
}

fn clip() -> AudioClip {
    AudioClip {
        bytes: vec![1; 32],
        content_type: "audio/wav".to_string(),
        duration_secs: 2,
    }
}

fn external(user: &str, description: &str) -> NewEcoAction {
    NewEcoAction {
        user_id: user.to_string(),
        description: description.to_string(),
        impact_score: 1,
        action_date: Utc::now().date_naive(),
        photo_url: None,
        audio_url: None,
    }
}

async fn wait_for_len(list: &ActionList, len: usize) {
    for _ in 0..100 {
        if list.len().await == len {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("list never reached {} entries (has {})", len, list.len().await);
}

#[tokio::test]
async fn test_submit_places_action_at_head() {
    let h = harness("alice");
    h.pipeline
        .list()
        .insert_front(h.records.insert(external("alice", "older")).await.unwrap())
        .await;

    let draft = ActionDraft::new("Biked to work", Some(photo()), Some(clip())).unwrap();
    let receipt = h.pipeline.submit(draft).await.unwrap();

    assert!(receipt.is_complete());
    let action = &receipt.action;
    assert_eq!(action.user_id, "alice");
    assert_eq!(action.description, "Biked to work");
    assert_eq!(action.impact_score, 3);
    assert_eq!(action.action_date, Utc::now().date_naive());

    let photo_url = action.photo_url.as_deref().unwrap();
    assert!(photo_url.starts_with("http://test/media/eco-photos/alice/"));
    assert!(photo_url.ends_with(".png"));
    let audio_url = action.audio_url.as_deref().unwrap();
    assert!(audio_url.starts_with("http://test/media/eco-audio/alice/"));
    assert!(audio_url.ends_with(".wav"));

    let list = h.pipeline.list();
    assert_eq!(list.len().await, 2);
    assert_eq!(list.head().await.unwrap().id, action.id);
}

#[tokio::test]
async fn test_empty_draft_never_reaches_pipeline() {
    let h = harness("alice");
    let mut composer = ActionComposer::new(
        Arc::new(SyntheticMicrophone::new(16000, 1, 100)),
        PreviewRegistry::new(),
    );
    composer.set_text("   ");

    let result = composer.submit(&h.pipeline).await;
    assert!(matches!(result, Err(ComposeError::Draft(DraftError::EmptyDraft))));
    assert!(result.unwrap_err().is_warning());
    assert!(h.pipeline.list().is_empty().await);
    assert!(h.records.query(&ActionQuery::for_user("alice")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_media_only_action_gets_placeholder_description() {
    let h = harness("alice");
    let draft = ActionDraft::new("", Some(photo()), None).unwrap();

    let receipt = h.pipeline.submit(draft).await.unwrap();
    assert_eq!(receipt.action.description, MEDIA_ONLY_DESCRIPTION);
    assert!(receipt.action.photo_url.is_some());
    assert!(receipt.action.audio_url.is_none());
}

#[tokio::test]
async fn test_explicit_score_is_kept() {
    let h = harness("alice");
    let draft = ActionDraft::new("Planted a tree", None, None)
        .unwrap()
        .with_impact_score(5);

    let receipt = h.pipeline.submit(draft).await.unwrap();
    assert_eq!(receipt.action.impact_score, 5);
}

#[tokio::test]
async fn test_upload_failure_degrades_record() {
    let records = Arc::new(MemoryRecordStore::new());
    let pipeline = ActionSubmissionPipeline::new(
        "alice",
        records.clone(),
        Arc::new(FailingObjectStore),
        ActionList::new(),
        PipelineConfig::default(),
    );

    let draft = ActionDraft::new("Composted", Some(photo()), Some(clip())).unwrap();
    let receipt = pipeline.submit(draft).await.unwrap();

    assert!(!receipt.is_complete());
    let kinds: Vec<AttachmentKind> = receipt.upload_failures.iter().map(|f| f.kind).collect();
    assert_eq!(kinds, vec![AttachmentKind::Photo, AttachmentKind::Audio]);
    assert!(receipt.upload_failures[0].reason.contains("eco-photos"));

    assert!(receipt.action.photo_url.is_none());
    assert!(receipt.action.audio_url.is_none());
    assert_eq!(receipt.action.description, "Composted");
    assert_eq!(pipeline.list().len().await, 1);
}

#[tokio::test]
async fn test_persistence_failure_leaves_list_unchanged() {
    let media = tempfile::tempdir().unwrap();
    let pipeline = ActionSubmissionPipeline::new(
        "alice",
        Arc::new(FailingRecordStore {
            inner: MemoryRecordStore::new(),
        }),
        Arc::new(LocalObjectStore::new(media.path(), "http://test/media")),
        ActionList::new(),
        PipelineConfig::default(),
    );

    let draft = ActionDraft::new("Fixed a leak", None, None).unwrap();
    let result = pipeline.submit(draft).await;

    match result {
        Err(SubmitError::Persistence(e)) => {
            assert!(e.to_string().contains("row level security"));
        }
        other => panic!("expected persistence failure, got {:?}", other.map(|r| r.action.id)),
    }
    assert!(pipeline.list().is_empty().await);
}

#[tokio::test]
async fn test_composer_resets_before_pipeline_runs() {
    let h = harness("alice");
    let registry = PreviewRegistry::new();
    let mut composer = ActionComposer::new(
        Arc::new(SyntheticMicrophone::new(16000, 1, 100)),
        registry.clone(),
    );

    composer.set_text("Line-dried laundry");
    composer.attach_photo(photo()).unwrap();
    assert!(composer.can_submit());

    let receipt = composer.submit(&h.pipeline).await.unwrap();
    assert_eq!(receipt.action.description, "Line-dried laundry");

    assert_eq!(composer.text(), "");
    assert!(composer.attachments().is_empty());
    assert!(!composer.can_submit());
    assert_eq!(registry.live(), 0);

    // A second submit of the same form is an empty draft
    assert!(composer.submit(&h.pipeline).await.is_err());
    assert_eq!(h.pipeline.list().len().await, 1);
}

#[tokio::test]
async fn test_realtime_push_of_own_insert_is_deduplicated() {
    let h = harness("alice");
    h.pipeline.open_realtime().await.unwrap();

    let draft = ActionDraft::new("Took the train", None, None).unwrap();
    let receipt = h.pipeline.submit(draft).await.unwrap();

    // Let the push for our own insert land
    tokio::time::sleep(Duration::from_millis(50)).await;

    let list = h.pipeline.list();
    assert_eq!(list.len().await, 1);
    assert!(list.contains(receipt.action.id).await);
}

#[tokio::test]
async fn test_realtime_push_from_elsewhere_lands_at_head() {
    let h = harness("alice");
    h.pipeline.open_realtime().await.unwrap();

    h.records.insert(external("bob", "not mine")).await.unwrap();
    let pushed = h.records.insert(external("alice", "from my phone")).await.unwrap();

    wait_for_len(h.pipeline.list(), 1).await;
    assert_eq!(h.pipeline.list().head().await.unwrap().id, pushed.id);
}

#[tokio::test]
async fn test_switch_user_tears_down_old_subscription() {
    let h = harness("alice");
    h.records.insert(external("bob", "bob's earlier action")).await.unwrap();
    h.pipeline.open_realtime().await.unwrap();
    assert_eq!(h.pipeline.realtime_user().await.as_deref(), Some("alice"));

    h.pipeline.switch_user("bob").await.unwrap();
    assert_eq!(h.pipeline.user_id().await, "bob");
    assert_eq!(h.pipeline.realtime_user().await.as_deref(), Some("bob"));
    assert_eq!(h.pipeline.list().len().await, 1);

    // Pushes for the previous user no longer land
    h.records.insert(external("alice", "stale")).await.unwrap();
    let fresh = h.records.insert(external("bob", "fresh")).await.unwrap();

    wait_for_len(h.pipeline.list(), 2).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let list = h.pipeline.list().snapshot().await;
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].id, fresh.id);
    assert!(list.iter().all(|a| a.user_id == "bob"));
}

#[tokio::test]
async fn test_close_realtime_stops_pushes() {
    let h = harness("alice");
    h.pipeline.open_realtime().await.unwrap();
    h.pipeline.close_realtime().await;
    assert!(h.pipeline.realtime_user().await.is_none());

    h.records.insert(external("alice", "after close")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.pipeline.list().is_empty().await);
}

#[tokio::test]
async fn test_refresh_loads_newest_first() {
    let h = harness("alice");
    h.records.insert(external("alice", "first")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    h.records.insert(external("alice", "second")).await.unwrap();

    let loaded = h.pipeline.refresh().await.unwrap();
    assert_eq!(loaded, 2);
    assert_eq!(h.pipeline.list().head().await.unwrap().description, "second");
}

#[tokio::test]
async fn test_user_switch_during_insert_keeps_lists_apart() {
    let media = tempfile::tempdir().unwrap();
    let records = Arc::new(GatedRecordStore {
        inner: MemoryRecordStore::new(),
        entered: tokio::sync::Notify::new(),
        release: tokio::sync::Notify::new(),
    });
    let pipeline = Arc::new(ActionSubmissionPipeline::new(
        "alice",
        records.clone(),
        Arc::new(LocalObjectStore::new(media.path(), "http://test/media")),
        ActionList::new(),
        PipelineConfig::default(),
    ));

    let submitting = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            let draft = ActionDraft::new("Alice's commute", None, None).unwrap();
            pipeline.submit(draft).await
        })
    };

    records.entered.notified().await;
    pipeline.switch_user("bob").await.unwrap();
    records.release.notify_one();

    let receipt = submitting.await.unwrap().unwrap();
    assert_eq!(receipt.action.user_id, "alice");

    // Stored for alice, but never shown in bob's list
    assert!(!pipeline.list().contains(receipt.action.id).await);
    assert!(pipeline.list().is_empty().await);
    let stored = records.query(&ActionQuery::for_user("alice")).await.unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_composer_records_attaches_and_submits_voice_note() {
    let h = harness("alice");
    let registry = PreviewRegistry::new();
    let mut composer = ActionComposer::new(
        Arc::new(SyntheticMicrophone::new(8000, 1, 100)),
        registry.clone(),
    );

    composer.set_text("Explained composting to a neighbour");
    composer.start_recording().await.unwrap();
    assert!(composer.recorder().is_recording());

    tokio::time::sleep(Duration::from_secs(2)).await;
    let preview = composer.stop_recording().await.unwrap();

    assert_eq!(composer.recorder().state(), RecorderState::Stopped);
    let audio = composer.attachments().audio().unwrap();
    assert_eq!(audio.clip.duration_secs, 2);
    assert_eq!(audio.preview.url(), preview);
    assert_eq!(registry.resolve(&preview).unwrap().content_type, "audio/wav");

    let receipt = composer.submit(&h.pipeline).await.unwrap();
    assert!(receipt.is_complete());
    let audio_url = receipt.action.audio_url.as_deref().unwrap();
    assert!(audio_url.starts_with("http://test/media/eco-audio/alice/"));
    assert!(audio_url.ends_with(".wav"));

    // Form, recorder and previews are all back to a blank slate
    assert_eq!(composer.text(), "");
    assert!(composer.attachments().is_empty());
    assert_eq!(composer.recorder().state(), RecorderState::Idle);
    assert_eq!(composer.recorder().elapsed_label(), "0:00");
    assert!(registry.resolve(&preview).is_none());
    assert_eq!(registry.live(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_composer_discard_recording() {
    let registry = PreviewRegistry::new();
    let mut composer = ActionComposer::new(
        Arc::new(SyntheticMicrophone::new(8000, 1, 100)),
        registry.clone(),
    );

    composer.start_recording().await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    composer.stop_recording().await.unwrap();
    assert!(composer.can_submit());

    composer.discard_recording();
    assert!(composer.attachments().audio().is_none());
    assert_eq!(composer.recorder().state(), RecorderState::Idle);
    assert!(composer.recorder().clip().is_none());
    assert!(!composer.can_submit());
    assert_eq!(registry.live(), 0);

    // Discarding mid-take also stops the recorder
    composer.start_recording().await.unwrap();
    composer.discard_recording();
    assert_eq!(composer.recorder().state(), RecorderState::Idle);
}
