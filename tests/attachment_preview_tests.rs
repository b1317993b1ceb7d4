// Integration tests for attachment slots and preview references
//
// Every preview reference must be revoked exactly once: on replace, on
// remove, on clear, or when the manager goes away.

use eco_echo::attachments::{AttachmentKind, AttachmentPreviewManager, PhotoFile, PreviewRegistry};
use eco_echo::audio::AudioClip;
use eco_echo::error::AttachmentError;

const FIVE_MIB: usize = 5 * 1024 * 1024;

fn photo(size: usize) -> PhotoFile {
    PhotoFile::new("tree.jpg", "image/jpeg", vec![0xAB; size])
}

fn clip(secs: u64) -> AudioClip {
    AudioClip {
        bytes: vec![1, 2, 3, 4],
        content_type: "audio/wav".to_string(),
        duration_secs: secs,
    }
}

#[test]
fn test_photo_of_exactly_five_mib_is_accepted() {
    let registry = PreviewRegistry::new();
    let mut manager = AttachmentPreviewManager::new(registry.clone());

    let url = manager.attach_photo(photo(FIVE_MIB)).unwrap();
    assert!(registry.resolve(&url).is_some());
    assert_eq!(manager.photo().unwrap().file.size(), FIVE_MIB as u64);
}

#[test]
fn test_photo_one_byte_over_limit_is_rejected() {
    let registry = PreviewRegistry::new();
    let mut manager = AttachmentPreviewManager::new(registry.clone());

    let result = manager.attach_photo(photo(FIVE_MIB + 1));
    assert_eq!(
        result,
        Err(AttachmentError::FileTooLarge {
            size: FIVE_MIB as u64 + 1,
            limit: FIVE_MIB as u64,
        })
    );
    assert!(manager.photo().is_none());
    // No preview was created for the rejected file
    assert_eq!(registry.created(), 0);
}

#[test]
fn test_rejected_photo_keeps_previous_one() {
    let registry = PreviewRegistry::new();
    let mut manager = AttachmentPreviewManager::new(registry.clone());

    let url = manager.attach_photo(photo(10)).unwrap();
    assert!(manager.attach_photo(photo(FIVE_MIB + 1)).is_err());

    assert!(registry.resolve(&url).is_some());
    assert_eq!(manager.photo().unwrap().preview.url(), url);
}

#[test]
fn test_replacing_photo_revokes_old_preview() {
    let registry = PreviewRegistry::new();
    let mut manager = AttachmentPreviewManager::new(registry.clone());

    let first = manager.attach_photo(photo(10)).unwrap();
    let second = manager.attach_photo(photo(20)).unwrap();

    assert_ne!(first, second);
    assert!(registry.resolve(&first).is_none());
    assert!(registry.resolve(&second).is_some());
    assert_eq!(registry.created(), 2);
    assert_eq!(registry.revoked(), 1);
}

#[test]
fn test_replacing_audio_revokes_old_preview() {
    let registry = PreviewRegistry::new();
    let mut manager = AttachmentPreviewManager::new(registry.clone());

    let first = manager.attach_audio(clip(2));
    let second = manager.attach_audio(clip(4));

    assert!(registry.resolve(&first).is_none());
    let content = registry.resolve(&second).unwrap();
    assert_eq!(content.content_type, "audio/wav");
    assert_eq!(manager.audio().unwrap().clip.duration_secs, 4);
}

#[test]
fn test_remove_is_idempotent() {
    let registry = PreviewRegistry::new();
    let mut manager = AttachmentPreviewManager::new(registry.clone());

    manager.attach_photo(photo(10)).unwrap();
    manager.attach_audio(clip(1));

    manager.remove_photo();
    manager.remove_photo();
    manager.remove_audio();
    manager.remove_audio();

    assert!(manager.is_empty());
    assert_eq!(registry.created(), 2);
    assert_eq!(registry.revoked(), 2);
}

#[test]
fn test_clear_revokes_both_slots() {
    let registry = PreviewRegistry::new();
    let mut manager = AttachmentPreviewManager::new(registry.clone());

    manager.attach_photo(photo(10)).unwrap();
    manager.attach_audio(clip(1));
    assert_eq!(registry.live(), 2);

    manager.clear();
    manager.clear();
    assert_eq!(registry.live(), 0);
    assert_eq!(registry.revoked(), 2);
}

#[test]
fn test_every_preview_revoked_exactly_once() {
    let registry = PreviewRegistry::new();
    {
        let mut manager = AttachmentPreviewManager::new(registry.clone());

        // replace, remove, clear and teardown paths all in one lifetime
        manager.attach_photo(photo(1)).unwrap();
        manager.attach_photo(photo(2)).unwrap();
        manager.remove_photo();
        manager.attach_audio(clip(1));
        manager.attach_audio(clip(2));
        manager.attach_photo(photo(3)).unwrap();
        manager.clear();
        manager.attach_photo(photo(4)).unwrap();
        manager.attach_audio(clip(3));
        let _ = manager.take_media();
        manager.attach_photo(photo(5)).unwrap();
    }

    assert_eq!(registry.created(), 8);
    assert_eq!(registry.revoked(), 8);
    assert_eq!(registry.live(), 0);
}

#[test]
fn test_attachments_view() {
    let registry = PreviewRegistry::new();
    let mut manager = AttachmentPreviewManager::new(registry);

    manager.attach_audio(clip(3));
    manager.attach_photo(photo(8)).unwrap();

    let kinds: Vec<AttachmentKind> = manager.attachments().iter().map(|a| a.kind()).collect();
    assert_eq!(kinds, vec![AttachmentKind::Photo, AttachmentKind::Audio]);
    assert_eq!(manager.attachments()[0].size(), 8);
}

#[test]
fn test_take_media_moves_files_out() {
    let registry = PreviewRegistry::new();
    let mut manager = AttachmentPreviewManager::new(registry.clone());

    manager.attach_photo(photo(10)).unwrap();
    manager.attach_audio(clip(2));

    let (photo, audio) = manager.take_media();
    assert_eq!(photo.unwrap().size(), 10);
    assert_eq!(audio.unwrap().duration_secs, 2);
    assert!(manager.is_empty());
    assert_eq!(registry.live(), 0);
}
