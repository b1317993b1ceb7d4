use std::sync::Arc;

use tracing::info;

use super::photo::PhotoFile;
use super::preview::{PreviewHandle, PreviewRegistry};
use crate::audio::AudioClip;
use crate::config::DEFAULT_MAX_PHOTO_BYTES;
use crate::error::AttachmentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Photo,
    Audio,
}

#[derive(Debug)]
pub struct PhotoAttachment {
    pub file: PhotoFile,
    pub preview: PreviewHandle,
}

#[derive(Debug)]
pub struct AudioAttachment {
    pub clip: AudioClip,
    pub preview: PreviewHandle,
}

/// Borrowed view of one attachment slot
#[derive(Debug, Clone, Copy)]
pub enum Attachment<'a> {
    Photo { file: &'a PhotoFile, preview: &'a str },
    Audio { clip: &'a AudioClip, preview: &'a str },
}

impl Attachment<'_> {
    pub fn kind(&self) -> AttachmentKind {
        match self {
            Self::Photo { .. } => AttachmentKind::Photo,
            Self::Audio { .. } => AttachmentKind::Audio,
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            Self::Photo { file, .. } => file.size(),
            Self::Audio { clip, .. } => clip.size(),
        }
    }
}

/// One photo slot and one audio slot, each with a live preview reference.
///
/// Replacing, removing or clearing a slot drops its [`PreviewHandle`], which
/// revokes the reference. Dropping the manager does the same for whatever is
/// still attached.
#[derive(Debug)]
pub struct AttachmentPreviewManager {
    registry: Arc<PreviewRegistry>,
    max_photo_bytes: u64,
    photo: Option<PhotoAttachment>,
    audio: Option<AudioAttachment>,
}

impl AttachmentPreviewManager {
    pub fn new(registry: Arc<PreviewRegistry>) -> Self {
        Self::with_photo_limit(registry, DEFAULT_MAX_PHOTO_BYTES)
    }

    pub fn with_photo_limit(registry: Arc<PreviewRegistry>, max_photo_bytes: u64) -> Self {
        Self {
            registry,
            max_photo_bytes,
            photo: None,
            audio: None,
        }
    }

    pub fn registry(&self) -> &Arc<PreviewRegistry> {
        &self.registry
    }

    /// Attach a photo, replacing any previous one. Returns the preview
    /// reference.
    pub fn attach_photo(&mut self, file: PhotoFile) -> Result<String, AttachmentError> {
        let size = file.size();
        if size > self.max_photo_bytes {
            return Err(AttachmentError::FileTooLarge {
                size,
                limit: self.max_photo_bytes,
            });
        }

        let preview = self.registry.create(&file.content_type, file.bytes.clone());
        let url = preview.url().to_string();

        // Old attachment (and its preview) dropped here
        self.photo = Some(PhotoAttachment { file, preview });

        info!("Photo attached ({} bytes)", size);
        Ok(url)
    }

    /// Attach a finalized voice note, replacing any previous one
    pub fn attach_audio(&mut self, clip: AudioClip) -> String {
        let preview = self.registry.create(&clip.content_type, clip.bytes.clone());
        let url = preview.url().to_string();

        info!("Voice note attached ({}s, {} bytes)", clip.duration_secs, clip.size());
        self.audio = Some(AudioAttachment { clip, preview });

        url
    }

    pub fn remove_photo(&mut self) {
        self.photo = None;
    }

    pub fn remove_audio(&mut self) {
        self.audio = None;
    }

    pub fn clear(&mut self) {
        self.photo = None;
        self.audio = None;
    }

    pub fn photo(&self) -> Option<&PhotoAttachment> {
        self.photo.as_ref()
    }

    pub fn audio(&self) -> Option<&AudioAttachment> {
        self.audio.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.photo.is_none() && self.audio.is_none()
    }

    pub fn attachments(&self) -> Vec<Attachment<'_>> {
        let mut out = Vec::with_capacity(2);
        if let Some(photo) = &self.photo {
            out.push(Attachment::Photo {
                file: &photo.file,
                preview: photo.preview.url(),
            });
        }
        if let Some(audio) = &self.audio {
            out.push(Attachment::Audio {
                clip: &audio.clip,
                preview: audio.preview.url(),
            });
        }
        out
    }

    /// Move the attached media out, revoking both previews
    pub fn take_media(&mut self) -> (Option<PhotoFile>, Option<AudioClip>) {
        let photo = self.photo.take().map(|a| a.file);
        let audio = self.audio.take().map(|a| a.clip);
        (photo, audio)
    }
}
