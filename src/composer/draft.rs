use crate::attachments::PhotoFile;
use crate::audio::AudioClip;
use crate::error::DraftError;

/// Description stored when an action is logged with media only
pub const MEDIA_ONLY_DESCRIPTION: &str = "Shared media attachment";

/// Immutable snapshot of a composition, ready to submit.
///
/// Only constructible through [`ActionDraft::new`], so every draft in
/// circulation has trimmed text or at least one attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDraft {
    text: String,
    photo: Option<PhotoFile>,
    audio: Option<AudioClip>,
    impact_score: Option<u32>,
}

impl ActionDraft {
    pub fn new(
        text: &str,
        photo: Option<PhotoFile>,
        audio: Option<AudioClip>,
    ) -> Result<Self, DraftError> {
        let text = text.trim();
        if !is_submittable(text, photo.is_some(), audio.is_some()) {
            return Err(DraftError::EmptyDraft);
        }

        Ok(Self {
            text: text.to_string(),
            photo,
            audio,
            impact_score: None,
        })
    }

    /// Use a caller-chosen score instead of the default heuristic. Zero
    /// counts as "not chosen".
    pub fn with_impact_score(mut self, score: u32) -> Self {
        self.impact_score = (score > 0).then_some(score);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text shown for this draft, falling back for media-only drafts
    pub fn display_text(&self) -> &str {
        if self.text.is_empty() {
            MEDIA_ONLY_DESCRIPTION
        } else {
            &self.text
        }
    }

    pub fn photo(&self) -> Option<&PhotoFile> {
        self.photo.as_ref()
    }

    pub fn audio(&self) -> Option<&AudioClip> {
        self.audio.as_ref()
    }

    pub fn impact_score(&self) -> Option<u32> {
        self.impact_score
    }

    pub fn has_attachments(&self) -> bool {
        self.photo.is_some() || self.audio.is_some()
    }

    pub fn into_parts(self) -> (String, Option<PhotoFile>, Option<AudioClip>, Option<u32>) {
        (self.text, self.photo, self.audio, self.impact_score)
    }
}

pub fn is_submittable(text: &str, has_photo: bool, has_audio: bool) -> bool {
    !text.trim().is_empty() || has_photo || has_audio
}
