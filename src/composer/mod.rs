//! Composing an eco action: text plus at most one photo and one voice note

mod composer;
mod draft;

pub use composer::ActionComposer;
pub use draft::{is_submittable, ActionDraft, MEDIA_ONLY_DESCRIPTION};
