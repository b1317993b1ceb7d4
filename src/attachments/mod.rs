pub mod manager;
pub mod photo;
pub mod preview;

pub use manager::{Attachment, AttachmentKind, AttachmentPreviewManager, AudioAttachment, PhotoAttachment};
pub use photo::PhotoFile;
pub use preview::{PreviewContent, PreviewHandle, PreviewRegistry};
