//! Scripted eco assistant.
//!
//! Not an AI: every reply is one of a handful of canned encouragements,
//! delivered after a short "thinking" pause. Messages keep their own
//! previews of whatever media the user shared, so the thread can render them
//! after the composer has been cleared.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::info;

use crate::attachments::{PreviewHandle, PreviewRegistry};
use crate::composer::ActionDraft;

const CANNED_REPLIES: [&str; 5] = [
    "That's a great eco-friendly choice! Based on your activity, I'd suggest tracking your carbon footprint reduction.",
    "Your commitment to sustainability is inspiring! Have you considered documenting the environmental impact of this action?",
    "Excellent question! For eco activities like this, I recommend measuring the long-term benefits and sharing with your community.",
    "That's an interesting approach to environmental conservation. You might want to explore similar actions that could amplify your impact.",
    "Great eco initiative! Consider setting up a routine around this activity to maximize your environmental contribution.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub photo_preview: Option<PreviewHandle>,
    pub audio_preview: Option<PreviewHandle>,
    pub timestamp: DateTime<Utc>,
}

/// Serializable view of a [`ChatMessage`]
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessageView {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub photo: Option<String>,
    pub audio_url: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<&ChatMessage> for ChatMessageView {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            id: msg.id.clone(),
            role: msg.role,
            content: msg.content.clone(),
            photo: msg.photo_preview.as_ref().map(|p| p.url().to_string()),
            audio_url: msg.audio_preview.as_ref().map(|p| p.url().to_string()),
            timestamp: msg.timestamp,
        }
    }
}

pub struct EcoAssistant {
    previews: Arc<PreviewRegistry>,
    thinking_delay: Duration,
    messages: Vec<ChatMessage>,
}

impl EcoAssistant {
    pub fn new(previews: Arc<PreviewRegistry>, thinking_delay: Duration) -> Self {
        Self {
            previews,
            thinking_delay,
            messages: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn views(&self) -> Vec<ChatMessageView> {
        self.messages.iter().map(ChatMessageView::from).collect()
    }

    /// Post the user's draft and wait for the reply
    pub async fn ask(&mut self, draft: ActionDraft) -> &ChatMessage {
        self.post_user(draft);
        tokio::time::sleep(self.thinking_delay).await;
        self.post_reply()
    }

    /// Pause between the user's message and the reply
    pub fn thinking_delay(&self) -> Duration {
        self.thinking_delay
    }

    /// Append the user's message, keeping previews of any shared media
    pub fn post_user(&mut self, draft: ActionDraft) {
        let photo_preview = draft
            .photo()
            .map(|p| self.previews.create(&p.content_type, p.bytes.clone()));
        let audio_preview = draft
            .audio()
            .map(|a| self.previews.create(&a.content_type, a.bytes.clone()));

        self.push(Role::User, draft.display_text().to_string(), photo_preview, audio_preview);
    }

    /// Append one canned reply and return it
    pub fn post_reply(&mut self) -> &ChatMessage {
        let reply = CANNED_REPLIES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(CANNED_REPLIES[0]);
        self.push(Role::Assistant, reply.to_string(), None, None);

        info!("Assistant replied ({} messages in thread)", self.messages.len());

        &self.messages[self.messages.len() - 1]
    }

    /// Forget the conversation, revoking every preview it held
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    fn push(
        &mut self,
        role: Role,
        content: String,
        photo_preview: Option<PreviewHandle>,
        audio_preview: Option<PreviewHandle>,
    ) {
        self.messages.push(ChatMessage {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content,
            photo_preview,
            audio_preview,
            timestamp: Utc::now(),
        });
    }
}
