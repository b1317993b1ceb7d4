use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A logged eco action as persisted by the record store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EcoAction {
    /// Assigned by the record store
    pub id: Uuid,
    pub user_id: String,
    #[serde(rename = "action_description")]
    pub description: String,
    pub impact_score: u32,
    pub action_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload: everything but the store-assigned fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewEcoAction {
    pub user_id: String,
    #[serde(rename = "action_description")]
    pub description: String,
    pub impact_score: u32,
    pub action_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

impl NewEcoAction {
    pub fn into_record(self, id: Uuid, created_at: DateTime<Utc>) -> EcoAction {
        EcoAction {
            id,
            user_id: self.user_id,
            description: self.description,
            impact_score: self.impact_score,
            action_date: self.action_date,
            photo_url: self.photo_url,
            audio_url: self.audio_url,
            created_at,
        }
    }
}

/// Query filter; results are always newest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionQuery {
    pub user_id: String,
    pub limit: Option<usize>,
}

impl ActionQuery {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            limit: None,
        }
    }
}

/// Newest-first ordering: by action date, then insertion time
pub fn newest_first(a: &EcoAction, b: &EcoAction) -> std::cmp::Ordering {
    b.action_date
        .cmp(&a.action_date)
        .then_with(|| b.created_at.cmp(&a.created_at))
}
