use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::model::EcoAction;

/// The local, newest-first list of the user's actions.
///
/// Shared by the submission pipeline (optimistic inserts), the realtime
/// subscription (pushes) and views. An id is never present twice no matter
/// which path delivered it first.
#[derive(Debug, Clone, Default)]
pub struct ActionList {
    actions: Arc<RwLock<Vec<EcoAction>>>,
}

impl ActionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the head unless the id is already listed. Returns whether
    /// the list changed.
    pub async fn insert_front(&self, action: EcoAction) -> bool {
        let mut actions = self.actions.write().await;
        if actions.iter().any(|a| a.id == action.id) {
            debug!("Action {} already listed, skipping", action.id);
            return false;
        }
        actions.insert(0, action);
        true
    }

    /// Apply a realtime push. Same dedup rule as [`ActionList::insert_front`].
    pub async fn reconcile(&self, action: EcoAction) -> bool {
        let id = action.id;
        let inserted = self.insert_front(action).await;
        if inserted {
            debug!("Realtime push {} added to list", id);
        }
        inserted
    }

    /// Full refresh from the record store
    pub async fn replace_all(&self, fresh: Vec<EcoAction>) {
        let mut actions = self.actions.write().await;
        *actions = fresh;
    }

    pub async fn snapshot(&self) -> Vec<EcoAction> {
        self.actions.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.actions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.actions.read().await.is_empty()
    }

    pub async fn contains(&self, id: Uuid) -> bool {
        self.actions.read().await.iter().any(|a| a.id == id)
    }

    pub async fn head(&self) -> Option<EcoAction> {
        self.actions.read().await.first().cloned()
    }

    /// Sum of impact scores
    pub async fn total_points(&self) -> u64 {
        self.actions
            .read()
            .await
            .iter()
            .map(|a| a.impact_score as u64)
            .sum()
    }

    /// Progress toward `goal` points, capped at 100
    pub async fn progress_percent(&self, goal: u32) -> u8 {
        if goal == 0 {
            return 100;
        }
        let total = self.total_points().await;
        (total * 100 / goal as u64).min(100) as u8
    }
}
