use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::actions::ActionList;
use crate::store::RecordStore;

/// Standing subscription that folds pushed inserts into an [`ActionList`].
///
/// Bound to the user it was opened for. Dropping it (or calling
/// [`RealtimeSubscription::unsubscribe`]) stops the listener.
#[derive(Debug)]
pub struct RealtimeSubscription {
    user_id: String,
    task: JoinHandle<()>,
}

impl RealtimeSubscription {
    pub async fn open(records: &dyn RecordStore, user_id: &str, list: ActionList) -> Result<Self> {
        let mut feed = records.subscribe(user_id).await?;
        let owner = user_id.to_string();

        let task = tokio::spawn(async move {
            while let Some(action) = feed.next().await {
                if action.user_id != owner {
                    warn!("Dropping push for {} on {}'s subscription", action.user_id, owner);
                    continue;
                }

                let id = action.id;
                if !list.reconcile(action).await {
                    debug!("Push {} already in list", id);
                }
            }
        });

        info!("Realtime subscription opened for {}", user_id);

        Ok(Self {
            user_id: user_id.to_string(),
            task,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for RealtimeSubscription {
    fn drop(&mut self) {
        self.task.abort();
        info!("Realtime subscription closed for {}", self.user_id);
    }
}
