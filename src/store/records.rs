use anyhow::Result;
use chrono::Utc;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::actions::{newest_first, ActionQuery, EcoAction, NewEcoAction};

/// Stream of records inserted for one user. Dropping the feed stops the
/// task pumping it.
#[derive(Debug)]
pub struct RecordFeed {
    rx: mpsc::Receiver<EcoAction>,
    pump: JoinHandle<()>,
}

impl RecordFeed {
    pub fn new(rx: mpsc::Receiver<EcoAction>, pump: JoinHandle<()>) -> Self {
        Self { rx, pump }
    }

    pub async fn next(&mut self) -> Option<EcoAction> {
        self.rx.recv().await
    }
}

impl Drop for RecordFeed {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

/// Record persistence collaborator
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert and return the stored record with its assigned id
    async fn insert(&self, action: NewEcoAction) -> Result<EcoAction>;

    /// Records matching the query, newest first
    async fn query(&self, query: &ActionQuery) -> Result<Vec<EcoAction>>;

    /// Push every record inserted for `user_id` from now on
    async fn subscribe(&self, user_id: &str) -> Result<RecordFeed>;
}

/// In-process record store. Inserts are broadcast to subscribers the way a
/// hosted backend would push them over its realtime channel.
pub struct MemoryRecordStore {
    records: RwLock<Vec<EcoAction>>,
    inserted_tx: broadcast::Sender<EcoAction>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        let (inserted_tx, _) = broadcast::channel(256);
        Self {
            records: RwLock::new(Vec::new()),
            inserted_tx,
        }
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, action: NewEcoAction) -> Result<EcoAction> {
        let record = action.into_record(Uuid::new_v4(), Utc::now());

        self.records.write().await.push(record.clone());

        // No subscribers is fine
        let _ = self.inserted_tx.send(record.clone());

        info!("Stored eco action {} for {}", record.id, record.user_id);

        Ok(record)
    }

    async fn query(&self, query: &ActionQuery) -> Result<Vec<EcoAction>> {
        let records = self.records.read().await;

        let mut matching: Vec<EcoAction> = records
            .iter()
            .filter(|r| r.user_id == query.user_id)
            .cloned()
            .collect();
        matching.sort_by(newest_first);

        if let Some(limit) = query.limit {
            matching.truncate(limit);
        }

        Ok(matching)
    }

    async fn subscribe(&self, user_id: &str) -> Result<RecordFeed> {
        let mut inserted = self.inserted_tx.subscribe();
        let (tx, rx) = mpsc::channel(64);
        let user_id = user_id.to_string();

        let pump = tokio::spawn(async move {
            loop {
                match inserted.recv().await {
                    Ok(record) if record.user_id == user_id => {
                        if tx.send(record).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Realtime feed for {} lagged, {} inserts skipped", user_id, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(RecordFeed::new(rx, pump))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_action(user: &str, day: u32) -> NewEcoAction {
        NewEcoAction {
            user_id: user.to_string(),
            description: format!("day {}", day),
            impact_score: 2,
            action_date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            photo_url: None,
            audio_url: None,
        }
    }

    #[tokio::test]
    async fn test_query_filters_and_orders() -> Result<()> {
        let store = MemoryRecordStore::new();
        store.insert(new_action("alice", 1)).await?;
        store.insert(new_action("bob", 2)).await?;
        store.insert(new_action("alice", 3)).await?;

        let found = store.query(&ActionQuery::for_user("alice")).await?;
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].description, "day 3");
        assert_eq!(found[1].description, "day 1");
        Ok(())
    }

    #[tokio::test]
    async fn test_subscribe_only_sees_own_inserts() -> Result<()> {
        let store = MemoryRecordStore::new();
        let mut feed = store.subscribe("alice").await?;

        store.insert(new_action("bob", 1)).await?;
        let mine = store.insert(new_action("alice", 2)).await?;

        let pushed = feed.next().await.unwrap();
        assert_eq!(pushed.id, mine.id);
        Ok(())
    }
}
