use anyhow::{Context, Result};
use async_nats::Client;
use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::messages::ActionInsertedMessage;
use crate::actions::{ActionQuery, EcoAction, NewEcoAction};
use crate::store::{RecordFeed, RecordStore};

/// Subject carrying inserts for one user
pub fn inserted_subject(user_id: &str) -> String {
    let token: String = user_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("eco.actions.inserted.{}", token)
}

/// Record store decorator that announces inserts over NATS and serves
/// subscriptions from NATS, so every process watching the same user sees
/// every insert.
pub struct NatsRealtimeStore<S> {
    inner: Arc<S>,
    client: Client,
}

impl<S: RecordStore> NatsRealtimeStore<S> {
    /// Connect to NATS server
    pub async fn connect(url: &str, inner: Arc<S>) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { inner, client })
    }

    async fn publish_inserted(&self, action: &EcoAction) -> Result<()> {
        let subject = inserted_subject(&action.user_id);

        let message = ActionInsertedMessage {
            user_id: action.user_id.clone(),
            action: action.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let payload = serde_json::to_vec(&message)?;

        self.client.publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish insert notification")?;

        info!("Published insert {} to {}", action.id, subject);

        Ok(())
    }
}

#[async_trait::async_trait]
impl<S: RecordStore + 'static> RecordStore for NatsRealtimeStore<S> {
    async fn insert(&self, action: NewEcoAction) -> Result<EcoAction> {
        let record = self.inner.insert(action).await?;

        // The record is stored; a lost notification only delays other views
        if let Err(e) = self.publish_inserted(&record).await {
            warn!("Insert {} not announced: {:#}", record.id, e);
        }

        Ok(record)
    }

    async fn query(&self, query: &ActionQuery) -> Result<Vec<EcoAction>> {
        self.inner.query(query).await
    }

    async fn subscribe(&self, user_id: &str) -> Result<RecordFeed> {
        let subject = inserted_subject(user_id);

        info!("Subscribing to inserts on {}", subject);

        let mut subscriber = self.client.subscribe(subject.clone())
            .await
            .context("Failed to subscribe to insert notifications")?;

        let (tx, rx) = mpsc::channel(64);
        let user_id = user_id.to_string();

        let pump = tokio::spawn(async move {
            while let Some(msg) = subscriber.next().await {
                match serde_json::from_slice::<ActionInsertedMessage>(&msg.payload) {
                    Ok(inserted) => {
                        // Subject tokens are sanitized, so double-check the owner
                        if inserted.user_id != user_id {
                            continue;
                        }
                        if tx.send(inserted.action).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Failed to parse insert notification: {}", e);
                    }
                }
            }

            info!("Insert subscription on {} closed", subject);
        });

        Ok(RecordFeed::new(rx, pump))
    }
}
