//! Durable notification outbox.
//!
//! [`NotificationOutbox`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and writes every event to the `notifications` table. It runs as a
//! long-lived background task and stops when the bus is dropped.

use reelworks_core::types::DbId;
use reelworks_db::repositories::NotificationRepo;
use reelworks_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::WorkflowEvent;

pub struct NotificationOutbox;

impl NotificationOutbox {
    /// Run the persistence loop until the channel closes.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<WorkflowEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::persist(&pool, &event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type(),
                            recipient_id = event.recipient_id(),
                            "Failed to persist notification"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Notification outbox lagged, some notifications were not stored"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification outbox shutting down");
                    break;
                }
            }
        }
    }

    async fn persist(pool: &DbPool, event: &WorkflowEvent) -> Result<DbId, sqlx::Error> {
        let row = NotificationRepo::create(pool, &event.notification).await?;
        Ok(row.id)
    }
}
