//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! The workflow hands every notification to the bus through its
//! [`NotificationSink`] impl. Subscribers (the outbox, tests) each see
//! every event.

use chrono::{DateTime, Utc};
use reelworks_core::notifications::{NotificationRequest, NotificationSink};
use reelworks_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// WorkflowEvent
// ---------------------------------------------------------------------------

/// A notification raised by a committed workflow operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEvent {
    pub notification: NotificationRequest,
    /// When the event was published (UTC).
    pub timestamp: DateTime<Utc>,
}

impl WorkflowEvent {
    pub fn new(notification: NotificationRequest) -> Self {
        Self {
            notification,
            timestamp: Utc::now(),
        }
    }

    /// Dot-separated name, e.g. `"notification.payment_received"`.
    pub fn event_type(&self) -> String {
        format!("notification.{}", self.notification.kind)
    }

    pub fn recipient_id(&self) -> DbId {
        self.notification.recipient_id
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus, shared as `Arc<EventBus>`.
///
/// ```rust
/// use reelworks_core::notifications::{NotificationKind, NotificationRequest};
/// use reelworks_events::bus::{EventBus, WorkflowEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(WorkflowEvent::new(NotificationRequest::new(
///     10,
///     NotificationKind::System,
///     "Hello",
///     "Welcome aboard",
/// )));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<WorkflowEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed events are dropped and
    /// slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. With no subscribers the event is dropped.
    pub fn publish(&self, event: WorkflowEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl NotificationSink for EventBus {
    fn notify(&self, request: NotificationRequest) {
        tracing::debug!(
            recipient_id = request.recipient_id,
            kind = %request.kind,
            "Publishing notification",
        );
        self.publish(WorkflowEvent::new(request));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
