//! Reelworks notification fan-out.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, and the workflow's notification sink.
//! - [`WorkflowEvent`]: the envelope carried on the bus.
//! - [`NotificationOutbox`]: background task that stores every event in
//!   the `notifications` table.

pub mod bus;
pub mod outbox;

pub use bus::{EventBus, WorkflowEvent};
pub use outbox::NotificationOutbox;
