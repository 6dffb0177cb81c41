//! Notification requests emitted after a workflow commit.
//!
//! The core only describes who should hear about what. Delivery is the job
//! of whatever implements [`NotificationSink`].

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::status::define_name_enum;
use crate::types::DbId;

define_name_enum! {
    NotificationKind ("notification kind") {
        OrderConfirmation => "order_confirmation",
        StatusUpdate => "status_update",
        PaymentReceived => "payment_received",
        DeliveryReady => "delivery_ready",
        RevisionRequested => "revision_requested",
        System => "system",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub recipient_id: DbId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
}

impl NotificationRequest {
    pub fn new(
        recipient_id: DbId,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recipient_id,
            kind,
            title: title.into(),
            message: message.into(),
            link: None,
        }
    }

    /// Point the notification at a project page.
    pub fn for_project(mut self, project_id: DbId) -> Self {
        self.link = Some(format!("/projects/{project_id}"));
        self
    }
}

/// Receives notification requests. Must not block and must not fail the
/// operation that produced them.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, request: NotificationRequest);
}

/// Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl NotificationSink for DiscardSink {
    fn notify(&self, _request: NotificationRequest) {}
}

/// Keeps every request in memory. Used by tests to assert on side effects.
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<NotificationRequest>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<NotificationRequest> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    pub fn kinds_for(&self, recipient_id: DbId) -> Vec<NotificationKind> {
        self.sent()
            .into_iter()
            .filter(|n| n.recipient_id == recipient_id)
            .map(|n| n.kind)
            .collect()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, request: NotificationRequest) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(request);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_link() {
        let n = NotificationRequest::new(3, NotificationKind::System, "Hi", "There").for_project(9);
        assert_eq!(n.link.as_deref(), Some("/projects/9"));
    }

    #[test]
    fn recording_sink_filters_by_recipient() {
        let sink = RecordingSink::new();
        sink.notify(NotificationRequest::new(1, NotificationKind::StatusUpdate, "a", "b"));
        sink.notify(NotificationRequest::new(2, NotificationKind::PaymentReceived, "a", "b"));
        assert_eq!(sink.kinds_for(2), vec![NotificationKind::PaymentReceived]);
        assert_eq!(sink.sent().len(), 2);
    }

    #[test]
    fn kind_names() {
        assert_eq!(NotificationKind::DeliveryReady.as_str(), "delivery_ready");
        assert_eq!(
            "revision_requested".parse::<NotificationKind>().unwrap(),
            NotificationKind::RevisionRequested
        );
    }
}
