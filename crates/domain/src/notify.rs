//! Notification dispatch collaborator.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// What the notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    QuotationSent,
    InvoicePaid,
}

/// An outbound notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub attachment: Option<String>,
}

/// Result of a dispatch attempt. Failure is an outcome, not an error:
/// callers decide whether an unsent notification fails their operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub ok: bool,
}

/// Trait for delivering notifications.
///
/// Invoked with at most one call per domain event. A transport timeout is
/// the implementation's concern and must surface as `ok: false`.
#[async_trait]
pub trait NotificationDispatch: Send + Sync {
    async fn send(&self, notification: Notification) -> DispatchOutcome;
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    sent: Vec<Notification>,
    fail_on_send: bool,
}

/// In-memory notification recorder for wiring and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<RwLock<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    /// Creates a new notifier that records every dispatch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the notifier to report failure on subsequent sends.
    pub async fn set_fail_on_send(&self, fail: bool) {
        self.state.write().await.fail_on_send = fail;
    }

    /// Returns the number of successfully dispatched notifications.
    pub async fn sent_count(&self) -> usize {
        self.state.read().await.sent.len()
    }

    /// Returns the last successfully dispatched notification.
    pub async fn last_sent(&self) -> Option<Notification> {
        self.state.read().await.sent.last().cloned()
    }

    /// Returns how many dispatched notifications carried the given kind.
    pub async fn sent_count_of(&self, kind: NotificationKind) -> usize {
        self.state
            .read()
            .await
            .sent
            .iter()
            .filter(|n| n.kind == kind)
            .count()
    }
}

#[async_trait]
impl NotificationDispatch for InMemoryNotifier {
    async fn send(&self, notification: Notification) -> DispatchOutcome {
        let mut state = self.state.write().await;
        if state.fail_on_send {
            return DispatchOutcome { ok: false };
        }
        state.sent.push(notification);
        DispatchOutcome { ok: true }
    }
}
