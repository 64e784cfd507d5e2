//! Live delivery abstraction.
//!
//! Lets the notification service push to connected clients without
//! depending on the transport. The WebSocket gateway in the API crate
//! provides the real implementation.

use async_trait::async_trait;
use platebook_db::entities::notification::{self, NotificationType};
use serde::Serialize;
use std::sync::Arc;

/// Payload pushed to a connected client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    /// Notification ID, for client-side de-duplication.
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub message: String,
    pub post_id: String,
    pub sender_id: String,
    /// RFC 3339 creation time.
    pub timestamp: String,
}

impl From<&notification::Model> for NotificationEvent {
    fn from(n: &notification::Model) -> Self {
        Self {
            id: n.id.clone(),
            notification_type: n.notification_type,
            message: n.message.clone(),
            post_id: n.post_id.clone(),
            sender_id: n.sender_id.clone(),
            timestamp: n.created_at.to_rfc3339(),
        }
    }
}

/// Pushes events to users with an open connection.
#[async_trait]
pub trait LiveDelivery: Send + Sync {
    /// Whether the user currently has at least one open connection.
    async fn is_connected(&self, user_id: &str) -> bool;

    /// Push an event to every connection of a user.
    /// Returns true if at least one connection accepted it.
    async fn deliver(&self, user_id: &str, event: &NotificationEvent) -> bool;
}

/// A no-op implementation for tests or when live delivery is disabled.
#[derive(Clone, Default)]
pub struct NoOpLiveDelivery;

#[async_trait]
impl LiveDelivery for NoOpLiveDelivery {
    async fn is_connected(&self, _user_id: &str) -> bool {
        false
    }

    async fn deliver(&self, _user_id: &str, _event: &NotificationEvent) -> bool {
        false
    }
}

/// Shared live delivery handle.
pub type LiveDeliveryService = Arc<dyn LiveDelivery>;
