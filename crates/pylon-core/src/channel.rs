//! Push channel abstraction and broadcast-based implementation.
//!
//! The delivery channel has two addressing modes: unicast to a single
//! user's private destination, and broadcast to a role/topic destination
//! received by all currently subscribed members. Publishes are
//! fire-and-forget: a missed push is recoverable because the notification
//! is already durably stored and surfaces on the recipient's next pull.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{Assignment, Event, Notification, NotificationKind, Priority};

// =============================================================================
// DESTINATIONS
// =============================================================================

/// Private per-user destination, e.g. `/user/u1/queue/notifications`.
pub fn user_destination(user_id: &str) -> String {
    format!("/user/{user_id}/queue/notifications")
}

/// Role/topic broadcast destination, e.g. `/topic/notifications/TECHNICIAN`.
pub fn topic_destination(topic_or_role: &str) -> String {
    format!("/topic/notifications/{topic_or_role}")
}

// =============================================================================
// PUSH MESSAGE
// =============================================================================

/// The payload published over the push channel.
///
/// Broadcasts strip per-recipient identity (they are addressed by role,
/// not by listing users); unicasts carry the stored notification id so
/// the client can mark it read.
#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
    /// Stored notification id. Present on unicasts only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<Uuid>,
    pub kind: NotificationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_event: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_assignment: Option<Uuid>,
    pub priority: Priority,
    pub description: String,
    pub module: String,
    pub site: String,
    pub origin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    pub timestamp: DateTime<Utc>,
}

impl PushMessage {
    /// Broadcast payload for a stored event (no recipient identity).
    pub fn broadcast_for_event(event: &Event) -> Self {
        Self {
            notification_id: None,
            kind: NotificationKind::Event,
            related_event: Some(event.id),
            related_assignment: None,
            priority: event.priority,
            description: event.description.clone(),
            module: event.module.clone(),
            site: event.site.clone(),
            origin: event.origin.clone(),
            result: event.result.clone(),
            timestamp: event.timestamp,
        }
    }

    /// Unicast payload for an assignment notification.
    pub fn unicast_for_assignment(notification_id: Uuid, assignment: &Assignment) -> Self {
        Self {
            notification_id: Some(notification_id),
            kind: NotificationKind::Assignment,
            related_event: None,
            related_assignment: Some(assignment.id),
            priority: assignment.priority,
            description: assignment.description.clone(),
            module: assignment.module.clone(),
            site: assignment.site.clone(),
            origin: "assignment".to_string(),
            result: None,
            timestamp: Utc::now(),
        }
    }

    /// Unicast payload for an already-stored notification.
    pub fn unicast_for_notification(notification: &Notification) -> Self {
        Self {
            notification_id: Some(notification.id),
            kind: notification.kind,
            related_event: notification.related_event,
            related_assignment: notification.related_assignment,
            priority: notification.priority,
            description: notification.description.clone(),
            module: notification.module.clone(),
            site: notification.site.clone(),
            origin: notification.origin.clone(),
            result: None,
            timestamp: notification.timestamp,
        }
    }
}

// =============================================================================
// DELIVERY CHANNEL
// =============================================================================

/// Push-messaging abstraction with unicast and broadcast addressing.
///
/// Implementations log publish failures and never propagate them; the
/// pipeline treats every publish as fire-and-forget.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Publish to one user's private destination.
    async fn publish_to_user(&self, user_id: &str, message: &PushMessage);

    /// Publish to a role/topic destination.
    async fn publish_to_topic(&self, topic_or_role: &str, message: &PushMessage);
}

// =============================================================================
// PUSH BUS
// =============================================================================

/// A frame on the push bus: a destination plus the message payload.
///
/// Downstream transports (WebSocket, STOMP relay) subscribe and filter by
/// destination according to each client's subscriptions.
#[derive(Debug, Clone)]
pub struct PushFrame {
    pub destination: String,
    pub message: PushMessage,
}

/// Broadcast-based delivery channel for distributing push frames to
/// transport adapters.
///
/// Uses `tokio::sync::broadcast` with a configurable buffer. Slow
/// receivers that fall behind receive a `Lagged` error and miss frames;
/// the durable notification row is the source of truth for anything a
/// push did not reach.
pub struct PushBus {
    tx: broadcast::Sender<PushFrame>,
}

impl PushBus {
    /// Create a new push bus with the given buffer capacity.
    ///
    /// Recommended: 256 for production, 32 for tests.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to receive push frames. Each subscriber gets its own
    /// independent stream.
    pub fn subscribe(&self) -> broadcast::Receiver<PushFrame> {
        self.tx.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn publish(&self, destination: String, message: &PushMessage) {
        let frame = PushFrame {
            destination,
            message: message.clone(),
        };
        tracing::debug!(
            subsystem = "channel",
            component = "push_bus",
            op = "publish",
            destination = %frame.destination,
            subscriber_count = self.subscriber_count(),
            "Push frame published"
        );
        // No subscribers is not a failure; the frame is simply dropped.
        let _ = self.tx.send(frame);
    }
}

impl Default for PushBus {
    fn default() -> Self {
        Self::new(crate::defaults::PUSH_BUS_CAPACITY)
    }
}

#[async_trait]
impl DeliveryChannel for PushBus {
    async fn publish_to_user(&self, user_id: &str, message: &PushMessage) {
        self.publish(user_destination(user_id), message);
    }

    async fn publish_to_topic(&self, topic_or_role: &str, message: &PushMessage) {
        self.publish(topic_destination(topic_or_role), message);
    }
}
