//! Core data models for pylon.
//!
//! These types are shared across all pylon crates and represent the
//! core domain entities of the fan-out pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::{Error, Result};

// =============================================================================
// ENUMS
// =============================================================================

/// Event/notification priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Database/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    /// Parse from the database/wire representation (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What triggered a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Derived from an ingested domain event.
    Event,
    /// Derived from a user-to-user assignment.
    Assignment,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Assignment => "assignment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "event" => Some(Self::Event),
            "assignment" => Some(Self::Assignment),
            _ => None,
        }
    }
}

/// Read/unread lifecycle of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    #[default]
    Unread,
    Read,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unread => "unread",
            Self::Read => "read",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unread" => Some(Self::Unread),
            "read" => Some(Self::Read),
            _ => None,
        }
    }
}

// =============================================================================
// EVENT TYPES
// =============================================================================

/// Wire shape of an event arriving from the message bus.
///
/// Required fields are optional here so validation can distinguish
/// "missing" from "present" and drop malformed messages explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingEvent {
    /// Event type classification (e.g. `"maintenance_due"`).
    pub classification: String,
    /// Component that produced the event.
    #[serde(default)]
    pub origin: String,
    /// Originating smart-service, if any.
    #[serde(default)]
    pub smart_service: Option<String>,
    /// Production-module context. Required.
    #[serde(default)]
    pub module: Option<String>,
    /// Pilot/site partition. Required.
    #[serde(default)]
    pub site: Option<String>,
    /// Free-form result payload.
    #[serde(default)]
    pub result: Option<JsonValue>,
    /// Priority. Required.
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// When the event occurred. Defaults to ingestion time when absent.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl IncomingEvent {
    /// Validate required fields and bind the event to the topic it arrived on.
    ///
    /// Missing priority, module, or site fails with [`Error::MalformedEvent`];
    /// the caller drops the message without persisting or publishing anything.
    pub fn into_validated(self, topic: &str) -> Result<NewEvent> {
        let priority = self
            .priority
            .ok_or_else(|| Error::MalformedEvent("missing priority".to_string()))?;
        let module = match self.module {
            Some(m) if !m.is_empty() => m,
            _ => return Err(Error::MalformedEvent("missing module".to_string())),
        };
        let site = match self.site {
            Some(s) if !s.is_empty() => s,
            _ => return Err(Error::MalformedEvent("missing site".to_string())),
        };

        Ok(NewEvent {
            classification: self.classification,
            origin: self.origin,
            smart_service: self.smart_service,
            module,
            site,
            result: self.result,
            priority,
            description: self.description.unwrap_or_default(),
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            topic: topic.to_string(),
        })
    }
}

/// A validated event ready for persistence (no ID yet).
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub classification: String,
    pub origin: String,
    pub smart_service: Option<String>,
    pub module: String,
    pub site: String,
    pub result: Option<JsonValue>,
    pub priority: Priority,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub topic: String,
}

/// A persisted, immutable domain event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub classification: String,
    pub origin: String,
    pub smart_service: Option<String>,
    pub module: String,
    pub site: String,
    pub result: Option<JsonValue>,
    pub priority: Priority,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub topic: String,
}

impl Event {
    /// Attach the store-assigned ID to a validated event.
    pub fn from_new(id: Uuid, new: NewEvent) -> Self {
        Self {
            id,
            classification: new.classification,
            origin: new.origin,
            smart_service: new.smart_service,
            module: new.module,
            site: new.site,
            result: new.result,
            priority: new.priority,
            description: new.description,
            timestamp: new.timestamp,
            topic: new.topic,
        }
    }
}

// =============================================================================
// TOPIC-ROLE MAPPING
// =============================================================================

/// Sentinel role meaning "all users registered at the event's site".
///
/// A default mapping carrying only this role resolves to the site-wide
/// fallback path instead of per-role broadcasts.
pub const SITE_ALL_ROLE: &str = "SITE_ALL";

/// Reference data mapping a bus topic to the roles entitled to
/// notifications about it. At most one mapping per topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicRoleMapping {
    pub id: Uuid,
    pub topic: String,
    /// Ordered set of entitled roles.
    pub roles: Vec<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// NOTIFICATION TYPES
// =============================================================================

/// A notification ready for persistence (no ID yet).
///
/// Exactly one of `related_event`/`related_assignment` is set; the
/// constructors are the only way pipeline code builds one.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient: String,
    pub kind: NotificationKind,
    pub status: NotificationStatus,
    pub related_event: Option<Uuid>,
    pub related_assignment: Option<Uuid>,
    pub priority: Priority,
    pub description: String,
    pub module: String,
    pub site: String,
    pub origin: String,
    pub timestamp: DateTime<Utc>,
}

impl NewNotification {
    /// Build the per-recipient record for a stored event.
    pub fn for_event(event: &Event, recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            kind: NotificationKind::Event,
            status: NotificationStatus::Unread,
            related_event: Some(event.id),
            related_assignment: None,
            priority: event.priority,
            description: event.description.clone(),
            module: event.module.clone(),
            site: event.site.clone(),
            origin: event.origin.clone(),
            timestamp: event.timestamp,
        }
    }

    /// Build the single record for an assignment handed to its target user.
    pub fn for_assignment(assignment: &Assignment) -> Self {
        Self {
            recipient: assignment.assignee.clone(),
            kind: NotificationKind::Assignment,
            status: NotificationStatus::Unread,
            related_event: None,
            related_assignment: Some(assignment.id),
            priority: assignment.priority,
            description: assignment.description.clone(),
            module: assignment.module.clone(),
            site: assignment.site.clone(),
            origin: "assignment".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// A persisted per-recipient delivery record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient: String,
    pub kind: NotificationKind,
    pub status: NotificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_event: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_assignment: Option<Uuid>,
    pub priority: Priority,
    pub description: String,
    pub module: String,
    pub site: String,
    pub origin: String,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// ASSIGNMENT SNAPSHOT
// =============================================================================

/// Read-only snapshot of an assignment at notification-creation time.
///
/// The assignment itself is owned by out-of-scope CRUD; the notifier only
/// reads these fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    /// Target user to notify.
    pub assignee: String,
    pub module: String,
    pub site: String,
    pub priority: Priority,
    pub description: String,
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Pagination window for notification listings.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: crate::defaults::PAGE_LIMIT,
            offset: crate::defaults::PAGE_OFFSET,
        }
    }
}
