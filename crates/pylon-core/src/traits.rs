//! Core traits for pylon abstractions.
//!
//! These traits define the seams between the ingestion pipeline and its
//! collaborators (document store, recipient directory, push channel),
//! enabling pluggable backends and testability.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Event, NewEvent, NewNotification, Notification, NotificationKind, NotificationStatus, Page,
    TopicRoleMapping,
};

// =============================================================================
// EVENT REPOSITORY
// =============================================================================

/// Repository for persisted domain events.
///
/// Events are write-once: the pipeline inserts at consumption time and
/// never mutates or deletes.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Persist a validated event, returning its assigned ID.
    async fn insert(&self, event: NewEvent) -> Result<Uuid>;

    /// Fetch an event by ID.
    async fn get(&self, id: Uuid) -> Result<Option<Event>>;

    /// List the most recently ingested events.
    async fn list_recent(&self, limit: i64) -> Result<Vec<Event>>;
}

// =============================================================================
// NOTIFICATION REPOSITORY
// =============================================================================

/// Repository for per-recipient notification records.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Persist one notification, returning its assigned ID.
    async fn insert(&self, notification: NewNotification) -> Result<Uuid>;

    /// Fetch a notification by ID.
    ///
    /// A miss is [`crate::Error::NotificationNotFound`], never a silent
    /// default.
    async fn get(&self, id: Uuid) -> Result<Notification>;

    /// List a recipient's notifications, newest first.
    async fn list_for_recipient(&self, recipient: &str, page: Page) -> Result<Vec<Notification>>;

    /// List a recipient's notifications filtered by read/unread status.
    async fn list_for_recipient_by_status(
        &self,
        recipient: &str,
        status: NotificationStatus,
        page: Page,
    ) -> Result<Vec<Notification>>;

    /// List a recipient's notifications filtered by kind.
    async fn list_for_recipient_by_kind(
        &self,
        recipient: &str,
        kind: NotificationKind,
        page: Page,
    ) -> Result<Vec<Notification>>;

    /// Flip a notification's status to read.
    ///
    /// The only post-creation mutation; used by the CRUD surface, never by
    /// the ingestion pipeline.
    async fn mark_read(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// TOPIC-ROLE MAPPING REPOSITORY
// =============================================================================

/// Repository for topic→role reference data.
#[async_trait]
pub trait TopicMappingRepository: Send + Sync {
    /// Find the mapping for a topic.
    ///
    /// When concurrent first-seen races have produced duplicates, returns
    /// the most recently written row.
    async fn find_by_topic(&self, topic: &str) -> Result<Option<TopicRoleMapping>>;

    /// Insert the lazy default mapping (`SITE_ALL` role) for a topic.
    ///
    /// Idempotent: a concurrent insert for the same topic wins silently.
    async fn insert_default(&self, topic: &str) -> Result<()>;

    /// Create or replace a mapping (admin CRUD path).
    async fn upsert(&self, topic: &str, roles: &[String], description: &str) -> Result<Uuid>;

    /// List all mappings.
    async fn list(&self) -> Result<Vec<TopicRoleMapping>>;
}

// =============================================================================
// RECIPIENT DIRECTORY
// =============================================================================

/// Resolves roles and sites to concrete user identifiers.
///
/// Both lookups are best-effort by contract: any transport or auth failure
/// is logged and yields an empty list. Callers treat empty as "notify
/// nobody", never as "retry".
#[async_trait]
pub trait RecipientDirectory: Send + Sync {
    /// Resolve every role to user ids, concatenated in role order.
    ///
    /// A user entitled under several roles appears once per role
    /// (resolved-list semantics; no cross-role de-duplication).
    async fn user_ids_for_roles(&self, roles: &[String]) -> Vec<String>;

    /// Resolve all users registered at a site.
    async fn user_ids_for_site(&self, site: &str) -> Vec<String>;
}
