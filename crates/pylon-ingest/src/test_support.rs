//! In-memory fakes for pipeline, resolver, and notifier tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use pylon_core::{
    DeliveryChannel, Error, Event, EventRepository, NewEvent, NewNotification, Notification,
    NotificationKind, NotificationRepository, NotificationStatus, Page, PushMessage,
    RecipientDirectory, Result, TopicMappingRepository, TopicRoleMapping,
};

fn storage_error() -> Error {
    Error::Database(sqlx::Error::PoolClosed)
}

// =============================================================================
// EVENT REPOSITORY
// =============================================================================

#[derive(Default)]
pub struct InMemoryEventRepository {
    events: Mutex<Vec<Event>>,
    fail_next_insert: Mutex<bool>,
}

impl InMemoryEventRepository {
    pub async fn all(&self) -> Vec<Event> {
        self.events.lock().await.clone()
    }

    pub async fn fail_next_insert(&self) {
        *self.fail_next_insert.lock().await = true;
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn insert(&self, event: NewEvent) -> Result<Uuid> {
        let mut fail = self.fail_next_insert.lock().await;
        if *fail {
            *fail = false;
            return Err(storage_error());
        }
        let id = pylon_core::new_v7();
        self.events.lock().await.push(Event::from_new(id, event));
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Event>> {
        Ok(self.events.lock().await.iter().find(|e| e.id == id).cloned())
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Event>> {
        let events = self.events.lock().await;
        Ok(events.iter().rev().take(limit as usize).cloned().collect())
    }
}

// =============================================================================
// NOTIFICATION REPOSITORY
// =============================================================================

#[derive(Default)]
pub struct InMemoryNotificationRepository {
    notifications: Mutex<Vec<Notification>>,
    insert_calls: Mutex<usize>,
    fail_on_insert: Mutex<Option<usize>>,
}

impl InMemoryNotificationRepository {
    pub async fn all(&self) -> Vec<Notification> {
        self.notifications.lock().await.clone()
    }

    /// Fail the n-th insert call (zero-based).
    pub async fn fail_nth_insert(&self, n: usize) {
        *self.fail_on_insert.lock().await = Some(n);
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn insert(&self, notification: NewNotification) -> Result<Uuid> {
        let call = {
            let mut calls = self.insert_calls.lock().await;
            let current = *calls;
            *calls += 1;
            current
        };
        if *self.fail_on_insert.lock().await == Some(call) {
            return Err(storage_error());
        }

        let id = pylon_core::new_v7();
        self.notifications.lock().await.push(Notification {
            id,
            recipient: notification.recipient,
            kind: notification.kind,
            status: notification.status,
            related_event: notification.related_event,
            related_assignment: notification.related_assignment,
            priority: notification.priority,
            description: notification.description,
            module: notification.module,
            site: notification.site,
            origin: notification.origin,
            timestamp: notification.timestamp,
        });
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Notification> {
        self.notifications
            .lock()
            .await
            .iter()
            .find(|n| n.id == id)
            .cloned()
            .ok_or(Error::NotificationNotFound(id))
    }

    async fn list_for_recipient(&self, recipient: &str, page: Page) -> Result<Vec<Notification>> {
        let notifications = self.notifications.lock().await;
        Ok(notifications
            .iter()
            .filter(|n| n.recipient == recipient)
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn list_for_recipient_by_status(
        &self,
        recipient: &str,
        status: NotificationStatus,
        page: Page,
    ) -> Result<Vec<Notification>> {
        let all = self.list_for_recipient(recipient, page).await?;
        Ok(all.into_iter().filter(|n| n.status == status).collect())
    }

    async fn list_for_recipient_by_kind(
        &self,
        recipient: &str,
        kind: NotificationKind,
        page: Page,
    ) -> Result<Vec<Notification>> {
        let all = self.list_for_recipient(recipient, page).await?;
        Ok(all.into_iter().filter(|n| n.kind == kind).collect())
    }

    async fn mark_read(&self, id: Uuid) -> Result<()> {
        let mut notifications = self.notifications.lock().await;
        match notifications.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.status = NotificationStatus::Read;
                Ok(())
            }
            None => Err(Error::NotificationNotFound(id)),
        }
    }
}

// =============================================================================
// TOPIC MAPPING REPOSITORY
// =============================================================================

#[derive(Default)]
pub struct InMemoryTopicMappingRepository {
    mappings: Mutex<HashMap<String, TopicRoleMapping>>,
    find_calls: Mutex<usize>,
    fail_next_find: Mutex<bool>,
    fail_next_insert_default: Mutex<bool>,
}

impl InMemoryTopicMappingRepository {
    pub async fn seed(&self, topic: &str, roles: &[&str]) {
        let now = Utc::now();
        self.mappings.lock().await.insert(
            topic.to_string(),
            TopicRoleMapping {
                id: pylon_core::new_v7(),
                topic: topic.to_string(),
                roles: roles.iter().map(|r| r.to_string()).collect(),
                description: String::new(),
                created_at: now,
                updated_at: now,
            },
        );
    }

    pub async fn find_calls(&self) -> usize {
        *self.find_calls.lock().await
    }

    pub async fn fail_next_find(&self) {
        *self.fail_next_find.lock().await = true;
    }

    pub async fn fail_next_insert_default(&self) {
        *self.fail_next_insert_default.lock().await = true;
    }

    pub async fn list_all(&self) -> Vec<TopicRoleMapping> {
        self.mappings.lock().await.values().cloned().collect()
    }
}

#[async_trait]
impl TopicMappingRepository for InMemoryTopicMappingRepository {
    async fn find_by_topic(&self, topic: &str) -> Result<Option<TopicRoleMapping>> {
        *self.find_calls.lock().await += 1;
        let mut fail = self.fail_next_find.lock().await;
        if *fail {
            *fail = false;
            return Err(storage_error());
        }
        Ok(self.mappings.lock().await.get(topic).cloned())
    }

    async fn insert_default(&self, topic: &str) -> Result<()> {
        let mut fail = self.fail_next_insert_default.lock().await;
        if *fail {
            *fail = false;
            return Err(storage_error());
        }
        let mut mappings = self.mappings.lock().await;
        if !mappings.contains_key(topic) {
            let now = Utc::now();
            mappings.insert(
                topic.to_string(),
                TopicRoleMapping {
                    id: pylon_core::new_v7(),
                    topic: topic.to_string(),
                    roles: vec![pylon_core::SITE_ALL_ROLE.to_string()],
                    description: "Auto-created default mapping".to_string(),
                    created_at: now,
                    updated_at: now,
                },
            );
        }
        Ok(())
    }

    async fn upsert(&self, topic: &str, roles: &[String], description: &str) -> Result<Uuid> {
        let id = pylon_core::new_v7();
        let now = Utc::now();
        self.mappings.lock().await.insert(
            topic.to_string(),
            TopicRoleMapping {
                id,
                topic: topic.to_string(),
                roles: roles.to_vec(),
                description: description.to_string(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn list(&self) -> Result<Vec<TopicRoleMapping>> {
        Ok(self.list_all().await)
    }
}

// =============================================================================
// RECIPIENT DIRECTORY
// =============================================================================

#[derive(Default)]
pub struct StaticDirectory {
    roles: HashMap<String, Vec<String>>,
    sites: HashMap<String, Vec<String>>,
}

impl StaticDirectory {
    pub fn add_role(&mut self, role: &str, ids: &[&str]) {
        self.roles
            .insert(role.to_string(), ids.iter().map(|i| i.to_string()).collect());
    }

    pub fn add_site(&mut self, site: &str, ids: &[&str]) {
        self.sites
            .insert(site.to_string(), ids.iter().map(|i| i.to_string()).collect());
    }
}

#[async_trait]
impl RecipientDirectory for StaticDirectory {
    async fn user_ids_for_roles(&self, roles: &[String]) -> Vec<String> {
        roles
            .iter()
            .flat_map(|r| self.roles.get(r).cloned().unwrap_or_default())
            .collect()
    }

    async fn user_ids_for_site(&self, site: &str) -> Vec<String> {
        self.sites.get(site).cloned().unwrap_or_default()
    }
}

// =============================================================================
// DELIVERY CHANNEL
// =============================================================================

#[derive(Default)]
pub struct RecordingChannel {
    frames: Mutex<Vec<(String, PushMessage)>>,
}

impl RecordingChannel {
    pub async fn frames(&self) -> Vec<(String, PushMessage)> {
        self.frames.lock().await.clone()
    }
}

#[async_trait]
impl DeliveryChannel for RecordingChannel {
    async fn publish_to_user(&self, user_id: &str, message: &PushMessage) {
        self.frames
            .lock()
            .await
            .push((pylon_core::user_destination(user_id), message.clone()));
    }

    async fn publish_to_topic(&self, topic_or_role: &str, message: &PushMessage) {
        self.frames
            .lock()
            .await
            .push((pylon_core::topic_destination(topic_or_role), message.clone()));
    }
}
