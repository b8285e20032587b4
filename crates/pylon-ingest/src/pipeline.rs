//! The event ingestion pipeline: validate, persist, fan out, publish.
//!
//! Per-event processing is sequential within one task. Error policy:
//! a malformed event is dropped before anything is persisted; losing the
//! event write aborts the call; everything downstream of a stored event
//! degrades (partial fan-out, missed pushes) rather than failing it.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};
use uuid::Uuid;

use pylon_core::{
    DeliveryChannel, Event, EventRepository, IncomingEvent, NewNotification,
    NotificationRepository, PushMessage, RecipientDirectory, Result,
};

use crate::resolver::AudienceResolver;

/// Structured result of one ingestion, for logging and tests.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// Id of the persisted event.
    pub event_id: Uuid,
    /// Notification rows written (recipients minus failed writes).
    pub notifications_written: usize,
    /// Broadcast publishes emitted (one per role, or one site-wide).
    pub publishes: usize,
    /// Whether the site-wide fallback path was taken.
    pub site_wide_fallback: bool,
}

/// Fan-out pipeline from bus message to stored notifications and pushes.
pub struct IngestPipeline {
    events: Arc<dyn EventRepository>,
    notifications: Arc<dyn NotificationRepository>,
    resolver: Arc<AudienceResolver>,
    directory: Arc<dyn RecipientDirectory>,
    channel: Arc<dyn DeliveryChannel>,
}

impl IngestPipeline {
    pub fn new(
        events: Arc<dyn EventRepository>,
        notifications: Arc<dyn NotificationRepository>,
        resolver: Arc<AudienceResolver>,
        directory: Arc<dyn RecipientDirectory>,
        channel: Arc<dyn DeliveryChannel>,
    ) -> Self {
        Self {
            events,
            notifications,
            resolver,
            directory,
            channel,
        }
    }

    /// Ingest one event arriving on `topic`.
    ///
    /// Validation failure surfaces [`pylon_core::Error::MalformedEvent`]
    /// with nothing persisted; a failed event write surfaces
    /// [`pylon_core::Error::Database`]. An empty recipient set is a
    /// successful outcome with zero notifications and zero publishes.
    pub async fn ingest(&self, incoming: IncomingEvent, topic: &str) -> Result<IngestOutcome> {
        let start = Instant::now();

        let new_event = incoming.into_validated(topic)?;
        let event_id = self.events.insert(new_event.clone()).await?;
        let event = Event::from_new(event_id, new_event);

        let roles = self.resolver.resolve_roles(topic, &event.site).await;
        let site_wide_fallback = roles.is_empty();

        let recipients = if site_wide_fallback {
            self.directory.user_ids_for_site(&event.site).await
        } else {
            self.directory.user_ids_for_roles(&roles).await
        };

        if recipients.is_empty() {
            info!(
                subsystem = "ingest",
                component = "pipeline",
                op = "ingest",
                event_id = %event_id,
                topic = %topic,
                site = %event.site,
                site_wide_fallback,
                duration_ms = start.elapsed().as_millis() as u64,
                "No recipients resolved, event stored without fan-out"
            );
            return Ok(IngestOutcome {
                event_id,
                notifications_written: 0,
                publishes: 0,
                site_wide_fallback,
            });
        }

        let mut notifications_written = 0;
        for recipient in &recipients {
            let notification = NewNotification::for_event(&event, recipient.as_str());
            match self.notifications.insert(notification).await {
                Ok(_) => notifications_written += 1,
                Err(e) => {
                    // Partial fan-out is accepted; no rollback.
                    warn!(
                        subsystem = "ingest",
                        component = "pipeline",
                        op = "ingest",
                        event_id = %event_id,
                        recipient = %recipient,
                        error = %e,
                        "Notification write failed, skipping recipient"
                    );
                }
            }
        }

        // One broadcast per role keeps publish volume independent of
        // recipient count; the payload carries no recipient identity.
        let message = PushMessage::broadcast_for_event(&event);
        let publishes = if site_wide_fallback {
            self.channel.publish_to_topic(&event.site, &message).await;
            1
        } else {
            for role in &roles {
                self.channel.publish_to_topic(role, &message).await;
            }
            roles.len()
        };

        info!(
            subsystem = "ingest",
            component = "pipeline",
            op = "ingest",
            event_id = %event_id,
            topic = %topic,
            classification = %event.classification,
            site = %event.site,
            role_count = roles.len(),
            recipient_count = recipients.len(),
            notification_count = notifications_written,
            publish_count = publishes,
            site_wide_fallback,
            duration_ms = start.elapsed().as_millis() as u64,
            "Event ingested"
        );

        Ok(IngestOutcome {
            event_id,
            notifications_written,
            publishes,
            site_wide_fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::AudienceResolver;
    use crate::test_support::{
        InMemoryEventRepository, InMemoryNotificationRepository, InMemoryTopicMappingRepository,
        RecordingChannel, StaticDirectory,
    };
    use pylon_core::{Error, NotificationKind, NotificationStatus, Priority};
    use serde_json::json;
    use tokio::sync::mpsc;

    struct Fixture {
        pipeline: IngestPipeline,
        events: Arc<InMemoryEventRepository>,
        notifications: Arc<InMemoryNotificationRepository>,
        mappings: Arc<InMemoryTopicMappingRepository>,
        channel: Arc<RecordingChannel>,
        first_seen_rx: mpsc::Receiver<crate::resolver::TopicFirstSeen>,
    }

    fn fixture(directory: StaticDirectory) -> Fixture {
        let events = Arc::new(InMemoryEventRepository::default());
        let notifications = Arc::new(InMemoryNotificationRepository::default());
        let mappings = Arc::new(InMemoryTopicMappingRepository::default());
        let channel = Arc::new(RecordingChannel::default());
        let (tx, first_seen_rx) = mpsc::channel(8);
        let resolver = Arc::new(AudienceResolver::new(mappings.clone(), tx));

        let pipeline = IngestPipeline::new(
            events.clone(),
            notifications.clone(),
            resolver,
            Arc::new(directory),
            channel.clone(),
        );
        Fixture {
            pipeline,
            events,
            notifications,
            mappings,
            channel,
            first_seen_rx,
        }
    }

    fn incoming() -> IncomingEvent {
        IncomingEvent {
            classification: "maintenance_due".to_string(),
            origin: "condition-monitor".to_string(),
            smart_service: None,
            module: Some("M1".to_string()),
            site: Some("PILOT_A".to_string()),
            result: Some(json!({"rms": 4.2})),
            priority: Some(Priority::High),
            description: Some("Bearing wear above threshold".to_string()),
            timestamp: None,
        }
    }

    #[tokio::test]
    async fn test_mapped_topic_one_event_n_notifications_one_publish_per_role() {
        let mut directory = StaticDirectory::default();
        directory.add_role("TECHNICIAN", &["u1", "u2"]);
        let f = fixture(directory);
        f.mappings.seed("maint.alerts", &["TECHNICIAN"]).await;

        let outcome = f.pipeline.ingest(incoming(), "maint.alerts").await.unwrap();

        assert_eq!(f.events.all().await.len(), 1);
        assert_eq!(outcome.notifications_written, 2);
        assert_eq!(outcome.publishes, 1);
        assert!(!outcome.site_wide_fallback);

        let stored = f.notifications.all().await;
        assert_eq!(stored.len(), 2);
        let recipients: Vec<_> = stored.iter().map(|n| n.recipient.clone()).collect();
        assert!(recipients.contains(&"u1".to_string()));
        assert!(recipients.contains(&"u2".to_string()));
        for n in &stored {
            assert_eq!(n.kind, NotificationKind::Event);
            assert_eq!(n.status, NotificationStatus::Unread);
            assert_eq!(n.related_event, Some(outcome.event_id));
            assert_eq!(n.priority, Priority::High);
        }

        let frames = f.channel.frames().await;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].0, "/topic/notifications/TECHNICIAN");
        assert!(frames[0].1.notification_id.is_none());
    }

    #[tokio::test]
    async fn test_multi_role_one_publish_per_role_duplicates_kept() {
        let mut directory = StaticDirectory::default();
        directory.add_role("TECHNICIAN", &["u1", "u2"]);
        directory.add_role("SUPERVISOR", &["u2"]);
        let f = fixture(directory);
        f.mappings
            .seed("maint.alerts", &["TECHNICIAN", "SUPERVISOR"])
            .await;

        let outcome = f.pipeline.ingest(incoming(), "maint.alerts").await.unwrap();

        // u2 is entitled under both roles and gets one row per role.
        assert_eq!(outcome.notifications_written, 3);
        assert_eq!(outcome.publishes, 2);

        let frames = f.channel.frames().await;
        let destinations: Vec<_> = frames.iter().map(|(d, _)| d.clone()).collect();
        assert!(destinations.contains(&"/topic/notifications/TECHNICIAN".to_string()));
        assert!(destinations.contains(&"/topic/notifications/SUPERVISOR".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_topic_falls_back_site_wide() {
        let mut directory = StaticDirectory::default();
        directory.add_site("PILOT_A", &["u5", "u6", "u7"]);
        let mut f = fixture(directory);

        let outcome = f.pipeline.ingest(incoming(), "brand.new").await.unwrap();

        assert!(outcome.site_wide_fallback);
        assert_eq!(outcome.notifications_written, 3);
        assert_eq!(outcome.publishes, 1);

        let frames = f.channel.frames().await;
        assert_eq!(frames[0].0, "/topic/notifications/PILOT_A");

        let task = f.first_seen_rx.try_recv().expect("first-seen task emitted");
        assert_eq!(task.topic, "brand.new");
    }

    #[tokio::test]
    async fn test_malformed_event_persists_and_publishes_nothing() {
        let f = fixture(StaticDirectory::default());
        let mut bad = incoming();
        bad.site = None;

        let err = f.pipeline.ingest(bad, "maint.alerts").await.unwrap_err();
        assert!(matches!(err, Error::MalformedEvent(_)));
        assert!(f.events.all().await.is_empty());
        assert!(f.notifications.all().await.is_empty());
        assert!(f.channel.frames().await.is_empty());
    }

    #[tokio::test]
    async fn test_event_write_failure_aborts_ingestion() {
        let f = fixture(StaticDirectory::default());
        f.events.fail_next_insert().await;

        let err = f.pipeline.ingest(incoming(), "maint.alerts").await.unwrap_err();
        assert!(matches!(err, Error::Database(_)));
        assert!(f.notifications.all().await.is_empty());
        assert!(f.channel.frames().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_recipients_stores_event_without_fanout() {
        // Directory knows nobody for the role or the site.
        let f = fixture(StaticDirectory::default());
        f.mappings.seed("maint.alerts", &["TECHNICIAN"]).await;

        let outcome = f.pipeline.ingest(incoming(), "maint.alerts").await.unwrap();

        assert_eq!(outcome.notifications_written, 0);
        assert_eq!(outcome.publishes, 0);
        assert_eq!(f.events.all().await.len(), 1);
        assert!(f.channel.frames().await.is_empty());
    }

    #[tokio::test]
    async fn test_partial_notification_failure_continues_fanout() {
        let mut directory = StaticDirectory::default();
        directory.add_role("TECHNICIAN", &["u1", "u2", "u3"]);
        let f = fixture(directory);
        f.mappings.seed("maint.alerts", &["TECHNICIAN"]).await;
        f.notifications.fail_nth_insert(1).await;

        let outcome = f.pipeline.ingest(incoming(), "maint.alerts").await.unwrap();

        assert_eq!(outcome.notifications_written, 2);
        assert_eq!(outcome.publishes, 1, "publish still happens");
        assert_eq!(f.notifications.all().await.len(), 2);
    }

    #[tokio::test]
    async fn test_broadcast_payload_matches_event_content() {
        let mut directory = StaticDirectory::default();
        directory.add_role("TECHNICIAN", &["u1"]);
        let f = fixture(directory);
        f.mappings.seed("maint.alerts", &["TECHNICIAN"]).await;

        let outcome = f.pipeline.ingest(incoming(), "maint.alerts").await.unwrap();

        let frames = f.channel.frames().await;
        let msg = &frames[0].1;
        assert_eq!(msg.related_event, Some(outcome.event_id));
        assert_eq!(msg.priority, Priority::High);
        assert_eq!(msg.module, "M1");
        assert_eq!(msg.site, "PILOT_A");
        assert_eq!(msg.description, "Bearing wear above threshold");
    }
}
