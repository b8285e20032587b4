//! Notification repository for per-recipient delivery records.
//!
//! One row per (event, recipient) pair plus one row per assignment. The
//! only mutation after creation is flipping `status` to read.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use pylon_core::{
    Error, NewNotification, Notification, NotificationKind, NotificationRepository,
    NotificationStatus, Page, Priority, Result,
};

/// PostgreSQL notification repository.
#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: Pool<Postgres>,
}

const SELECT_COLUMNS: &str = "id, recipient, kind, status, related_event, related_assignment,
                              priority, description, module, site, origin, timestamp";

impl PgNotificationRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(r: &sqlx::postgres::PgRow) -> Result<Notification> {
        let kind: String = r.get("kind");
        let kind = NotificationKind::parse(&kind)
            .ok_or_else(|| Error::Serialization(format!("unknown kind: {kind}")))?;
        let status: String = r.get("status");
        let status = NotificationStatus::parse(&status)
            .ok_or_else(|| Error::Serialization(format!("unknown status: {status}")))?;
        let priority: String = r.get("priority");
        let priority = Priority::parse(&priority)
            .ok_or_else(|| Error::Serialization(format!("unknown priority: {priority}")))?;
        Ok(Notification {
            id: r.get("id"),
            recipient: r.get("recipient"),
            kind,
            status,
            related_event: r.get("related_event"),
            related_assignment: r.get("related_assignment"),
            priority,
            description: r.get("description"),
            module: r.get("module"),
            site: r.get("site"),
            origin: r.get("origin"),
            timestamp: r.get("timestamp"),
        })
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn insert(&self, notification: NewNotification) -> Result<Uuid> {
        let id = pylon_core::new_v7();
        sqlx::query(
            "INSERT INTO notification (id, recipient, kind, status, related_event,
                                       related_assignment, priority, description,
                                       module, site, origin, timestamp)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(id)
        .bind(&notification.recipient)
        .bind(notification.kind.as_str())
        .bind(notification.status.as_str())
        .bind(notification.related_event)
        .bind(notification.related_assignment)
        .bind(notification.priority.as_str())
        .bind(&notification.description)
        .bind(&notification.module)
        .bind(&notification.site)
        .bind(&notification.origin)
        .bind(notification.timestamp)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Notification> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM notification WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        match row {
            Some(r) => Self::parse_row(&r),
            None => Err(Error::NotificationNotFound(id)),
        }
    }

    async fn list_for_recipient(&self, recipient: &str, page: Page) -> Result<Vec<Notification>> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM notification
             WHERE recipient = $1
             ORDER BY id DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(recipient)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(Self::parse_row).collect()
    }

    async fn list_for_recipient_by_status(
        &self,
        recipient: &str,
        status: NotificationStatus,
        page: Page,
    ) -> Result<Vec<Notification>> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM notification
             WHERE recipient = $1 AND status = $2
             ORDER BY id DESC
             LIMIT $3 OFFSET $4"
        ))
        .bind(recipient)
        .bind(status.as_str())
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(Self::parse_row).collect()
    }

    async fn list_for_recipient_by_kind(
        &self,
        recipient: &str,
        kind: NotificationKind,
        page: Page,
    ) -> Result<Vec<Notification>> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM notification
             WHERE recipient = $1 AND kind = $2
             ORDER BY id DESC
             LIMIT $3 OFFSET $4"
        ))
        .bind(recipient)
        .bind(kind.as_str())
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(Self::parse_row).collect()
    }

    async fn mark_read(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("UPDATE notification SET status = 'read' WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotificationNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::DEFAULT_TEST_DATABASE_URL;
    use chrono::Utc;

    async fn setup() -> PgNotificationRepository {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_TEST_DATABASE_URL.to_string());
        let pool = crate::create_pool(&database_url)
            .await
            .expect("Failed to connect to test DB");
        PgNotificationRepository::new(pool)
    }

    fn test_recipient() -> String {
        format!("user-{}", Uuid::new_v4())
    }

    fn test_notification(recipient: &str, related_event: Uuid) -> NewNotification {
        NewNotification {
            recipient: recipient.to_string(),
            kind: NotificationKind::Event,
            status: NotificationStatus::Unread,
            related_event: Some(related_event),
            related_assignment: None,
            priority: Priority::Medium,
            description: "Test notification".to_string(),
            module: "M1".to_string(),
            site: "PILOT_A".to_string(),
            origin: "test".to_string(),
            timestamp: Utc::now(),
        }
    }

    async fn insert_event(pool: &Pool<Postgres>) -> Uuid {
        use pylon_core::{EventRepository, NewEvent};
        let repo = crate::events::PgEventRepository::new(pool.clone());
        repo.insert(NewEvent {
            classification: "test".to_string(),
            origin: "test".to_string(),
            smart_service: None,
            module: "M1".to_string(),
            site: "PILOT_A".to_string(),
            result: None,
            priority: Priority::Medium,
            description: String::new(),
            timestamp: Utc::now(),
            topic: "test.topic".to_string(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_notification_insert_and_get() {
        let repo = setup().await;
        let event_id = insert_event(&repo.pool).await;
        let recipient = test_recipient();
        let id = repo
            .insert(test_notification(&recipient, event_id))
            .await
            .unwrap();

        let n = repo.get(id).await.unwrap();
        assert_eq!(n.recipient, recipient);
        assert_eq!(n.kind, NotificationKind::Event);
        assert_eq!(n.status, NotificationStatus::Unread);
        assert_eq!(n.related_event, Some(event_id));
        assert!(n.related_assignment.is_none());
    }

    #[tokio::test]
    async fn test_notification_get_missing_is_error() {
        let repo = setup().await;
        let err = repo.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::NotificationNotFound(_)));
    }

    #[tokio::test]
    async fn test_notification_listing_scoped_to_recipient() {
        let repo = setup().await;
        let event_id = insert_event(&repo.pool).await;
        let alice = test_recipient();
        let bob = test_recipient();
        repo.insert(test_notification(&alice, event_id))
            .await
            .unwrap();
        repo.insert(test_notification(&alice, event_id))
            .await
            .unwrap();
        repo.insert(test_notification(&bob, event_id)).await.unwrap();

        let for_alice = repo
            .list_for_recipient(&alice, Page::default())
            .await
            .unwrap();
        assert_eq!(for_alice.len(), 2);
        assert!(for_alice.iter().all(|n| n.recipient == alice));

        let for_bob = repo.list_for_recipient(&bob, Page::default()).await.unwrap();
        assert_eq!(for_bob.len(), 1);
    }

    #[tokio::test]
    async fn test_mark_read_flips_status() {
        let repo = setup().await;
        let event_id = insert_event(&repo.pool).await;
        let recipient = test_recipient();
        let id = repo
            .insert(test_notification(&recipient, event_id))
            .await
            .unwrap();

        repo.mark_read(id).await.unwrap();
        let n = repo.get(id).await.unwrap();
        assert_eq!(n.status, NotificationStatus::Read);

        let unread = repo
            .list_for_recipient_by_status(&recipient, NotificationStatus::Unread, Page::default())
            .await
            .unwrap();
        assert!(unread.is_empty());
    }

    #[tokio::test]
    async fn test_mark_read_missing_is_error() {
        let repo = setup().await;
        let err = repo.mark_read(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::NotificationNotFound(_)));
    }
}
