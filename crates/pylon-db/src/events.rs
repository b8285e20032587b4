//! Event repository for persisted domain events.
//!
//! Events are immutable once written. The pipeline inserts at consumption
//! time; reads serve the notification detail surface and diagnostics.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use pylon_core::{Error, Event, EventRepository, NewEvent, Priority, Result};

/// PostgreSQL event repository.
#[derive(Clone)]
pub struct PgEventRepository {
    pool: Pool<Postgres>,
}

impl PgEventRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(r: &sqlx::postgres::PgRow) -> Result<Event> {
        let priority: String = r.get("priority");
        let priority = Priority::parse(&priority)
            .ok_or_else(|| Error::Serialization(format!("unknown priority: {priority}")))?;
        Ok(Event {
            id: r.get("id"),
            classification: r.get("classification"),
            origin: r.get("origin"),
            smart_service: r.get("smart_service"),
            module: r.get("module"),
            site: r.get("site"),
            result: r.get("result"),
            priority,
            description: r.get("description"),
            timestamp: r.get("timestamp"),
            topic: r.get("topic"),
        })
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn insert(&self, event: NewEvent) -> Result<Uuid> {
        let id = pylon_core::new_v7();
        sqlx::query(
            "INSERT INTO event (id, classification, origin, smart_service, module, site,
                                result, priority, description, timestamp, topic)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(id)
        .bind(&event.classification)
        .bind(&event.origin)
        .bind(&event.smart_service)
        .bind(&event.module)
        .bind(&event.site)
        .bind(&event.result)
        .bind(event.priority.as_str())
        .bind(&event.description)
        .bind(event.timestamp)
        .bind(&event.topic)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Event>> {
        let row = sqlx::query(
            "SELECT id, classification, origin, smart_service, module, site,
                    result, priority, description, timestamp, topic
             FROM event WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(Self::parse_row).transpose()
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Event>> {
        let rows = sqlx::query(
            "SELECT id, classification, origin, smart_service, module, site,
                    result, priority, description, timestamp, topic
             FROM event ORDER BY id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(Self::parse_row).collect()
    }
}
