//! Topic-role mapping repository.
//!
//! Reference data maintained by operators, with a self-healing default:
//! the first event on an unknown topic triggers `insert_default`, which
//! seeds the `SITE_ALL` fallback mapping so the topic becomes visible for
//! curation without dropping traffic.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use pylon_core::{Error, Result, TopicMappingRepository, TopicRoleMapping, SITE_ALL_ROLE};

/// PostgreSQL topic-role mapping repository.
#[derive(Clone)]
pub struct PgTopicMappingRepository {
    pool: Pool<Postgres>,
}

impl PgTopicMappingRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(r: &sqlx::postgres::PgRow) -> TopicRoleMapping {
        TopicRoleMapping {
            id: r.get("id"),
            topic: r.get("topic"),
            roles: r.get("roles"),
            description: r.get("description"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }
    }
}

#[async_trait]
impl TopicMappingRepository for PgTopicMappingRepository {
    async fn find_by_topic(&self, topic: &str) -> Result<Option<TopicRoleMapping>> {
        // ORDER BY updated_at guards against historical duplicates from
        // before the unique constraint existed.
        let row = sqlx::query(
            "SELECT id, topic, roles, description, created_at, updated_at
             FROM topic_role_mapping
             WHERE topic = $1
             ORDER BY updated_at DESC
             LIMIT 1",
        )
        .bind(topic)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(Self::parse_row))
    }

    async fn insert_default(&self, topic: &str) -> Result<()> {
        let id = pylon_core::new_v7();
        let now = Utc::now();
        // Concurrent first-seen inserts race; the constraint makes the
        // loser a no-op rather than an error.
        sqlx::query(
            "INSERT INTO topic_role_mapping (id, topic, roles, description, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)
             ON CONFLICT (topic) DO NOTHING",
        )
        .bind(id)
        .bind(topic)
        .bind(vec![SITE_ALL_ROLE.to_string()])
        .bind("Auto-created default mapping")
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn upsert(&self, topic: &str, roles: &[String], description: &str) -> Result<Uuid> {
        let id = pylon_core::new_v7();
        let now = Utc::now();
        let row = sqlx::query(
            "INSERT INTO topic_role_mapping (id, topic, roles, description, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)
             ON CONFLICT (topic) DO UPDATE SET
                roles = EXCLUDED.roles,
                description = EXCLUDED.description,
                updated_at = EXCLUDED.updated_at
             RETURNING id",
        )
        .bind(id)
        .bind(topic)
        .bind(roles)
        .bind(description)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.get("id"))
    }

    async fn list(&self) -> Result<Vec<TopicRoleMapping>> {
        let rows = sqlx::query(
            "SELECT id, topic, roles, description, created_at, updated_at
             FROM topic_role_mapping ORDER BY topic",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::parse_row).collect())
    }
}
