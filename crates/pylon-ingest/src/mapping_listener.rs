//! Listener that seeds default mappings for first-seen topics.
//!
//! Runs off the ingest hot path: the resolver emits a task when a topic
//! has no mapping; this loop persists the idempotent `SITE_ALL` default
//! and invalidates the resolver cache entry. Operators later curate the
//! seeded row into a real role list.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};

use pylon_core::TopicMappingRepository;

use crate::resolver::{AudienceResolver, TopicFirstSeen};

/// Background worker for topic-first-seen tasks.
pub struct MappingListener {
    mappings: Arc<dyn TopicMappingRepository>,
    resolver: Arc<AudienceResolver>,
    rx: mpsc::Receiver<TopicFirstSeen>,
}

impl MappingListener {
    pub fn new(
        mappings: Arc<dyn TopicMappingRepository>,
        resolver: Arc<AudienceResolver>,
        rx: mpsc::Receiver<TopicFirstSeen>,
    ) -> Self {
        Self {
            mappings,
            resolver,
            rx,
        }
    }

    /// Process first-seen tasks until every sender is dropped.
    pub async fn run(mut self) {
        info!(
            subsystem = "ingest",
            component = "mapping_listener",
            op = "start",
            "Mapping listener started"
        );

        while let Some(task) = self.rx.recv().await {
            self.handle(task).await;
        }

        info!(
            subsystem = "ingest",
            component = "mapping_listener",
            op = "stop",
            "Mapping listener stopped"
        );
    }

    async fn handle(&self, task: TopicFirstSeen) {
        match self.mappings.insert_default(&task.topic).await {
            Ok(()) => {
                info!(
                    subsystem = "ingest",
                    component = "mapping_listener",
                    op = "insert_default",
                    topic = %task.topic,
                    site = %task.site,
                    "Seeded default mapping for first-seen topic"
                );
                self.resolver.invalidate(&task.topic).await;
            }
            Err(e) => {
                // The next event on this topic re-emits the task.
                error!(
                    subsystem = "ingest",
                    component = "mapping_listener",
                    op = "insert_default",
                    topic = %task.topic,
                    error = %e,
                    "Failed to seed default mapping"
                );
            }
        }
    }
}
