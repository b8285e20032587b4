//! Audience resolution: topic to entitled roles.
//!
//! Lookups go through a read-through cache keyed by topic. A topic with
//! no mapping resolves to the empty role list (the caller falls back to
//! site-wide delivery) and emits a first-seen task so the mapping
//! listener can seed the default mapping off the hot path.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

use pylon_core::{TopicMappingRepository, SITE_ALL_ROLE};

/// Task emitted when an event arrives on a topic with no known mapping.
#[derive(Debug, Clone)]
pub struct TopicFirstSeen {
    pub topic: String,
    /// Site of the triggering event, carried for log context.
    pub site: String,
}

/// Resolves a bus topic to the roles entitled to its notifications.
pub struct AudienceResolver {
    mappings: Arc<dyn TopicMappingRepository>,
    cache: RwLock<HashMap<String, Vec<String>>>,
    first_seen_tx: mpsc::Sender<TopicFirstSeen>,
}

impl AudienceResolver {
    pub fn new(
        mappings: Arc<dyn TopicMappingRepository>,
        first_seen_tx: mpsc::Sender<TopicFirstSeen>,
    ) -> Self {
        Self {
            mappings,
            cache: RwLock::new(HashMap::new()),
            first_seen_tx,
        }
    }

    /// Resolve the roles for a topic. Never errors.
    ///
    /// Empty means "no specific mapping": either the topic is unknown, the
    /// mapping carries only the `SITE_ALL` sentinel, or the store was
    /// unreachable. The caller treats empty as the site-wide fallback.
    pub async fn resolve_roles(&self, topic: &str, site: &str) -> Vec<String> {
        {
            let cache = self.cache.read().await;
            if let Some(roles) = cache.get(topic) {
                debug!(
                    subsystem = "ingest",
                    component = "resolver",
                    op = "resolve_roles",
                    topic = %topic,
                    role_count = roles.len(),
                    "Cache hit"
                );
                return roles.clone();
            }
        }

        match self.mappings.find_by_topic(topic).await {
            Ok(Some(mapping)) => {
                let roles: Vec<String> = mapping
                    .roles
                    .into_iter()
                    .filter(|r| r != SITE_ALL_ROLE)
                    .collect();
                debug!(
                    subsystem = "ingest",
                    component = "resolver",
                    op = "resolve_roles",
                    topic = %topic,
                    role_count = roles.len(),
                    "Cache miss, mapping loaded"
                );
                let mut cache = self.cache.write().await;
                cache.insert(topic.to_string(), roles.clone());
                roles
            }
            Ok(None) => {
                debug!(
                    subsystem = "ingest",
                    component = "resolver",
                    op = "resolve_roles",
                    topic = %topic,
                    site = %site,
                    "Unknown topic, falling back site-wide"
                );
                // Unknown topics are not cached so the seeded default is
                // picked up on the next event. A full first-seen queue
                // just drops the task; a later event re-emits it.
                let task = TopicFirstSeen {
                    topic: topic.to_string(),
                    site: site.to_string(),
                };
                if self.first_seen_tx.try_send(task).is_err() {
                    warn!(
                        subsystem = "ingest",
                        component = "resolver",
                        topic = %topic,
                        "First-seen queue full, default mapping deferred"
                    );
                }
                Vec::new()
            }
            Err(e) => {
                warn!(
                    subsystem = "ingest",
                    component = "resolver",
                    op = "resolve_roles",
                    topic = %topic,
                    error = %e,
                    "Mapping lookup failed, falling back site-wide"
                );
                Vec::new()
            }
        }
    }

    /// Drop the cached entry for a topic (called after mapping writes).
    pub async fn invalidate(&self, topic: &str) {
        let mut cache = self.cache.write().await;
        cache.remove(topic);
    }
}
