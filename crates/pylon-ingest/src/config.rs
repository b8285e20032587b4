//! Kafka consumer configuration from environment variables.

use pylon_core::{defaults, Error, Result};

/// Configuration for the Kafka event consumer.
#[derive(Debug, Clone)]
pub struct KafkaConfig {
    /// Comma-separated broker list.
    pub bootstrap_servers: String,
    /// Consumer group id.
    pub group_id: String,
    /// Client id reported to the brokers.
    pub client_id: String,
    /// Topics to subscribe to.
    pub topics: Vec<String>,
    /// Session timeout in milliseconds.
    pub session_timeout_ms: u64,
}

impl KafkaConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `KAFKA_BOOTSTRAP_SERVERS` | required | Broker list |
    /// | `KAFKA_TOPICS` | required | Comma-separated topic list |
    /// | `KAFKA_GROUP_ID` | `pylon-ingest` | Consumer group |
    /// | `KAFKA_CLIENT_ID` | `pylon` | Client id |
    /// | `KAFKA_SESSION_TIMEOUT_MS` | `30000` | Session timeout |
    pub fn from_env() -> Result<Self> {
        let bootstrap_servers = std::env::var("KAFKA_BOOTSTRAP_SERVERS")
            .map_err(|_| Error::Config("KAFKA_BOOTSTRAP_SERVERS not set".to_string()))?;

        let topics: Vec<String> = std::env::var("KAFKA_TOPICS")
            .map_err(|_| Error::Config("KAFKA_TOPICS not set".to_string()))?
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if topics.is_empty() {
            return Err(Error::Config("KAFKA_TOPICS is empty".to_string()));
        }

        let group_id =
            std::env::var("KAFKA_GROUP_ID").unwrap_or_else(|_| "pylon-ingest".to_string());
        let client_id = std::env::var("KAFKA_CLIENT_ID").unwrap_or_else(|_| "pylon".to_string());

        let session_timeout_ms = std::env::var("KAFKA_SESSION_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults::KAFKA_SESSION_TIMEOUT_MS);

        Ok(Self {
            bootstrap_servers,
            group_id,
            client_id,
            topics,
            session_timeout_ms,
        })
    }
}
