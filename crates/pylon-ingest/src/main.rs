//! pylon-ingest - event-to-notification fan-out service

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pylon_core::defaults;
use pylon_db::Database;
use pylon_directory::{DirectoryConfig, HttpRecipientDirectory};
use pylon_ingest::{
    AudienceResolver, EventConsumer, IngestPipeline, IngestPool, KafkaConfig, MappingListener,
    PoolSettings,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    //
    // Environment variables:
    //   LOG_FORMAT - "json" or "text" (default: "text")
    //   RUST_LOG   - standard env filter (default: "pylon_ingest=debug,pylon_db=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pylon_ingest=debug,pylon_db=debug,pylon_directory=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/pylon".to_string());
    let kafka_config = KafkaConfig::from_env()?;
    let directory_config = DirectoryConfig::from_env()?;
    let pool_settings = PoolSettings::from_env();

    let db = Database::connect(&database_url).await?;
    #[cfg(feature = "migrations")]
    db.migrate().await?;

    let directory = Arc::new(HttpRecipientDirectory::new(directory_config)?);
    let push_bus = Arc::new(pylon_core::PushBus::default());

    let topic_mappings = Arc::new(db.topic_mappings.clone());
    let (first_seen_tx, first_seen_rx) =
        tokio::sync::mpsc::channel(defaults::FIRST_SEEN_QUEUE_CAPACITY);
    let resolver = Arc::new(AudienceResolver::new(
        topic_mappings.clone(),
        first_seen_tx,
    ));

    let listener = MappingListener::new(topic_mappings, resolver.clone(), first_seen_rx);
    tokio::spawn(listener.run());

    let pipeline = Arc::new(IngestPipeline::new(
        Arc::new(db.events.clone()),
        Arc::new(db.notifications.clone()),
        resolver,
        directory,
        push_bus,
    ));

    let pool = Arc::new(IngestPool::new(pool_settings));
    info!(
        subsystem = "ingest",
        op = "startup",
        max_concurrent = pool.max_concurrent(),
        topics = ?kafka_config.topics,
        "pylon-ingest starting"
    );

    let consumer = EventConsumer::new(&kafka_config, pipeline, pool)?;
    consumer.run().await?;
    Ok(())
}
