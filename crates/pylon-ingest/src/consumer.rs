//! Kafka consumer feeding the ingestion pipeline.
//!
//! Manual commit, no auto-commit. The offset is committed once the
//! message is handed to the worker pool (or dropped as malformed); a
//! failure inside the handler is logged and the event is lost rather
//! than redelivered. Dropping beats duplicating here because every
//! stored notification would otherwise be written again on retry.

use std::sync::Arc;

use futures::StreamExt;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};
use rdkafka::TopicPartitionList;
use tracing::{error, info, warn};

use pylon_core::{Error, IncomingEvent, Result};

use crate::config::KafkaConfig;
use crate::pipeline::IngestPipeline;
use crate::worker::IngestPool;

/// Consumer loop binding the bus to the pipeline and worker pool.
pub struct EventConsumer {
    consumer: StreamConsumer,
    pipeline: Arc<IngestPipeline>,
    pool: Arc<IngestPool>,
    topics: Vec<String>,
}

impl EventConsumer {
    /// Create a consumer and subscribe to the configured topics.
    pub fn new(
        config: &KafkaConfig,
        pipeline: Arc<IngestPipeline>,
        pool: Arc<IngestPool>,
    ) -> Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("group.id", &config.group_id)
            .set("client.id", &config.client_id)
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "false")
            .set("session.timeout.ms", config.session_timeout_ms.to_string())
            .create()
            .map_err(|e| Error::Consumer(format!("create consumer: {e}")))?;

        let topic_refs: Vec<&str> = config.topics.iter().map(String::as_str).collect();
        consumer
            .subscribe(&topic_refs)
            .map_err(|e| Error::Consumer(format!("subscribe: {e}")))?;

        info!(
            subsystem = "ingest",
            component = "consumer",
            op = "subscribe",
            group_id = %config.group_id,
            topics = ?config.topics,
            "Subscribed to topics"
        );

        Ok(Self {
            consumer,
            pipeline,
            pool,
            topics: config.topics.clone(),
        })
    }

    /// Run the consumer loop until the stream ends.
    pub async fn run(self) -> Result<()> {
        info!(
            subsystem = "ingest",
            component = "consumer",
            op = "start",
            topics = ?self.topics,
            "Consumer loop started"
        );

        let mut stream = self.consumer.stream();
        while let Some(result) = stream.next().await {
            match result {
                Ok(message) => self.process_message(&message).await,
                Err(e) => {
                    error!(
                        subsystem = "ingest",
                        component = "consumer",
                        error = %e,
                        "Error receiving message"
                    );
                }
            }
        }

        info!(
            subsystem = "ingest",
            component = "consumer",
            op = "stop",
            "Consumer loop ended"
        );
        Ok(())
    }

    async fn process_message(&self, message: &BorrowedMessage<'_>) {
        let topic = message.topic().to_string();

        let incoming: Option<IncomingEvent> = match message.payload() {
            Some(payload) => match serde_json::from_slice(payload) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!(
                        subsystem = "ingest",
                        component = "consumer",
                        topic = %topic,
                        error = %e,
                        "Malformed message body, dropping"
                    );
                    None
                }
            },
            None => {
                warn!(
                    subsystem = "ingest",
                    component = "consumer",
                    topic = %topic,
                    "Empty payload, dropping"
                );
                None
            }
        };

        if let Some(incoming) = incoming {
            let pipeline = self.pipeline.clone();
            self.pool
                .submit(async move {
                    match pipeline.ingest(incoming, &topic).await {
                        Ok(_) => {}
                        Err(Error::MalformedEvent(reason)) => {
                            warn!(
                                subsystem = "ingest",
                                component = "consumer",
                                topic = %topic,
                                reason = %reason,
                                "Malformed event, dropped"
                            );
                        }
                        Err(e) => {
                            error!(
                                subsystem = "ingest",
                                component = "consumer",
                                topic = %topic,
                                error = %e,
                                "Event ingestion failed, event dropped"
                            );
                        }
                    }
                })
                .await;
        }

        // Committed after hand-off (or drop): a crash mid-task loses the
        // event instead of replaying it into duplicate notifications.
        self.commit_offset(message);
    }

    fn commit_offset(&self, message: &BorrowedMessage<'_>) {
        let mut tpl = TopicPartitionList::new();
        if let Err(e) = tpl.add_partition_offset(
            message.topic(),
            message.partition(),
            rdkafka::Offset::Offset(message.offset() + 1),
        ) {
            error!(
                subsystem = "ingest",
                component = "consumer",
                topic = %message.topic(),
                error = %e,
                "Failed to build offset list"
            );
            return;
        }

        if let Err(e) = self.consumer.commit(&tpl, CommitMode::Async) {
            error!(
                subsystem = "ingest",
                component = "consumer",
                topic = %message.topic(),
                error = %e,
                "Failed to commit offset"
            );
        }
    }
}
