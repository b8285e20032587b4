//! # pylon-ingest
//!
//! Event consumption and notification fan-out for pylon.
//!
//! This crate binds the message bus to the persistence and delivery
//! layers: a Kafka consumer hands incoming events to a bounded worker
//! pool, the pipeline persists the event, resolves its audience through
//! the topic-role mapping and the user directory, writes one notification
//! per recipient, and publishes role-addressed broadcasts on the push
//! channel. The assignment notifier covers the unicast flow.

pub mod assignments;
pub mod config;
pub mod consumer;
pub mod mapping_listener;
pub mod pipeline;
pub mod resolver;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use assignments::AssignmentNotifier;
pub use config::KafkaConfig;
pub use consumer::EventConsumer;
pub use mapping_listener::MappingListener;
pub use pipeline::{IngestOutcome, IngestPipeline};
pub use resolver::{AudienceResolver, TopicFirstSeen};
pub use worker::{IngestPool, PoolSettings};
