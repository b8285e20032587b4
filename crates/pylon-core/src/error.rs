//! Error types for pylon.

use thiserror::Error;

/// Result type alias using pylon's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for pylon operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Notification not found by ID
    #[error("Notification not found: {0}")]
    NotificationNotFound(uuid::Uuid),

    /// Inbound event is missing a required field and was dropped
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// Recipient directory lookup failed
    #[error("Directory error: {0}")]
    Directory(String),

    /// Token exchange or bearer authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Push-channel publish failed
    #[error("Publish error: {0}")]
    Publish(String),

    /// Message bus consume/commit error
    #[error("Consumer error: {0}")]
    Consumer(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
