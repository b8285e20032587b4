//! Centralized default constants for pylon.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for notification listings.
pub const PAGE_LIMIT: i64 = 50;

/// Default page offset.
pub const PAGE_OFFSET: i64 = 0;

// =============================================================================
// INGESTION
// =============================================================================

/// Default maximum concurrent ingestion tasks on the worker pool.
///
/// Tens, not thousands: one slot per in-flight event keeps a hung
/// directory call from tying up more than a single slot.
pub const INGEST_MAX_CONCURRENT: usize = 16;

/// Capacity of the topic-first-seen side channel between the audience
/// resolver and the mapping listener. Overflow is dropped; the next event
/// on the same unmapped topic re-emits the task.
pub const FIRST_SEEN_QUEUE_CAPACITY: usize = 64;

// =============================================================================
// PUSH CHANNEL
// =============================================================================

/// Default push bus broadcast channel capacity.
pub const PUSH_BUS_CAPACITY: usize = 256;

// =============================================================================
// DIRECTORY CLIENT
// =============================================================================

/// HTTP timeout for directory and token-endpoint requests, in seconds.
pub const DIRECTORY_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// MESSAGE BUS
// =============================================================================

/// Kafka consumer session timeout in milliseconds.
pub const KAFKA_SESSION_TIMEOUT_MS: u64 = 30_000;
