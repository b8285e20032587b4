//! Structured logging field name constants for pylon.
//!
//! All crates use these constants for consistent structured logging fields
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, degradation policy applied |
//! | INFO  | Lifecycle events, ingestion completions |
//! | DEBUG | Decision points, cache hits/misses, config choices |
//! | TRACE | Per-recipient iteration, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "ingest", "directory", "db", "channel"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pipeline", "resolver", "consumer", "pool", "push_bus"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "ingest", "resolve_roles", "user_ids_for_roles", "publish"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Event UUID being processed.
pub const EVENT_ID: &str = "event_id";

/// Notification UUID being written or published.
pub const NOTIFICATION_ID: &str = "notification_id";

/// Assignment UUID behind an assignment notification.
pub const ASSIGNMENT_ID: &str = "assignment_id";

/// Bus topic an event arrived on.
pub const TOPIC: &str = "topic";

/// Pilot/site partition.
pub const SITE: &str = "site";

/// Role being resolved or broadcast to.
pub const ROLE: &str = "role";

/// Recipient user id (unicast only; broadcasts carry no recipient).
pub const RECIPIENT: &str = "recipient";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of roles resolved for an event.
pub const ROLE_COUNT: &str = "role_count";

/// Number of recipients resolved by the directory.
pub const RECIPIENT_COUNT: &str = "recipient_count";

/// Number of notification rows written for an event.
pub const NOTIFICATION_COUNT: &str = "notification_count";

/// Number of broadcast publishes emitted for an event.
pub const PUBLISH_COUNT: &str = "publish_count";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
