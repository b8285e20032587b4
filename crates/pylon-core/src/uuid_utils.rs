//! UUID v7 utilities for time-ordered identifiers.
//!
//! Every document id pylon generates (events, notifications, mappings) is a
//! UUIDv7: the leading 48 bits carry a millisecond Unix timestamp, so ids
//! sort chronologically and temporal queries stay index-friendly.

use uuid::Uuid;

/// Generate a new UUIDv7 identifier.
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

/// Check whether a UUID is version 7.
pub fn is_v7(id: &Uuid) -> bool {
    id.get_version_num() == 7
}

/// Extract the embedded millisecond timestamp from a UUIDv7.
///
/// Returns `None` for non-v7 UUIDs.
pub fn extract_millis(id: &Uuid) -> Option<u64> {
    if !is_v7(id) {
        return None;
    }
    let bytes = id.as_bytes();
    let mut millis: u64 = 0;
    for b in &bytes[..6] {
        millis = (millis << 8) | u64::from(*b);
    }
    Some(millis)
}
