//! # pylon-core
//!
//! Core types, traits, and abstractions for the pylon notification
//! fan-out service.
//!
//! This crate provides the foundational data structures, the error type,
//! the push-channel abstraction, and the trait seams that other pylon
//! crates depend on.

pub mod channel;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use channel::{
    topic_destination, user_destination, DeliveryChannel, PushBus, PushFrame, PushMessage,
};
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
pub use uuid_utils::{extract_millis, is_v7, new_v7};
