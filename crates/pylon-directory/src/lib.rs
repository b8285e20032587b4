//! # pylon-directory
//!
//! HTTP client for the external user directory. Resolves roles and sites
//! to the user ids the fan-out pipeline notifies, authenticating with an
//! OAuth2 client-credentials exchange per lookup batch.
//!
//! Lookups are best-effort by contract: any auth or transport failure is
//! logged and resolves to an empty recipient list.

pub mod client;
pub mod config;
pub mod token;

pub use client::HttpRecipientDirectory;
pub use config::DirectoryConfig;
pub use token::fetch_access_token;
