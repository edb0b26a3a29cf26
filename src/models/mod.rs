// src/models/mod.rs

//! Domain models for the link checker.

mod config;
mod link;

// Re-export all public types
pub use config::{CheckerConfig, Config, LoggingConfig, ServerConfig, StorageConfig};
pub use link::{LinkResult, LinkSet, LinkStatus, SetId, StatusCounts};
