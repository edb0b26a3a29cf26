//! Utility functions and helpers.

pub mod http;
pub mod url;

pub use self::url::{normalize_url, probe_url};
