// src/utils/http.rs

//! HTTP client utilities.

use crate::error::Result;
use crate::models::CheckerConfig;

/// Create the HTTP client shared by all probe workers.
///
/// The client timeout bounds each probe individually.
pub fn create_probe_client(config: &CheckerConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout())
        .build()?;
    Ok(client)
}
