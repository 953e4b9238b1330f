// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::ExtractorConfig;

/// Create a configured asynchronous HTTP client.
///
/// The connect timeout follows `socket_timeout_secs`; the overall transfer is
/// bounded by the retrieval timeout instead, so large files are not cut off.
pub fn create_async_client(config: &ExtractorConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .connect_timeout(Duration::from_secs(config.socket_timeout_secs.max(1)))
        .read_timeout(Duration::from_secs(config.socket_timeout_secs.max(1)))
        .build()?;
    Ok(client)
}
