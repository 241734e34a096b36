//! Shared HTTP client construction and response helpers

use crate::error::{Result, StudioError};
use reqwest::{Client, RequestBuilder};
use std::time::Duration;

const USER_AGENT: &str = concat!("backdrop-studio/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client shared by the removal service, providers and loaders
///
/// # Errors
/// - TLS backend initialization failures
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| StudioError::invalid_config(format!("Failed to create HTTP client: {}", e)))
}

/// Send a provider request and return its body
///
/// Transport errors carry no status, so they never qualify for provider
/// fallback. Non-success statuses are reported verbatim.
pub(crate) async fn send_for_body(provider: &str, request: RequestBuilder) -> Result<Vec<u8>> {
    let response = request
        .send()
        .await
        .map_err(|e| StudioError::source_fetch(provider, format!("request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        log::debug!("{} answered with HTTP {}", provider, status.as_u16());
        return Err(StudioError::source_status(provider, status.as_u16()));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| StudioError::source_fetch(provider, format!("failed to read body: {}", e)))?;

    Ok(body.to_vec())
}
