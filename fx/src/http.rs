//! Shared HTTP plumbing for the rate sources.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::error::{FxError, FxResult};

/// Build a client with a fixed per-request timeout.
pub(crate) fn build_client(timeout: Duration) -> FxResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| FxError::Configuration(format!("failed to build HTTP client: {e}")))
}

/// GET `url` and return the body of a 2xx response.
pub(crate) async fn get_text(client: &Client, source_name: &str, url: &str) -> FxResult<String> {
    debug!(source = source_name, url, "Requesting rates");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FxError::from_reqwest(source_name, e))?
        .error_for_status()
        .map_err(|e| FxError::from_reqwest(source_name, e))?;

    response
        .text()
        .await
        .map_err(|e| FxError::from_reqwest(source_name, e))
}
