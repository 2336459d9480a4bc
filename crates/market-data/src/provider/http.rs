//! Shared HTTP plumbing for the provider adapters.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};

use crate::errors::MarketDataError;

/// Client-level timeout. The gateway applies its own, usually shorter,
/// per-call timeout on top of this.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn build_client() -> Client {
    Client::builder()
        .timeout(CLIENT_TIMEOUT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Send a request and return the body of a successful response.
///
/// Status handling:
/// - 429 and 403 (quota exceeded) map to `RateLimited`
/// - 401 maps to `ProviderError` with an invalid-key message
/// - any other non-success status maps to `ProviderError` carrying the body
/// - transport failures map to `Network`, client timeouts to `Timeout`
pub(crate) async fn send_for_text(
    request: RequestBuilder,
    provider: &'static str,
) -> Result<String, MarketDataError> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            MarketDataError::Timeout {
                provider: provider.to_string(),
            }
        } else {
            MarketDataError::Network(e)
        }
    })?;

    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::FORBIDDEN {
        return Err(MarketDataError::RateLimited {
            provider: provider.to_string(),
        });
    }

    if status == StatusCode::UNAUTHORIZED {
        return Err(MarketDataError::provider_error(
            provider,
            "Invalid or missing API key",
        ));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(MarketDataError::provider_error(
            provider,
            format!("HTTP {} - {}", status, body),
        ));
    }

    Ok(response.text().await?)
}
