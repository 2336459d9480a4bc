//! Finnhub quote provider implementation.
//!
//! Uses the `/quote` endpoint, which returns the current price together with
//! the day's absolute and percent change.
//!
//! Finnhub free tier is limited to 60 API calls per minute.
//! API documentation: https://finnhub.io/docs/api/quote

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use super::http::{build_client, send_for_text};
use crate::errors::MarketDataError;
use crate::models::ProviderQuote;
use crate::provider::QuoteProvider;

const BASE_URL: &str = "https://finnhub.io/api/v1";
pub const PROVIDER_ID: &str = "FINNHUB";

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from /quote endpoint
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price
    #[serde(rename = "c")]
    current_price: Option<f64>,
    /// Change
    #[serde(rename = "d")]
    delta: Option<f64>,
    /// Percent change
    #[serde(rename = "dp")]
    delta_percent: Option<f64>,
    /// Present when the request was rejected with a 200 status
    error: Option<String>,
    // Note: h, l, o, pc and t exist but are not part of the normalized quote
}

// ============================================================================
// FinnhubProvider
// ============================================================================

/// Finnhub quote provider.
pub struct FinnhubProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl FinnhubProvider {
    /// Create a new Finnhub provider with the given API key.
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, BASE_URL)
    }

    /// Create a provider that talks to a different host (used by tests).
    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            client: build_client(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl QuoteProvider for FinnhubProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        // Best free tier, preferred whenever configured
        1
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<ProviderQuote, MarketDataError> {
        debug!("Fetching latest quote for {} from Finnhub", symbol);

        // API key goes in a header rather than the query string
        let request = self
            .client
            .get(format!("{}/quote", self.base_url))
            .header("X-Finnhub-Token", &self.api_key)
            .query(&[("symbol", symbol)]);

        let text = send_for_text(request, PROVIDER_ID).await?;
        parse_quote_response(&text)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn parse_quote_response(text: &str) -> Result<ProviderQuote, MarketDataError> {
    let response: QuoteResponse = serde_json::from_str(text).map_err(|e| {
        MarketDataError::provider_error(
            PROVIDER_ID,
            format!("Failed to parse quote response: {}", e),
        )
    })?;

    if let Some(message) = response.error {
        return Err(MarketDataError::provider_error(PROVIDER_ID, message));
    }

    // Finnhub sends nulls for unknown symbols; missing fields become zero
    Ok(ProviderQuote {
        price: to_decimal(response.current_price),
        change: to_decimal(response.delta),
        change_percent: to_decimal(response.delta_percent),
    })
}

fn to_decimal(value: Option<f64>) -> Decimal {
    value
        .and_then(|v| Decimal::try_from(v).ok())
        .unwrap_or(Decimal::ZERO)
}

// ============================================================================
// Tests
// ============================================================================
