//! Alpha Vantage quote provider implementation.
//!
//! Uses the GLOBAL_QUOTE endpoint. Every numeric field arrives as a string
//! and the change percent carries a trailing `%`.
//!
//! Note: Alpha Vantage free tier is limited to 5 API calls per minute, and
//! throttling is reported inside a 200 response rather than with a 429.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

use super::http::{build_client, send_for_text};
use crate::errors::MarketDataError;
use crate::models::ProviderQuote;
use crate::provider::QuoteProvider;

const BASE_URL: &str = "https://www.alphavantage.co/query";
pub const PROVIDER_ID: &str = "ALPHA_VANTAGE";

/// Alpha Vantage quote provider.
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

// ============================================================================
// Response structures for Alpha Vantage API
// ============================================================================

/// GLOBAL_QUOTE response
#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "09. change")]
    change: Option<String>,
    #[serde(rename = "10. change percent")]
    change_percent: Option<String>,
}

impl AlphaVantageProvider {
    /// Create a new Alpha Vantage provider.
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, BASE_URL)
    }

    /// Create a provider that talks to a different endpoint (used by tests).
    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            client: build_client(),
            api_key,
            base_url: base_url.to_string(),
        }
    }

    /// Check for API-level errors in the response.
    fn check_api_error(
        error_message: &Option<String>,
        note: &Option<String>,
        information: &Option<String>,
    ) -> Result<(), MarketDataError> {
        if let Some(ref msg) = error_message {
            return Err(MarketDataError::provider_error(PROVIDER_ID, msg.clone()));
        }

        // "Note" and "Information" usually indicate rate limiting or a bad key
        match note.as_ref().or(information.as_ref()) {
            Some(msg) if msg.contains("API call frequency") || msg.contains("rate limit") => {
                Err(MarketDataError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                })
            }
            Some(msg) => Err(MarketDataError::provider_error(PROVIDER_ID, msg.clone())),
            None => Ok(()),
        }
    }

    /// Parse a decimal value from a string, tolerating a trailing `%`.
    fn parse_decimal(s: &str) -> Option<Decimal> {
        Decimal::from_str(s.trim().trim_end_matches('%').trim()).ok()
    }

    fn parse_quote_response(text: &str) -> Result<ProviderQuote, MarketDataError> {
        let response: GlobalQuoteResponse = serde_json::from_str(text).map_err(|e| {
            MarketDataError::provider_error(
                PROVIDER_ID,
                format!("Failed to parse GLOBAL_QUOTE response: {}", e),
            )
        })?;

        Self::check_api_error(
            &response.error_message,
            &response.note,
            &response.information,
        )?;

        // Unknown symbols come back as an empty "Global Quote" object
        let quote = response.global_quote.unwrap_or_default();
        let field = |value: &Option<String>, name: &str| -> Decimal {
            match value.as_deref() {
                Some(raw) => Self::parse_decimal(raw).unwrap_or_else(|| {
                    warn!("Alpha Vantage returned unparsable {}: {}", name, raw);
                    Decimal::ZERO
                }),
                None => Decimal::ZERO,
            }
        };

        Ok(ProviderQuote {
            price: field(&quote.price, "price"),
            change: field(&quote.change, "change"),
            change_percent: field(&quote.change_percent, "change percent"),
        })
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        2
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<ProviderQuote, MarketDataError> {
        let params = [
            ("function", "GLOBAL_QUOTE"),
            ("symbol", symbol),
            ("apikey", self.api_key.as_str()),
        ];

        let url = reqwest::Url::parse_with_params(&self.base_url, &params).map_err(|e| {
            MarketDataError::provider_error(PROVIDER_ID, format!("Failed to build URL: {}", e))
        })?;

        debug!(
            "Alpha Vantage request: {}",
            url.as_str().replace(&self.api_key, "***")
        );

        let text = send_for_text(self.client.get(url), PROVIDER_ID).await?;
        Self::parse_quote_response(&text)
    }
}
