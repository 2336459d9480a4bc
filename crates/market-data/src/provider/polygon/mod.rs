//! Polygon.io quote provider implementation.
//!
//! Uses the `/v3/quotes/latest` endpoint. The endpoint has no change-percent
//! field, so normalized quotes from this provider always report a zero
//! percent change.
//!
//! Free tier is limited to 5 API calls per minute.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use super::http::{build_client, send_for_text};
use crate::errors::MarketDataError;
use crate::models::ProviderQuote;
use crate::provider::QuoteProvider;

const BASE_URL: &str = "https://api.polygon.io";
pub const PROVIDER_ID: &str = "POLYGON";

#[derive(Debug, Deserialize)]
struct LatestQuoteResponse {
    results: Option<LatestQuoteResults>,
    /// "OK", "ERROR", "NOT_AUTHORIZED", ...
    status: Option<String>,
    error: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LatestQuoteResults {
    /// Close price
    #[serde(rename = "c")]
    close_price: Option<f64>,
    /// Last quote price, reported as the change
    #[serde(rename = "l")]
    last_quote_price: Option<f64>,
}

/// Polygon.io quote provider.
pub struct PolygonProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl PolygonProvider {
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

    fn parse_quote_response(text: &str) -> Result<ProviderQuote, MarketDataError> {
        let response: LatestQuoteResponse = serde_json::from_str(text).map_err(|e| {
            MarketDataError::provider_error(
                PROVIDER_ID,
                format!("Failed to parse latest quote response: {}", e),
            )
        })?;

        let failed_status = response
            .status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("ERROR") || s.eq_ignore_ascii_case("NOT_AUTHORIZED"));
        if failed_status || response.error.is_some() {
            let message = response
                .error
                .or(response.message)
                .unwrap_or_else(|| "Request rejected".to_string());
            return Err(MarketDataError::provider_error(PROVIDER_ID, message));
        }

        let results = response.results.unwrap_or_default();
        Ok(ProviderQuote {
            price: to_decimal(results.close_price),
            change: to_decimal(results.last_quote_price),
            change_percent: Decimal::ZERO,
        })
    }
}

#[async_trait]
impl QuoteProvider for PolygonProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        3
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<ProviderQuote, MarketDataError> {
        debug!("Fetching latest quote for {} from Polygon", symbol);

        let request = self
            .client
            .get(format!("{}/v3/quotes/latest", self.base_url))
            .query(&[("ticker", symbol), ("apiKey", self.api_key.as_str())]);

        let text = send_for_text(request, PROVIDER_ID).await?;
        Self::parse_quote_response(&text)
    }
}

fn to_decimal(value: Option<f64>) -> Decimal {
    value
        .and_then(|v| Decimal::try_from(v).ok())
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::test_support::spawn_upstream;
    use axum::{extract::Query, routing::get, Json, Router};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    #[test]
    fn test_provider_id() {
        let provider = PolygonProvider::new("test_key".to_string());
        assert_eq!(provider.id(), "POLYGON");
        assert_eq!(provider.priority(), 3);
    }

    #[test]
    fn test_latest_quote_normalization() {
        let json = r#"{"status": "OK", "request_id": "abc", "results": {"c": 187.44, "l": 187.41}}"#;

        let quote = PolygonProvider::parse_quote_response(json).unwrap();
        assert_eq!(quote.price, dec!(187.44));
        assert_eq!(quote.change, dec!(187.41));
        assert_eq!(quote.change_percent, Decimal::ZERO);
    }

    #[test]
    fn test_latest_quote_missing_results() {
        let quote = PolygonProvider::parse_quote_response(r#"{"status": "OK"}"#).unwrap();
        assert_eq!(quote, ProviderQuote::default());
    }

    #[test]
    fn test_latest_quote_error_status() {
        let json = r#"{"status": "NOT_AUTHORIZED", "message": "You are not entitled to this data."}"#;
        let err = PolygonProvider::parse_quote_response(json).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Provider error: POLYGON - You are not entitled to this data."
        );
    }

    #[tokio::test]
    async fn test_get_latest_quote_passes_ticker_and_key() {
        let router = Router::new().route(
            "/v3/quotes/latest",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                if params.get("apiKey").map(String::as_str) != Some("pg-key")
                    || params.get("ticker").map(String::as_str) != Some("TSLA")
                {
                    return Json(serde_json::json!({"status": "ERROR", "error": "bad request"}));
                }
                Json(serde_json::json!({"status": "OK", "results": {"c": 250.0, "l": 1.25}}))
            }),
        );
        let base_url = spawn_upstream(router).await;

        let provider = PolygonProvider::with_base_url("pg-key".to_string(), &base_url);
        let quote = provider.get_latest_quote("TSLA").await.unwrap();
        assert_eq!(quote.price, dec!(250));
        assert_eq!(quote.change, dec!(1.25));

        let provider = PolygonProvider::with_base_url("other".to_string(), &base_url);
        assert!(provider.get_latest_quote("TSLA").await.is_err());
    }
}
