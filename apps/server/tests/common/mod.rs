#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
    Router,
};
use finverse_market_data::{GatewayConfig, MarketDataError, ProviderQuote, QuoteGateway, QuoteProvider};
use finverse_server::{api::app_router, config::Config, AppState};
use rust_decimal_macros::dec;

/// Provider returning a fixed quote (or an error) and counting calls.
pub struct CountingProvider {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl CountingProvider {
    pub fn healthy() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteProvider for CountingProvider {
    fn id(&self) -> &'static str {
        "TEST"
    }

    async fn get_latest_quote(&self, _symbol: &str) -> Result<ProviderQuote, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(MarketDataError::ProviderError {
                provider: "TEST".to_string(),
                message: "upstream down".to_string(),
            });
        }
        Ok(ProviderQuote {
            price: dec!(123.45),
            change: dec!(-1.2),
            change_percent: dec!(-0.9),
        })
    }
}

pub fn test_app(providers: Vec<Arc<dyn QuoteProvider>>, cache_clear_enabled: bool) -> (Router, Arc<AppState>) {
    let config = Config::default();
    let state = Arc::new(AppState {
        quote_gateway: Arc::new(QuoteGateway::new(providers, GatewayConfig::default())),
        cache_clear_enabled,
    });
    (app_router(state.clone(), &config), state)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
