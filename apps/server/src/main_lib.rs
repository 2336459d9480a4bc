use std::sync::Arc;

use crate::config::Config;
use finverse_market_data::QuoteGateway;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub quote_gateway: Arc<QuoteGateway>,
    /// Whether POST /api/stocks-cache/clear really clears the cache.
    pub cache_clear_enabled: bool,
}

pub fn init_tracing() {
    let log_format = std::env::var("FV_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub fn build_state(config: &Config) -> Arc<AppState> {
    tracing::debug!("Provider credentials: {:?}", config.credentials);
    let providers = config.credentials.build_providers();
    let quote_gateway = QuoteGateway::new(providers, config.gateway_config());

    match quote_gateway.active_provider() {
        Some(provider) => tracing::info!(
            "Quote provider in use: {} (ttl {:?}, upstream timeout {:?})",
            provider,
            quote_gateway.ttl(),
            config.upstream_timeout
        ),
        None => tracing::warn!("No quote provider credentials configured, serving synthetic quotes"),
    }
    if !config.enable_cache_clear {
        tracing::info!("Cache clear endpoint is disabled (set FV_ENABLE_CACHE_CLEAR=true to enable)");
    }

    Arc::new(AppState {
        quote_gateway: Arc::new(quote_gateway),
        cache_clear_enabled: config.enable_cache_clear,
    })
}
