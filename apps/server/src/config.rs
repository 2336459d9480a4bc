use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use finverse_market_data::{GatewayConfig, ProviderCredentials};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_QUOTE_TTL_SECS: u64 = 300;
const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub quote_ttl: Duration,
    pub upstream_timeout: Duration,
    /// When false, the cache clear endpoint acknowledges but does nothing.
    pub enable_cache_clear: bool,
    pub credentials: ProviderCredentials,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            cors_allow: vec!["*".to_string()],
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            quote_ttl: Duration::from_secs(DEFAULT_QUOTE_TTL_SECS),
            upstream_timeout: Duration::from_millis(DEFAULT_UPSTREAM_TIMEOUT_MS),
            enable_cache_clear: false,
            credentials: ProviderCredentials::default(),
        }
    }
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr: SocketAddr = lookup("FV_LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
            .parse()
            .context("Invalid FV_LISTEN_ADDR")?;
        let cors_allow = lookup("FV_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let parse_u64 = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };
        let enable_cache_clear = lookup("FV_ENABLE_CACHE_CLEAR")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);
        let credentials = ProviderCredentials::new(
            lookup("FINNHUB_API_KEY"),
            lookup("ALPHAVANTAGE_API_KEY"),
            lookup("POLYGON_API_KEY"),
        );

        Ok(Self {
            listen_addr,
            cors_allow,
            request_timeout: Duration::from_millis(parse_u64(
                "FV_REQUEST_TIMEOUT_MS",
                DEFAULT_REQUEST_TIMEOUT_MS,
            )),
            quote_ttl: Duration::from_secs(parse_u64("FV_QUOTE_TTL_SECS", DEFAULT_QUOTE_TTL_SECS)),
            upstream_timeout: Duration::from_millis(parse_u64(
                "FV_UPSTREAM_TIMEOUT_MS",
                DEFAULT_UPSTREAM_TIMEOUT_MS,
            )),
            enable_cache_clear,
            credentials,
        })
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            ttl: self.quote_ttl,
            upstream_timeout: self.upstream_timeout,
        }
    }
}
