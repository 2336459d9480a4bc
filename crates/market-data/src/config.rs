//! Gateway configuration resolved once at startup.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::provider::alpha_vantage::AlphaVantageProvider;
use crate::provider::finnhub::FinnhubProvider;
use crate::provider::polygon::PolygonProvider;
use crate::provider::QuoteProvider;

/// How long a cached quote stays fresh.
pub const DEFAULT_QUOTE_TTL: Duration = Duration::from_secs(5 * 60);

/// Upper bound on a single upstream quote call.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Tuning knobs for [`QuoteGateway`](crate::QuoteGateway).
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub ttl: Duration,
    pub upstream_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_QUOTE_TTL,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }
}

/// Provider credentials. A provider takes part only when its key is set.
#[derive(Clone, Default)]
pub struct ProviderCredentials {
    pub finnhub: Option<String>,
    pub alpha_vantage: Option<String>,
    pub polygon: Option<String>,
}

impl ProviderCredentials {
    /// Build credentials from raw values, treating blank strings as absent.
    pub fn new(
        finnhub: Option<String>,
        alpha_vantage: Option<String>,
        polygon: Option<String>,
    ) -> Self {
        Self {
            finnhub: non_blank(finnhub),
            alpha_vantage: non_blank(alpha_vantage),
            polygon: non_blank(polygon),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.finnhub.is_none() && self.alpha_vantage.is_none() && self.polygon.is_none()
    }

    /// Construct an adapter for every configured credential.
    pub fn build_providers(&self) -> Vec<Arc<dyn QuoteProvider>> {
        let mut providers: Vec<Arc<dyn QuoteProvider>> = Vec::new();
        if let Some(key) = &self.finnhub {
            providers.push(Arc::new(FinnhubProvider::new(key.clone())));
        }
        if let Some(key) = &self.alpha_vantage {
            providers.push(Arc::new(AlphaVantageProvider::new(key.clone())));
        }
        if let Some(key) = &self.polygon {
            providers.push(Arc::new(PolygonProvider::new(key.clone())));
        }
        providers
    }
}

// Keys must never reach the logs
impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "***" } else { "<unset>" };
        f.debug_struct("ProviderCredentials")
            .field("finnhub", &mask(&self.finnhub))
            .field("alpha_vantage", &mask(&self.alpha_vantage))
            .field("polygon", &mask(&self.polygon))
            .finish()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
