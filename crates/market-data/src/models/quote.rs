use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where a quote came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Returned by an upstream provider.
    Live,
    /// Fabricated by the fallback generator.
    Synthetic,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// Price fields as normalized by a provider adapter, before the gateway
/// stamps them with a symbol and fetch time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProviderQuote {
    /// Current price
    pub price: Decimal,
    /// Absolute change since the previous reference price
    pub change: Decimal,
    /// Change as a percentage of the reference price
    pub change_percent: Decimal,
}

/// Price/change snapshot for one ticker symbol
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Uppercase ticker symbol
    pub symbol: String,

    /// Current price
    pub price: Decimal,

    /// Absolute change since the previous reference price (may be negative)
    pub change: Decimal,

    /// Change as a percentage of the reference price
    pub change_percent: Decimal,

    /// When the snapshot was obtained
    pub fetched_at: DateTime<Utc>,

    /// Producer of the quote (FINNHUB, ALPHA_VANTAGE, POLYGON, SYNTHETIC)
    pub source: String,

    /// Live or synthetic
    pub provenance: Provenance,
}

impl Quote {
    /// Build a live quote from an adapter's normalized fields.
    pub fn live(
        symbol: &str,
        fields: ProviderQuote,
        source: &str,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: fields.price,
            change: fields.change,
            change_percent: fields.change_percent,
            fetched_at,
            source: source.to_string(),
            provenance: Provenance::Live,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.provenance == Provenance::Synthetic
    }
}
