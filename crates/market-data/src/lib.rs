//! Finverse Market Data Crate
//!
//! Resolves ticker symbols to current quotes for the Finverse gateway.
//!
//! # Overview
//!
//! - A short-lived in-memory cache absorbs repeat lookups
//! - One upstream provider is chosen by priority (Finnhub, Alpha Vantage, Polygon)
//! - Any upstream failure degrades to a synthetic quote instead of an error
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |   QuoteGateway   |  get_quote / get_quotes
//! +------------------+
//!          |
//!          v
//! +------------------+     hit
//! |    QuoteCache    | ----------> Quote
//! +------------------+
//!          | miss
//!          v
//! +------------------+     error / timeout     +-------------------------+
//! |  QuoteProvider   | ----------------------> | SyntheticQuoteGenerator |
//! +------------------+                         +-------------------------+
//!          |                                              |
//!          v                                              v
//!    Quote (live)                                  Quote (synthetic)
//! ```
//!
//! # Core Types
//!
//! - [`QuoteGateway`] - Cache, provider selection and fallback
//! - [`Quote`] - Normalized quote with provenance
//! - [`QuoteProvider`] - Upstream adapter trait
//! - [`ProviderCredentials`] - Startup credentials deciding which adapters exist

pub mod config;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod provider;

pub use config::{GatewayConfig, ProviderCredentials, DEFAULT_QUOTE_TTL, DEFAULT_UPSTREAM_TIMEOUT};
pub use errors::MarketDataError;
pub use gateway::{CacheStats, Clock, ManualClock, QuoteCache, QuoteGateway, SystemClock};
pub use models::{Provenance, ProviderQuote, Quote};

// Re-export provider types
pub use provider::alpha_vantage::AlphaVantageProvider;
pub use provider::finnhub::FinnhubProvider;
pub use provider::polygon::PolygonProvider;
pub use provider::{QuoteProvider, SyntheticQuoteGenerator, SYNTHETIC_SOURCE};
