//! Quote provider abstractions and implementations.
//!
//! This module contains:
//! - The `QuoteProvider` trait that all upstream adapters implement
//! - Concrete adapters (Finnhub, Alpha Vantage, Polygon)
//! - The synthetic fallback generator used when no adapter can answer
//!
//! # Normalization
//!
//! Each upstream names its price fields differently. Adapters translate
//! their payload into a [`ProviderQuote`](crate::models::ProviderQuote) and
//! default any missing field to zero; the gateway adds symbol, timestamp
//! and provenance.

mod http;
mod synthetic;
mod traits;

pub mod alpha_vantage;
pub mod finnhub;
pub mod polygon;

// Re-exports
pub use synthetic::{SyntheticQuoteGenerator, SYNTHETIC_SOURCE};
pub use traits::QuoteProvider;
