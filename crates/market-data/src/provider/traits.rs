//! Quote provider trait definitions.
//!
//! This module defines the core `QuoteProvider` trait that every upstream
//! quote adapter implements.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::ProviderQuote;

/// Trait for upstream quote providers.
///
/// Implement this trait to add support for a new quote source. The gateway
/// orders configured providers by [`priority`](Self::priority) and always
/// calls the first one.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use finverse_market_data::{MarketDataError, ProviderQuote, QuoteProvider};
///
/// struct MyProvider {
///     api_key: String,
/// }
///
/// #[async_trait]
/// impl QuoteProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     async fn get_latest_quote(&self, symbol: &str) -> Result<ProviderQuote, MarketDataError> {
///         // call the upstream API and normalize its fields
///     }
/// }
/// ```
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "FINNHUB", "ALPHA_VANTAGE", etc.
    /// Used for logging and as the `source` of live quotes.
    fn id(&self) -> &'static str;

    /// Provider priority for ordering.
    ///
    /// Lower values = higher priority. Default is 10.
    fn priority(&self) -> u8 {
        10
    }

    /// Fetch the latest quote for an uppercase ticker symbol.
    ///
    /// # Returns
    ///
    /// The provider's price fields normalized into [`ProviderQuote`], or a
    /// `MarketDataError` on transport, status, or payload failure.
    async fn get_latest_quote(&self, symbol: &str) -> Result<ProviderQuote, MarketDataError>;
}
