//! Error types for the market data crate.
//!
//! Provider adapters report failures as [`MarketDataError`]. The quote gateway
//! never lets these escape to its callers: every variant is logged and routed
//! to the synthetic fallback.

use thiserror::Error;

/// Errors that can occur while talking to an upstream quote provider.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The provider rate limited the request (HTTP 429, quota exhausted,
    /// or an in-body throttling notice).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// A provider-specific error occurred: non-success status, API-level
    /// error body, or a payload that could not be parsed.
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The request never produced a response (DNS, connect, TLS, body read).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Identifier of the provider the error came from, when known.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::RateLimited { provider }
            | Self::Timeout { provider }
            | Self::ProviderError { provider, .. } => Some(provider),
            Self::Network(_) => None,
        }
    }

    pub(crate) fn provider_error(provider: &str, message: impl Into<String>) -> Self {
        Self::ProviderError {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}
