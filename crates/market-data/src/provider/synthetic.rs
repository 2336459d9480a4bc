//! Fallback quote generator.
//!
//! Produces a fabricated quote when no provider is configured or the
//! selected provider fails. Values are drawn uniformly from fixed ranges:
//! price in [100, 300), change in [-5, 5).

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;

use crate::models::{Provenance, Quote};

pub const SYNTHETIC_SOURCE: &str = "SYNTHETIC";

const PRICE_MIN: f64 = 100.0;
const PRICE_MAX: f64 = 300.0;
const CHANGE_RANGE: f64 = 5.0;

#[derive(Clone, Debug, Default)]
pub struct SyntheticQuoteGenerator;

impl SyntheticQuoteGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, symbol: &str, now: DateTime<Utc>) -> Quote {
        let (price, change) = {
            let mut rng = rand::thread_rng();
            (
                rng.gen_range(PRICE_MIN..PRICE_MAX),
                rng.gen_range(-CHANGE_RANGE..CHANGE_RANGE),
            )
        };

        let price = Decimal::try_from(price)
            .unwrap_or(Decimal::ONE_HUNDRED)
            .round_dp(2);
        let change = Decimal::try_from(change).unwrap_or(Decimal::ZERO).round_dp(2);
        let change_percent = (change / price * Decimal::ONE_HUNDRED).round_dp(4);

        Quote {
            symbol: symbol.to_string(),
            price,
            change,
            change_percent,
            fetched_at: now,
            source: SYNTHETIC_SOURCE.to_string(),
            provenance: Provenance::Synthetic,
        }
    }
}
