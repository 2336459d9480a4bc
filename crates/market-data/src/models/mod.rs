//! Market data models
//!
//! - `quote` - the normalized quote snapshot (Quote), the adapter output
//!   (ProviderQuote) and the live/synthetic marker (Provenance)

mod quote;

pub use quote::{Provenance, ProviderQuote, Quote};
