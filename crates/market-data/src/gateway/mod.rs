//! Cache-first quote resolution.

mod cache;
mod clock;
mod quote_gateway;

pub use cache::{CacheStats, QuoteCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use quote_gateway::QuoteGateway;
