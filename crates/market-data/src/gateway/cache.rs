//! In-memory quote cache keyed by symbol.
//!
//! One entry per symbol; writes replace the previous entry wholesale. Entries
//! are never expired in the background: a stale entry stays in memory until
//! the symbol is fetched again or the cache is cleared.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::Quote;

#[derive(Clone, Debug)]
struct CacheEntry {
    quote: Quote,
    inserted_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        // A negative age (clock stepped backwards) counts as fresh
        match (now - self.inserted_at).to_std() {
            Ok(age) => age < ttl,
            Err(_) => true,
        }
    }
}

/// Snapshot of the cache contents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub size: usize,
    pub symbols: Vec<String>,
}

pub struct QuoteCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl QuoteCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Lock the entries, recovering from poison. A poisoned cache only holds
    /// whole quotes, so the data is still usable.
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Quote cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Return the cached quote for `symbol` if it is younger than the TTL.
    pub fn get_fresh(&self, symbol: &str, now: DateTime<Utc>) -> Option<Quote> {
        self.lock_entries()
            .get(symbol)
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .map(|entry| entry.quote.clone())
    }

    /// Store `quote` under its symbol, replacing any previous entry.
    pub fn insert(&self, quote: Quote, now: DateTime<Utc>) {
        let entry = CacheEntry {
            quote,
            inserted_at: now,
        };
        self.lock_entries().insert(entry.quote.symbol.clone(), entry);
    }

    pub fn clear(&self) {
        self.lock_entries().clear();
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry count and symbols (sorted), stale entries included.
    pub fn stats(&self) -> CacheStats {
        let entries = self.lock_entries();
        let mut symbols: Vec<String> = entries.keys().cloned().collect();
        symbols.sort();
        CacheStats {
            size: entries.len(),
            symbols,
        }
    }
}
