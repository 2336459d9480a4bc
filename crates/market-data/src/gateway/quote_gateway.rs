//! Quote gateway orchestrating cache, provider selection and fallback.
//!
//! Resolution order for a symbol:
//! 1. Fresh cache entry → returned without any upstream call
//! 2. Pending upstream call for the same symbol → awaited and shared
//! 3. Otherwise the highest-priority provider is called once, bounded by
//!    the upstream timeout. Any failure produces a synthetic quote; there is
//!    no retry and no cascade to the next provider.
//!
//! Whatever comes back, live or synthetic, is cached before it is returned.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use super::cache::{CacheStats, QuoteCache};
use super::clock::{Clock, SystemClock};
use crate::config::GatewayConfig;
use crate::errors::MarketDataError;
use crate::models::{Provenance, Quote};
use crate::provider::{QuoteProvider, SyntheticQuoteGenerator};

type PendingQuote = Shared<BoxFuture<'static, Quote>>;
type InFlight = Arc<Mutex<HashMap<String, PendingQuote>>>;

/// Resolves ticker symbols to quotes. Never fails.
pub struct QuoteGateway {
    /// Configured providers, best priority first.
    providers: Vec<Arc<dyn QuoteProvider>>,
    cache: Arc<QuoteCache>,
    clock: Arc<dyn Clock>,
    synthetic: SyntheticQuoteGenerator,
    upstream_timeout: Duration,
    /// symbol -> upstream call shared by concurrent misses
    in_flight: InFlight,
}

impl QuoteGateway {
    /// Create a gateway using the system clock.
    pub fn new(providers: Vec<Arc<dyn QuoteProvider>>, config: GatewayConfig) -> Self {
        Self::with_clock(providers, config, Arc::new(SystemClock))
    }

    /// Create a gateway with an injected clock.
    pub fn with_clock(
        mut providers: Vec<Arc<dyn QuoteProvider>>,
        config: GatewayConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        providers.sort_by_key(|p| p.priority());

        Self {
            providers,
            cache: Arc::new(QuoteCache::new(config.ttl)),
            clock,
            synthetic: SyntheticQuoteGenerator::new(),
            upstream_timeout: config.upstream_timeout,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The provider every cache miss goes to, if any is configured.
    pub fn active_provider(&self) -> Option<&'static str> {
        self.providers.first().map(|p| p.id())
    }

    pub fn ttl(&self) -> Duration {
        self.cache.ttl()
    }

    /// Resolve one uppercase symbol to a quote.
    pub async fn get_quote(&self, symbol: &str) -> Quote {
        if let Some(quote) = self.cache.get_fresh(symbol, self.clock.now()) {
            debug!("Quote cache hit for {}", symbol);
            return quote;
        }

        let pending = {
            let mut in_flight = lock_in_flight(&self.in_flight);

            // The previous call may have landed between the first lookup and the lock
            if let Some(quote) = self.cache.get_fresh(symbol, self.clock.now()) {
                return quote;
            }

            in_flight
                .entry(symbol.to_string())
                .or_insert_with(|| self.start_fetch(symbol))
                .clone()
        };

        pending.await
    }

    /// Resolve several symbols concurrently. Output order matches input order.
    pub async fn get_quotes<S: AsRef<str>>(&self, symbols: &[S]) -> Vec<Quote> {
        join_all(symbols.iter().map(|s| self.get_quote(s.as_ref()))).await
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop every cached quote. Calls already in flight still land afterwards.
    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("Stock price cache cleared");
    }

    /// Spawn the upstream call on its own task. The task caches its result
    /// and clears its in-flight entry even if every caller goes away.
    fn start_fetch(&self, symbol: &str) -> PendingQuote {
        let symbol = symbol.to_string();
        let provider = self.providers.first().cloned();
        let cache = Arc::clone(&self.cache);
        let clock = Arc::clone(&self.clock);
        let in_flight = Arc::clone(&self.in_flight);
        let synthetic = self.synthetic.clone();
        let timeout = self.upstream_timeout;

        let task = {
            let symbol = symbol.clone();
            let clock = Arc::clone(&clock);
            let in_flight = Arc::clone(&in_flight);
            let synthetic = synthetic.clone();
            tokio::spawn(async move {
                let quote = match provider {
                    Some(provider) => {
                        fetch_or_synthesize(
                            provider.as_ref(),
                            &symbol,
                            timeout,
                            clock.as_ref(),
                            &synthetic,
                        )
                        .await
                    }
                    None => {
                        debug!(
                            "No quote provider configured, using synthetic quote for {}",
                            symbol
                        );
                        synthetic.generate(&symbol, clock.now())
                    }
                };

                cache.insert(quote.clone(), clock.now());
                lock_in_flight(&in_flight).remove(&symbol);
                quote
            })
        };

        async move {
            match task.await {
                Ok(quote) => quote,
                Err(e) => {
                    warn!("Quote fetch task for {} failed: {}", symbol, e);
                    lock_in_flight(&in_flight).remove(&symbol);
                    synthetic.generate(&symbol, clock.now())
                }
            }
        }
        .boxed()
        .shared()
    }
}

async fn fetch_or_synthesize(
    provider: &dyn QuoteProvider,
    symbol: &str,
    timeout: Duration,
    clock: &dyn Clock,
    synthetic: &SyntheticQuoteGenerator,
) -> Quote {
    let result = match tokio::time::timeout(timeout, provider.get_latest_quote(symbol)).await {
        Ok(result) => result,
        Err(_) => Err(MarketDataError::Timeout {
            provider: provider.id().to_string(),
        }),
    };

    match result {
        Ok(fields) => {
            debug!(
                symbol,
                provider = provider.id(),
                provenance = %Provenance::Live,
                "Fetched quote"
            );
            Quote::live(symbol, fields, provider.id(), clock.now())
        }
        Err(e) => {
            warn!(
                symbol,
                provider = provider.id(),
                provenance = %Provenance::Synthetic,
                "Quote fetch failed, serving synthetic quote: {}",
                e
            );
            synthetic.generate(symbol, clock.now())
        }
    }
}

fn lock_in_flight(in_flight: &InFlight) -> MutexGuard<'_, HashMap<String, PendingQuote>> {
    in_flight.lock().unwrap_or_else(|poisoned| {
        warn!("In-flight quote map mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ManualClock;
    use crate::models::ProviderQuote;
    use crate::provider::SYNTHETIC_SOURCE;
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behavior {
        Succeed,
        Fail,
        Hang,
    }

    struct MockProvider {
        id: &'static str,
        priority: u8,
        call_count: AtomicUsize,
        behavior: Behavior,
        delay: Duration,
    }

    impl MockProvider {
        fn new(id: &'static str, priority: u8, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                id,
                priority,
                call_count: AtomicUsize::new(0),
                behavior,
                delay: Duration::ZERO,
            })
        }

        fn with_delay(id: &'static str, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                id,
                priority: 1,
                call_count: AtomicUsize::new(0),
                behavior: Behavior::Succeed,
                delay,
            })
        }

        fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QuoteProvider for MockProvider {
        fn id(&self) -> &'static str {
            self.id
        }

        fn priority(&self) -> u8 {
            self.priority
        }

        async fn get_latest_quote(&self, _symbol: &str) -> Result<ProviderQuote, MarketDataError> {
            let call = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match self.behavior {
                Behavior::Succeed => Ok(ProviderQuote {
                    // Distinct price per call so refetches are observable
                    price: dec!(100) + rust_decimal::Decimal::from(call),
                    change: dec!(-1.2),
                    change_percent: dec!(-0.9),
                }),
                Behavior::Fail => Err(MarketDataError::ProviderError {
                    provider: self.id.to_string(),
                    message: "Mock failure".to_string(),
                }),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(ProviderQuote::default())
                }
            }
        }
    }

    fn gateway_with(providers: Vec<Arc<dyn QuoteProvider>>) -> (QuoteGateway, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let gateway = QuoteGateway::with_clock(providers, GatewayConfig::default(), clock.clone());
        (gateway, clock)
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let provider = MockProvider::new("MOCK", 1, Behavior::Succeed);
        let (gateway, _clock) = gateway_with(vec![provider.clone() as Arc<dyn QuoteProvider>]);
        assert_eq!(gateway.ttl(), Duration::from_secs(300));

        let first = gateway.get_quote("AAPL").await;
        let second = gateway.get_quote("AAPL").await;

        assert_eq!(provider.calls(), 1);
        assert_eq!(first, second);
        assert_eq!(first.source, "MOCK");
        assert_eq!(first.provenance, Provenance::Live);
        assert_eq!(first.change, dec!(-1.2));
        assert_eq!(first.change_percent, dec!(-0.9));
    }

    #[tokio::test]
    async fn test_cache_expiry_triggers_refetch() {
        let provider = MockProvider::new("MOCK", 1, Behavior::Succeed);
        let (gateway, clock) = gateway_with(vec![provider.clone() as Arc<dyn QuoteProvider>]);

        let first = gateway.get_quote("AAPL").await;
        clock.advance(chrono::Duration::minutes(4));
        gateway.get_quote("AAPL").await;
        assert_eq!(provider.calls(), 1);

        clock.advance(chrono::Duration::minutes(1));
        let refreshed = gateway.get_quote("AAPL").await;
        assert_eq!(provider.calls(), 2);
        assert_ne!(first.price, refreshed.price);
        assert_eq!(gateway.cache_stats().size, 1);
    }

    #[tokio::test]
    async fn test_always_returns_without_providers() {
        let (gateway, _clock) = gateway_with(Vec::new());
        assert!(gateway.active_provider().is_none());

        for symbol in ["AAPL", "ZZZZ", "X"] {
            let quote = gateway.get_quote(symbol).await;
            assert_eq!(quote.symbol, symbol);
            assert!(quote.price >= dec!(0));
            assert_eq!(quote.provenance, Provenance::Synthetic);
            assert_eq!(quote.source, SYNTHETIC_SOURCE);
        }
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let provider = MockProvider::new("MOCK", 1, Behavior::Succeed);
        let (gateway, _clock) = gateway_with(vec![provider.clone() as Arc<dyn QuoteProvider>]);

        let quotes = gateway.get_quotes(&["AAA", "BBB", "CCC"]).await;
        let symbols: Vec<_> = quotes.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAA", "BBB", "CCC"]);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_selects_best_priority_provider() {
        let slow = MockProvider::new("POLYGON_LIKE", 3, Behavior::Succeed);
        let best = MockProvider::new("FINNHUB_LIKE", 1, Behavior::Succeed);
        let (gateway, _clock) = gateway_with(vec![slow.clone() as Arc<dyn QuoteProvider>, best.clone()]);

        assert_eq!(gateway.active_provider(), Some("FINNHUB_LIKE"));
        let quote = gateway.get_quote("AAPL").await;
        assert_eq!(quote.source, "FINNHUB_LIKE");
        assert_eq!(slow.calls(), 0);
    }

    #[tokio::test]
    async fn test_failure_falls_back_without_cascade() {
        let failing = MockProvider::new("FAILING", 1, Behavior::Fail);
        let healthy = MockProvider::new("HEALTHY", 2, Behavior::Succeed);
        let (gateway, _clock) = gateway_with(vec![failing.clone() as Arc<dyn QuoteProvider>, healthy.clone()]);

        let quote = gateway.get_quote("AAPL").await;
        assert!(quote.is_synthetic());
        assert_eq!(failing.calls(), 1);
        assert_eq!(healthy.calls(), 0);

        // The synthetic quote is cached like a real one
        let again = gateway.get_quote("AAPL").await;
        assert_eq!(again, quote);
        assert_eq!(failing.calls(), 1);
    }

    #[tokio::test]
    async fn test_batch_mixes_cache_hits_and_misses() {
        let provider = MockProvider::new("MOCK", 1, Behavior::Succeed);
        let (gateway, _clock) = gateway_with(vec![provider.clone() as Arc<dyn QuoteProvider>]);

        gateway.get_quote("AAA").await;
        let quotes = gateway.get_quotes(&["AAA", "BBB"]).await;
        assert!(quotes.iter().all(|q| q.provenance == Provenance::Live));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_stats_reflect_cache_contents() {
        let (gateway, _clock) = gateway_with(vec![MockProvider::new("MOCK", 1, Behavior::Succeed) as Arc<dyn QuoteProvider>]);

        gateway.get_quotes(&["BBB", "AAA"]).await;
        let stats = gateway.cache_stats();
        assert_eq!(stats.size, 2);
        let mut symbols = stats.symbols.clone();
        symbols.sort();
        assert_eq!(symbols, vec!["AAA".to_string(), "BBB".to_string()]);
    }

    #[tokio::test]
    async fn test_clear_resets_state() {
        let provider = MockProvider::new("MOCK", 1, Behavior::Succeed);
        let (gateway, _clock) = gateway_with(vec![provider.clone() as Arc<dyn QuoteProvider>]);

        gateway.get_quotes(&["AAA", "BBB"]).await;
        gateway.clear_cache();
        assert_eq!(gateway.cache_stats().size, 0);
        gateway.clear_cache();
        assert_eq!(gateway.cache_stats().size, 0);

        gateway.get_quote("AAA").await;
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_upstream_call() {
        let provider = MockProvider::with_delay("MOCK", Duration::from_millis(50));
        let (gateway, _clock) = gateway_with(vec![provider.clone() as Arc<dyn QuoteProvider>]);

        let quotes = join_all((0..10).map(|_| gateway.get_quote("AAPL"))).await;

        assert_eq!(provider.calls(), 1);
        assert!(quotes.iter().all(|q| q == &quotes[0]));
        assert!(lock_in_flight(&gateway.in_flight).is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_across_tasks() {
        let provider = MockProvider::with_delay("MOCK", Duration::from_millis(50));
        let (gateway, _clock) = gateway_with(vec![provider.clone() as Arc<dyn QuoteProvider>]);
        let gateway = Arc::new(gateway);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gateway = Arc::clone(&gateway);
                tokio::spawn(async move { gateway.get_quote("MSFT").await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_caller_does_not_abandon_fetch() {
        let provider = MockProvider::with_delay("MOCK", Duration::from_millis(100));
        let (gateway, _clock) = gateway_with(vec![provider.clone() as Arc<dyn QuoteProvider>]);

        // Drop the only caller while the upstream call is still running
        let cancelled =
            tokio::time::timeout(Duration::from_millis(10), gateway.get_quote("AAPL")).await;
        assert!(cancelled.is_err());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(lock_in_flight(&gateway.in_flight).is_empty());
        assert_eq!(gateway.cache_stats().size, 1);

        let quote = gateway.get_quote("AAPL").await;
        assert_eq!(quote.provenance, Provenance::Live);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_upstream_timeout_yields_synthetic() {
        let provider = MockProvider::new("SLOW", 1, Behavior::Hang);
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let config = GatewayConfig {
            upstream_timeout: Duration::from_millis(20),
            ..GatewayConfig::default()
        };
        let gateway = QuoteGateway::with_clock(vec![provider.clone() as Arc<dyn QuoteProvider>], config, clock);

        let quote = gateway.get_quote("AAPL").await;
        assert!(quote.is_synthetic());
        assert_eq!(provider.calls(), 1);
        assert_eq!(gateway.cache_stats().size, 1);
    }
}
