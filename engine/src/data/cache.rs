//! TTL candle cache with stale fallback on rate limiting

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::data::Candle;
use crate::error::{EngineError, Result};
use crate::exchange::MarketDataProvider;

/// Cache key: one entry per (symbol, timeframe, count)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandleKey {
    pub symbol: String,
    pub timeframe: String,
    pub count: usize,
}

impl CandleKey {
    pub fn new(symbol: &str, timeframe: &str, count: usize) -> Self {
        Self {
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
            count,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedCandles {
    candles: Arc<Vec<Candle>>,
    fetched_at: Instant,
}

/// Process-wide candle cache.
///
/// Entries are never evicted on expiry; an expired entry is still served when
/// the upstream is rate limited or times out.
#[derive(Debug)]
pub struct CandleCache {
    entries: DashMap<CandleKey, CachedCandles>,
    ttl: Duration,
}

impl CandleCache {
    /// Create new cache with the given freshness window
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Entry younger than the TTL
    pub fn get_fresh(&self, key: &CandleKey) -> Option<Arc<Vec<Candle>>> {
        self.entries
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.candles.clone())
    }

    /// Entry of any age
    pub fn get_stale(&self, key: &CandleKey) -> Option<Arc<Vec<Candle>>> {
        self.entries.get(key).map(|entry| entry.candles.clone())
    }

    pub fn insert(&self, key: CandleKey, candles: Vec<Candle>) -> Arc<Vec<Candle>> {
        let candles = Arc::new(candles);
        self.entries.insert(
            key,
            CachedCandles {
                candles: candles.clone(),
                fetched_at: Instant::now(),
            },
        );
        candles
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fetch candles through the cache.
    ///
    /// Fresh entries short-circuit the provider. On `RateLimited` or `Timeout`
    /// a stale entry is returned if one exists; otherwise the error propagates
    /// and the caller abstains for this symbol.
    pub async fn fetch(
        &self,
        provider: &dyn MarketDataProvider,
        account: &str,
        symbol: &str,
        timeframe: &str,
        count: usize,
        timeout: Duration,
    ) -> Result<Arc<Vec<Candle>>> {
        let key = CandleKey::new(symbol, timeframe, count);
        if let Some(candles) = self.get_fresh(&key) {
            debug!(symbol, timeframe, "candle cache hit");
            return Ok(candles);
        }

        let fetched = match tokio::time::timeout(
            timeout,
            provider.get_candles(account, symbol, timeframe, count),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout(format!("get_candles {symbol} {timeframe}"))),
        };

        match fetched {
            Ok(candles) if candles.is_empty() => Err(EngineError::DataUnavailable(format!(
                "no candles for {symbol} {timeframe}"
            ))),
            Ok(candles) => Ok(self.insert(key, candles)),
            Err(err @ (EngineError::RateLimited(_) | EngineError::Timeout(_))) => {
                match self.get_stale(&key) {
                    Some(candles) => {
                        warn!(symbol, timeframe, error = %err, "serving stale candles");
                        Ok(candles)
                    }
                    None => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MarketDataProvider for CountingProvider {
        async fn get_candles(
            &self,
            _account: &str,
            _symbol: &str,
            _timeframe: &str,
            count: usize,
        ) -> Result<Vec<Candle>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let t = Utc.with_ymd_and_hms(2025, 3, 3, 0, 0, 0).unwrap();
            Ok(vec![Candle::new(t, 1.0, 1.1, 0.9, 1.05); count])
        }
    }

    #[tokio::test]
    async fn test_fresh_entry_skips_provider() {
        let cache = CandleCache::new(Duration::from_secs(60));
        let provider = CountingProvider {
            calls: AtomicUsize::new(0),
        };
        let timeout = Duration::from_secs(1);

        let first = cache.fetch(&provider, "acc", "EURUSD", "M15", 5, timeout).await.unwrap();
        let second = cache.fetch(&provider, "acc", "EURUSD", "M15", 5, timeout).await.unwrap();

        assert_eq!(first.len(), 5);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_count_is_a_different_key() {
        let cache = CandleCache::new(Duration::from_secs(60));
        let provider = CountingProvider {
            calls: AtomicUsize::new(0),
        };
        let timeout = Duration::from_secs(1);

        cache.fetch(&provider, "acc", "EURUSD", "M15", 5, timeout).await.unwrap();
        cache.fetch(&provider, "acc", "EURUSD", "M15", 6, timeout).await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }
}
