//! Scheduler timing and throughput limits

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub trading_interval_secs: u64,
    pub stream_interval_secs: u64,
    pub candle_timeframe: String,
    pub candle_count: usize,
    pub candle_cache_ttl_secs: u64,
    /// Bound on every broker and market data call
    pub broker_timeout_secs: u64,
    /// 0 = one worker per distinct broker connection
    pub max_concurrent_accounts: usize,
    pub order_rate_per_sec: f64,
    pub order_burst: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            trading_interval_secs: 60,
            stream_interval_secs: 5,
            candle_timeframe: "M15".to_string(),
            candle_count: 250,
            candle_cache_ttl_secs: 60,
            broker_timeout_secs: 15,
            max_concurrent_accounts: 0,
            order_rate_per_sec: 2.0,
            order_burst: 4,
        }
    }
}

impl SchedulerConfig {
    pub fn trading_interval(&self) -> Duration {
        Duration::from_secs(self.trading_interval_secs.max(1))
    }

    pub fn stream_interval(&self) -> Duration {
        Duration::from_secs(self.stream_interval_secs.max(1))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.candle_cache_ttl_secs)
    }

    pub fn broker_timeout(&self) -> Duration {
        Duration::from_secs(self.broker_timeout_secs.max(1))
    }
}
