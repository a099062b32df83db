//! Configuration module

pub mod bot;
pub mod lifecycle;
pub mod risk;
pub mod scheduler;
pub mod strategy;
pub mod weights;

pub use bot::*;
pub use lifecycle::*;
pub use risk::*;
pub use scheduler::*;
pub use strategy::*;
pub use weights::*;

use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use dotenv::dotenv;
use serde::{Deserialize, Serialize};

/// Everything the engine needs besides per-robot configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub scheduler: SchedulerConfig,
    pub risk: RiskConfig,
    pub weights: StrategyWeights,
    pub aggregator: AggregatorConfig,
    pub lifecycle: LifecycleConfig,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenv().ok();

        let defaults = SchedulerConfig::default();
        let scheduler = SchedulerConfig {
            trading_interval_secs: env_or("TRADING_INTERVAL_SECS", defaults.trading_interval_secs)?,
            stream_interval_secs: env_or("STREAM_INTERVAL_SECS", defaults.stream_interval_secs)?,
            candle_timeframe: std::env::var("CANDLE_TIMEFRAME").unwrap_or(defaults.candle_timeframe),
            candle_count: env_or("CANDLE_COUNT", defaults.candle_count)?,
            candle_cache_ttl_secs: env_or("CANDLE_CACHE_TTL_SECS", defaults.candle_cache_ttl_secs)?,
            broker_timeout_secs: env_or("BROKER_TIMEOUT_SECS", defaults.broker_timeout_secs)?,
            max_concurrent_accounts: env_or("MAX_CONCURRENT_ACCOUNTS", defaults.max_concurrent_accounts)?,
            order_rate_per_sec: env_or("ORDER_RATE_PER_SEC", defaults.order_rate_per_sec)?,
            order_burst: env_or("ORDER_BURST", defaults.order_burst)?,
        };

        let mut risk = RiskConfig {
            max_daily_loss: env_or("DAILY_LOSS_LIMIT_PCT", 5.0_f64)? / 100.0,
            trading_day_tz: std::env::var("TRADING_DAY_TZ").unwrap_or_else(|_| "UTC".to_string()),
            ..Default::default()
        };
        if let Ok(path) = std::env::var("RISK_TIERS_PATH") {
            risk.tiers = read_json(&path)?;
        }
        let risk = risk.validate()?;

        let mut weights = StrategyWeights::default();
        if let Ok(path) = std::env::var("STRATEGY_WEIGHTS_PATH") {
            weights.merge(read_json(&path)?);
        }

        Ok(EngineConfig {
            scheduler,
            risk,
            weights,
            aggregator: AggregatorConfig::default(),
            lifecycle: LifecycleConfig::default(),
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T, anyhow::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw}")),
        Err(_) => Ok(default),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, anyhow::Error> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_json_tiers() {
        let path = std::env::temp_dir().join(format!("risk-tiers-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"[{"min_balance":0,"max_lot":0.01,"risk_percent":1.0},
                {"min_balance":300,"max_lot":0.03,"risk_percent":1.0}]"#,
        )
        .unwrap();
        let tiers: Vec<RiskTier> = read_json(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(tiers.len(), 2);
        assert_eq!(tiers[1].max_lot, 0.03);
        assert!(read_json::<Vec<RiskTier>>("/nonexistent/tiers.json").is_err());
    }

    #[test]
    fn test_env_or_parses_default_when_missing() {
        let value: u64 = env_or("TRADE_ENGINE_TEST_UNSET_KEY", 42).unwrap();
        assert_eq!(value, 42);
    }
}
