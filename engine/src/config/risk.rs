//! Risk management configuration

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// One band of the balance -> position size table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskTier {
    /// Lowest balance the tier applies to
    pub min_balance: f64,
    pub max_lot: f64,
    /// Percentage of balance risked per trade (2.0 = 2%)
    pub risk_percent: f64,
}

impl RiskTier {
    const fn new(min_balance: f64, max_lot: f64, risk_percent: f64) -> Self {
        Self { min_balance, max_lot, risk_percent }
    }
}

/// Default tier table, ascending by balance
pub const DEFAULT_RISK_TIERS: [RiskTier; 8] = [
    RiskTier::new(0.0, 0.01, 1.0),
    RiskTier::new(100.0, 0.02, 1.5),
    RiskTier::new(200.0, 0.05, 2.0),
    RiskTier::new(500.0, 0.10, 2.0),
    RiskTier::new(1_000.0, 0.25, 2.0),
    RiskTier::new(2_500.0, 0.50, 2.0),
    RiskTier::new(5_000.0, 1.00, 2.0),
    RiskTier::new(10_000.0, 2.00, 2.0),
];

/// Risk management configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Maximum daily loss as a fraction of day-start balance (0.05 = 5%)
    pub max_daily_loss: f64,
    /// IANA name of the timezone whose calendar day resets the daily loss
    pub trading_day_tz: String,
    pub tiers: Vec<RiskTier>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_daily_loss: 0.05,
            trading_day_tz: "UTC".to_string(),
            tiers: DEFAULT_RISK_TIERS.to_vec(),
        }
    }
}

impl RiskConfig {
    /// Sort the tiers and check the limits make sense
    pub fn validate(mut self) -> Result<Self> {
        if !(self.max_daily_loss > 0.0 && self.max_daily_loss <= 1.0) {
            return Err(EngineError::ConfigurationInvalid(format!(
                "daily loss fraction {} outside (0, 1]",
                self.max_daily_loss
            )));
        }
        self.timezone()?;
        if self.tiers.is_empty() {
            return Err(EngineError::ConfigurationInvalid("risk tier table is empty".to_string()));
        }
        if self.tiers.iter().any(|t| t.max_lot <= 0.0 || t.risk_percent <= 0.0) {
            return Err(EngineError::ConfigurationInvalid(
                "risk tiers need a positive max lot and risk percent".to_string(),
            ));
        }
        self.tiers.sort_by(|a, b| a.min_balance.total_cmp(&b.min_balance));
        Ok(self)
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.trading_day_tz.parse::<Tz>().map_err(|_| {
            EngineError::ConfigurationInvalid(format!("unknown timezone {}", self.trading_day_tz))
        })
    }

    /// Highest tier whose floor the balance reaches; the lowest tier below that
    pub fn tier_for(&self, balance: f64) -> RiskTier {
        self.tiers
            .iter()
            .rev()
            .find(|t| balance >= t.min_balance)
            .or_else(|| self.tiers.first())
            .copied()
            .unwrap_or(DEFAULT_RISK_TIERS[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_lookup() {
        let config = RiskConfig::default();
        assert_eq!(config.tier_for(50.0).max_lot, 0.01);
        assert_eq!(config.tier_for(150.0).max_lot, 0.02);
        assert_eq!(config.tier_for(1_000.0).max_lot, 0.25);
        assert_eq!(config.tier_for(250_000.0).max_lot, 2.0);
        assert_eq!(config.tier_for(-10.0).max_lot, 0.01);
    }

    #[test]
    fn test_validate_sorts_and_rejects() {
        let mut config = RiskConfig::default();
        config.tiers.reverse();
        let config = config.validate().unwrap();
        assert_eq!(config.tiers[0].min_balance, 0.0);

        let bad = RiskConfig { trading_day_tz: "Mars/Olympus".into(), ..Default::default() };
        assert!(bad.validate().is_err());

        let bad = RiskConfig { max_daily_loss: 0.0, ..Default::default() };
        assert!(bad.validate().is_err());
    }
}
