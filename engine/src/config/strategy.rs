//! Signal aggregation configuration

use serde::{Deserialize, Serialize};

/// Confluence count -> lot multiplier step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LotTier {
    pub min_agreeing: usize,
    pub multiplier: f64,
}

/// Aggregator tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Lot multiplier steps; the highest matching `min_agreeing` wins
    pub lot_tiers: Vec<LotTier>,
    /// Multiplier when no tier matches
    pub base_lot_multiplier: f64,
    pub engulfing_boost: f64,
    pub pin_bar_boost: f64,
    /// Trend and momentum both agree with the proposal
    pub structure_boost: f64,
    /// Added per agreeing strategy beyond the policy minimum
    pub extra_agreement_boost: f64,
    /// Fallback stop distance in ATR when the winner's levels are unusable
    pub fallback_sl_atr: f64,
    pub fallback_tp_atr: f64,
    pub atr_period: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            lot_tiers: vec![
                LotTier { min_agreeing: 6, multiplier: 1.5 },
                LotTier { min_agreeing: 5, multiplier: 1.3 },
                LotTier { min_agreeing: 4, multiplier: 1.15 },
            ],
            base_lot_multiplier: 1.0,
            engulfing_boost: 10.0,
            pin_bar_boost: 8.0,
            structure_boost: 7.0,
            extra_agreement_boost: 5.0,
            fallback_sl_atr: 1.5,
            fallback_tp_atr: 3.0,
            atr_period: 14,
        }
    }
}

impl AggregatorConfig {
    pub fn lot_multiplier(&self, agreeing: usize) -> f64 {
        self.lot_tiers
            .iter()
            .filter(|t| agreeing >= t.min_agreeing)
            .max_by_key(|t| t.min_agreeing)
            .map(|t| t.multiplier)
            .unwrap_or(self.base_lot_multiplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lot_multiplier_steps() {
        let config = AggregatorConfig::default();
        assert_eq!(config.lot_multiplier(2), 1.0);
        assert_eq!(config.lot_multiplier(4), 1.15);
        assert_eq!(config.lot_multiplier(5), 1.3);
        assert_eq!(config.lot_multiplier(6), 1.5);
        assert_eq!(config.lot_multiplier(8), 1.5);
    }
}
