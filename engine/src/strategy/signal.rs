//! Trade proposals and aggregated signals

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::pips_to_price;
use crate::strategy::StrategyId;

/// Highest confidence any proposal or signal may carry
pub const MAX_CONFIDENCE: f64 = 95.0;

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// +1 for buy, -1 for sell
    pub fn sign(&self) -> f64 {
        match self {
            Self::Buy => 1.0,
            Self::Sell => -1.0,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clamp a confidence score into `[0, 95]`
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, MAX_CONFIDENCE)
    }
}

/// Single-strategy trade idea. Ephemeral, never persisted directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeProposal {
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// 0..=95
    pub confidence: f64,
    pub strategy: StrategyId,
    pub rationale: String,
    /// Stop distance in pips
    pub sl_pips: f64,
    /// Target distance in pips
    pub tp_pips: f64,
}

impl TradeProposal {
    /// Stop and target lie on the loss and profit side of the entry
    pub fn has_consistent_levels(&self) -> bool {
        let values = [self.entry_price, self.stop_loss, self.take_profit];
        if values.iter().any(|v| !v.is_finite()) {
            return false;
        }
        match self.direction {
            Direction::Buy => self.stop_loss < self.entry_price && self.entry_price < self.take_profit,
            Direction::Sell => self.take_profit < self.entry_price && self.entry_price < self.stop_loss,
        }
    }

    /// Replace the structure levels with fixed pip distances from the entry
    pub fn apply_fixed_pips(&mut self, sl_pips: f64, tp_pips: f64) {
        let sign = self.direction.sign();
        self.stop_loss = self.entry_price - sign * pips_to_price(&self.symbol, sl_pips);
        self.take_profit = self.entry_price + sign * pips_to_price(&self.symbol, tp_pips);
        self.sl_pips = sl_pips;
        self.tp_pips = tp_pips;
    }

    /// Reward-to-risk ratio of the levels
    pub fn reward_risk(&self) -> f64 {
        let risk = (self.entry_price - self.stop_loss).abs();
        if risk > 0.0 {
            (self.take_profit - self.entry_price).abs() / risk
        } else {
            0.0
        }
    }
}

/// Aggregator output: the winning proposal plus confluence data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSignal {
    /// Winning proposal; its confidence already includes all boosts
    pub proposal: TradeProposal,
    pub weighted_confidence: f64,
    /// Number of proposals agreeing on the direction
    pub confluence_count: usize,
    pub agreeing: Vec<StrategyId>,
    pub lot_multiplier: f64,
}

impl AggregatedSignal {
    pub fn symbol(&self) -> &str {
        &self.proposal.symbol
    }

    pub fn direction(&self) -> Direction {
        self.proposal.direction
    }

    pub fn confidence(&self) -> f64 {
        self.proposal.confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(direction: Direction, entry: f64, sl: f64, tp: f64) -> TradeProposal {
        TradeProposal {
            symbol: "EURUSD".to_string(),
            direction,
            entry_price: entry,
            stop_loss: sl,
            take_profit: tp,
            confidence: 70.0,
            strategy: StrategyId::EmaPullback,
            rationale: String::new(),
            sl_pips: 0.0,
            tp_pips: 0.0,
        }
    }

    #[test]
    fn test_level_consistency() {
        assert!(proposal(Direction::Buy, 1.1, 1.09, 1.12).has_consistent_levels());
        assert!(!proposal(Direction::Buy, 1.1, 1.11, 1.12).has_consistent_levels());
        assert!(proposal(Direction::Sell, 1.1, 1.11, 1.08).has_consistent_levels());
        assert!(!proposal(Direction::Sell, 1.1, f64::NAN, 1.08).has_consistent_levels());
    }

    #[test]
    fn test_apply_fixed_pips() {
        let mut p = proposal(Direction::Sell, 1.1000, 1.1100, 1.0500);
        p.apply_fixed_pips(25.0, 50.0);
        assert!((p.stop_loss - 1.1025).abs() < 1e-9);
        assert!((p.take_profit - 1.0950).abs() < 1e-9);
        assert!(p.has_consistent_levels());
    }

    #[test]
    fn test_clamp_confidence() {
        assert_eq!(clamp_confidence(120.0), 95.0);
        assert_eq!(clamp_confidence(-3.0), 0.0);
        assert_eq!(clamp_confidence(f64::NAN), 0.0);
    }

    #[test]
    fn test_direction_helpers() {
        assert_eq!(Direction::Buy.opposite(), Direction::Sell);
        assert_eq!(Direction::Sell.sign(), -1.0);
        assert_eq!(Direction::Buy.to_string(), "buy");
    }
}
