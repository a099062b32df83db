//! Strategy trait, identifiers and shared proposal construction

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::BotConfig;
use crate::data::{price_to_pips, Candle};
use crate::strategy::{clamp_confidence, Direction, TradeProposal, MAX_CONFIDENCE};

/// The eight analysis strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StrategyId {
    #[serde(rename = "ema200_pullback")]
    EmaPullback,
    #[serde(rename = "break_and_retest")]
    BreakRetest,
    #[serde(rename = "liquidity_sweep")]
    LiquiditySweep,
    #[serde(rename = "london_breakout")]
    LondonBreakout,
    #[serde(rename = "order_block")]
    OrderBlock,
    #[serde(rename = "vwap_mean_reversion")]
    VwapReversion,
    #[serde(rename = "fibonacci_continuation")]
    FibContinuation,
    #[serde(rename = "rsi_divergence")]
    RsiDivergence,
}

impl StrategyId {
    pub const ALL: [StrategyId; 8] = [
        Self::EmaPullback,
        Self::BreakRetest,
        Self::LiquiditySweep,
        Self::LondonBreakout,
        Self::OrderBlock,
        Self::VwapReversion,
        Self::FibContinuation,
        Self::RsiDivergence,
    ];

    /// Canonical configuration name
    pub fn name(&self) -> &'static str {
        match self {
            Self::EmaPullback => "ema200_pullback",
            Self::BreakRetest => "break_and_retest",
            Self::LiquiditySweep => "liquidity_sweep",
            Self::LondonBreakout => "london_breakout",
            Self::OrderBlock => "order_block",
            Self::VwapReversion => "vwap_mean_reversion",
            Self::FibContinuation => "fibonacci_continuation",
            Self::RsiDivergence => "rsi_divergence",
        }
    }

    /// Minimum reward:risk the strategy's targets must reach
    pub fn min_reward_risk(&self) -> f64 {
        match self {
            Self::VwapReversion => 1.5,
            _ => 2.0,
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.name() == s)
            .ok_or_else(|| format!("unknown strategy: {s}"))
    }
}

/// Base trait for all trading strategies.
///
/// Implementations are pure: the same candles, symbol and config always give
/// the same answer, and no strategy looks at another's output.
pub trait Strategy: Send + Sync {
    /// Get strategy identifier
    fn id(&self) -> StrategyId;

    /// Analyze the candle history and optionally propose a trade
    fn analyze(&self, candles: &[Candle], symbol: &str, config: &BotConfig) -> Option<TradeProposal>;
}

/// Additive confidence score with a record of what contributed
#[derive(Debug, Clone)]
pub(crate) struct Confidence {
    value: f64,
    factors: Vec<&'static str>,
}

impl Confidence {
    pub(crate) fn new(base: f64) -> Self {
        Self {
            value: base,
            factors: Vec::new(),
        }
    }

    pub(crate) fn add_if(&mut self, condition: bool, points: f64, factor: &'static str) {
        if condition {
            self.value += points;
            self.factors.push(factor);
        }
    }

    pub(crate) fn value(&self) -> f64 {
        self.value.min(MAX_CONFIDENCE)
    }

    pub(crate) fn describe(&self) -> String {
        if self.factors.is_empty() {
            String::new()
        } else {
            format!(" [{}]", self.factors.join(", "))
        }
    }
}

/// Structure-derived levels before validation
pub(crate) struct Levels {
    pub entry: f64,
    pub stop_loss: f64,
    pub target: f64,
}

/// Build a proposal from structure levels.
///
/// Returns `None` when the stop is not on the loss side of the entry. The
/// target is extended to the strategy's minimum reward:risk when the
/// structure target is too close (or on the wrong side).
pub(crate) fn build_proposal(
    strategy: StrategyId,
    symbol: &str,
    direction: Direction,
    levels: Levels,
    confidence: &Confidence,
    rationale: String,
) -> Option<TradeProposal> {
    let Levels {
        entry,
        stop_loss,
        target,
    } = levels;
    if !(entry.is_finite() && stop_loss.is_finite() && target.is_finite()) {
        return None;
    }
    let sign = direction.sign();
    let risk = (entry - stop_loss) * sign;
    if risk <= 0.0 {
        return None;
    }
    let min_reward = risk * strategy.min_reward_risk();
    let reward = (target - entry) * sign;
    let take_profit = if reward < min_reward {
        entry + sign * min_reward
    } else {
        target
    };

    Some(TradeProposal {
        symbol: symbol.to_string(),
        direction,
        entry_price: entry,
        stop_loss,
        take_profit,
        confidence: clamp_confidence(confidence.value()),
        strategy,
        rationale: format!("{}{}", rationale, confidence.describe()),
        sl_pips: price_to_pips(symbol, entry - stop_loss),
        tp_pips: price_to_pips(symbol, take_profit - entry),
    })
}

/// Whether a candle closed in `direction`
pub(crate) fn closes_in(candle: &Candle, direction: Direction) -> bool {
    match direction {
        Direction::Buy => candle.is_bullish(),
        Direction::Sell => candle.is_bearish(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_names_round_trip() {
        for id in StrategyId::ALL {
            assert_eq!(id.name().parse::<StrategyId>().unwrap(), id);
        }
        assert!("nope".parse::<StrategyId>().is_err());
    }

    #[test]
    fn test_build_proposal_extends_target() {
        let confidence = Confidence::new(70.0);
        let proposal = build_proposal(
            StrategyId::EmaPullback,
            "EURUSD",
            Direction::Buy,
            Levels {
                entry: 1.1000,
                stop_loss: 1.0980,
                target: 1.1010,
            },
            &confidence,
            "test".to_string(),
        )
        .unwrap();
        assert!((proposal.take_profit - 1.1040).abs() < 1e-9);
        assert!((proposal.sl_pips - 20.0).abs() < 1e-6);
        assert!((proposal.tp_pips - 40.0).abs() < 1e-6);
        assert!(proposal.has_consistent_levels());
    }

    #[test]
    fn test_build_proposal_rejects_wrong_side_stop() {
        let confidence = Confidence::new(70.0);
        let proposal = build_proposal(
            StrategyId::OrderBlock,
            "EURUSD",
            Direction::Sell,
            Levels {
                entry: 1.1000,
                stop_loss: 1.0990,
                target: 1.0900,
            },
            &confidence,
            String::new(),
        );
        assert!(proposal.is_none());
    }

    #[test]
    fn test_confidence_is_capped() {
        let mut confidence = Confidence::new(80.0);
        confidence.add_if(true, 10.0, "a");
        confidence.add_if(true, 10.0, "b");
        confidence.add_if(false, 10.0, "c");
        assert_eq!(confidence.value(), 95.0);
        assert_eq!(confidence.describe(), " [a, b]");
    }
}
