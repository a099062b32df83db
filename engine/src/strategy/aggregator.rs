//! Confluence voting across all strategies

use tracing::{debug, warn};

use crate::config::{AggregatorConfig, AlignmentPolicy, BotConfig, StrategyWeights};
use crate::data::{price_to_pips, Candle, InstrumentClass};
use crate::indicators::{atr, detect_pattern, momentum_bias, trend_bias, PatternKind};
use crate::strategy::{
    clamp_confidence, AggregatedSignal, Direction, StrategyAliases, StrategyId, StrategyRegistry,
    TradeProposal,
};

/// Proposal after boosts, with its instrument-weighted score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredProposal {
    pub proposal: TradeProposal,
    pub weighted_confidence: f64,
}

/// Runs every strategy and turns agreeing proposals into one signal
pub struct SignalAggregator {
    registry: StrategyRegistry,
    weights: StrategyWeights,
    aliases: StrategyAliases,
    config: AggregatorConfig,
}

impl SignalAggregator {
    pub fn new(
        registry: StrategyRegistry,
        weights: StrategyWeights,
        aliases: StrategyAliases,
        config: AggregatorConfig,
    ) -> Self {
        Self { registry, weights, aliases, config }
    }

    pub fn aliases(&self) -> &StrategyAliases {
        &self.aliases
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Resolve the robot's alignment policy, then aggregate.
    ///
    /// An invalid robot configuration yields no signal.
    pub fn aggregate(&self, candles: &[Candle], symbol: &str, bot: &BotConfig) -> Option<AggregatedSignal> {
        match AlignmentPolicy::from_config(bot, &self.aliases) {
            Ok(policy) => self.aggregate_with_policy(candles, symbol, bot, &policy),
            Err(e) => {
                warn!(symbol, error = %e, "invalid alignment policy");
                None
            }
        }
    }

    pub fn aggregate_with_policy(
        &self,
        candles: &[Candle],
        symbol: &str,
        bot: &BotConfig,
        policy: &AlignmentPolicy,
    ) -> Option<AggregatedSignal> {
        let scored = self.collect_proposals(candles, symbol, bot);
        if scored.is_empty() {
            return None;
        }

        // buy is always tried first
        for direction in [Direction::Buy, Direction::Sell] {
            let mut side: Vec<&ScoredProposal> =
                scored.iter().filter(|s| s.proposal.direction == direction).collect();
            if side.is_empty() {
                continue;
            }
            side.sort_by(|a, b| b.weighted_confidence.total_cmp(&a.weighted_confidence));
            let agreeing: Vec<_> = side.iter().map(|s| s.proposal.strategy).collect();
            if !policy.passes(&agreeing) {
                debug!(
                    symbol,
                    %direction,
                    matched = policy.matched(&agreeing),
                    required = policy.required_minimum(),
                    "alignment not met"
                );
                continue;
            }
            return self.finish(candles, side[0], agreeing, policy);
        }
        None
    }

    /// Every strategy's proposal with pattern and structure boosts applied
    pub fn collect_proposals(&self, candles: &[Candle], symbol: &str, bot: &BotConfig) -> Vec<ScoredProposal> {
        let pattern = detect_pattern(candles);
        let trend = trend_bias(candles);
        let momentum = momentum_bias(candles);
        let class = InstrumentClass::of(symbol).weight_class();

        self.registry
            .iter()
            .filter_map(|strategy| strategy.analyze(candles, symbol, bot))
            .map(|mut proposal| {
                let direction = proposal.direction;
                let mut confidence = proposal.confidence;
                if let Some(p) = pattern.filter(|p| p.direction == direction) {
                    confidence += match p.kind {
                        PatternKind::Engulfing => self.config.engulfing_boost,
                        PatternKind::PinBar => self.config.pin_bar_boost,
                    };
                }
                if trend == Some(direction) && momentum == Some(direction) {
                    confidence += self.config.structure_boost;
                }
                proposal.confidence = clamp_confidence(confidence);
                let weighted_confidence = proposal.confidence * self.weights.weight(class, proposal.strategy);
                debug!(
                    symbol,
                    strategy = %proposal.strategy,
                    %direction,
                    confidence = proposal.confidence,
                    weighted_confidence,
                    "strategy proposal"
                );
                ScoredProposal { proposal, weighted_confidence }
            })
            .collect()
    }

    fn finish(
        &self,
        candles: &[Candle],
        winner: &ScoredProposal,
        agreeing: Vec<StrategyId>,
        policy: &AlignmentPolicy,
    ) -> Option<AggregatedSignal> {
        let mut proposal = winner.proposal.clone();
        let confluence_count = agreeing.len();
        let beyond = confluence_count.saturating_sub(policy.required_minimum());
        proposal.confidence =
            clamp_confidence(proposal.confidence + beyond as f64 * self.config.extra_agreement_boost);

        if !proposal.has_consistent_levels() {
            let atr = atr(candles, self.config.atr_period);
            if atr <= 0.0 {
                return None;
            }
            let sign = proposal.direction.sign();
            proposal.stop_loss = proposal.entry_price - sign * self.config.fallback_sl_atr * atr;
            proposal.take_profit = proposal.entry_price + sign * self.config.fallback_tp_atr * atr;
            proposal.sl_pips = price_to_pips(&proposal.symbol, proposal.entry_price - proposal.stop_loss);
            proposal.tp_pips = price_to_pips(&proposal.symbol, proposal.take_profit - proposal.entry_price);
            if !proposal.has_consistent_levels() {
                return None;
            }
        }

        let weight = if winner.proposal.confidence > 0.0 {
            winner.weighted_confidence / winner.proposal.confidence
        } else {
            1.0
        };
        Some(AggregatedSignal {
            weighted_confidence: proposal.confidence * weight,
            lot_multiplier: self.config.lot_multiplier(confluence_count),
            confluence_count,
            agreeing,
            proposal,
        })
    }
}

impl Default for SignalAggregator {
    fn default() -> Self {
        Self::new(
            StrategyRegistry::default(),
            StrategyWeights::default(),
            StrategyAliases::default(),
            AggregatorConfig::default(),
        )
    }
}
