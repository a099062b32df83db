//! Break of a range extreme followed by a retest

use tracing::debug;

use crate::config::BotConfig;
use crate::data::{highest_high, lowest_low, Candle};
use crate::indicators::{adx, atr};
use crate::strategy::base::{build_proposal, closes_in, Confidence, Levels};
use crate::strategy::{Direction, Strategy, StrategyId, TradeProposal};

const LEVEL_LOOKBACK: usize = 40;
const BREAK_BARS: usize = 10;

#[derive(Debug, Clone, Copy, Default)]
pub struct BreakRetestStrategy;

impl Strategy for BreakRetestStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::BreakRetest
    }

    fn analyze(&self, candles: &[Candle], symbol: &str, config: &BotConfig) -> Option<TradeProposal> {
        analyze_break_retest(candles, symbol, config)
    }
}

pub fn analyze_break_retest(candles: &[Candle], symbol: &str, _config: &BotConfig) -> Option<TradeProposal> {
    let n = candles.len();
    if n < LEVEL_LOOKBACK + 1 {
        return None;
    }
    let atr = atr(candles, 14);
    if atr <= 0.0 {
        return None;
    }
    let range = &candles[n - LEVEL_LOOKBACK..n - BREAK_BARS];
    let resistance = highest_high(range)?;
    let support = lowest_low(range)?;
    let height = resistance - support;
    let break_bars = &candles[n - BREAK_BARS..n - 1];
    let last = candles.last()?;

    for (direction, level) in [(Direction::Buy, resistance), (Direction::Sell, support)] {
        let sign = direction.sign();
        let furthest = break_bars
            .iter()
            .map(|c| (c.close - level) * sign)
            .fold(f64::NEG_INFINITY, f64::max);
        if furthest <= 0.0 {
            continue;
        }
        let touch = match direction {
            Direction::Buy => last.low,
            Direction::Sell => last.high,
        };
        let retested = (touch - level).abs() <= 0.3 * atr;
        let held = (last.close - level) * sign > 0.0;
        if !(retested && held && closes_in(last, direction)) {
            continue;
        }

        let wick = match direction {
            Direction::Buy => last.lower_wick(),
            Direction::Sell => last.upper_wick(),
        };
        let mut confidence = Confidence::new(60.0);
        confidence.add_if(furthest >= 0.5 * atr, 10.0, "clean break");
        confidence.add_if(adx(candles, 14) > 20.0, 5.0, "trending");
        confidence.add_if(wick >= last.body_size() && wick > 0.0, 5.0, "rejection wick");

        debug!(symbol, %direction, level, "break and retest");
        return build_proposal(
            StrategyId::BreakRetest,
            symbol,
            direction,
            Levels {
                entry: last.close,
                stop_loss: level - sign * 0.5 * atr,
                target: last.close + sign * height,
            },
            &confidence,
            format!("retest of broken level {level:.5}"),
        );
    }
    None
}
