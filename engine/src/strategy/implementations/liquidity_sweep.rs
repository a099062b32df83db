//! Stop hunt beyond a swing extreme followed by a structure shift

use tracing::debug;

use crate::config::BotConfig;
use crate::data::{closes, highest_high, lowest_low, Candle};
use crate::indicators::{atr, rsi_last};
use crate::strategy::base::{build_proposal, closes_in, Confidence, Levels};
use crate::strategy::{Direction, Strategy, StrategyId, TradeProposal};

const WINDOW: usize = 30;
const SWEEP_BARS: usize = 3;
const SHIFT_BARS: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
pub struct LiquiditySweepStrategy;

impl Strategy for LiquiditySweepStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::LiquiditySweep
    }

    fn analyze(&self, candles: &[Candle], symbol: &str, config: &BotConfig) -> Option<TradeProposal> {
        analyze_liquidity_sweep(candles, symbol, config)
    }
}

pub fn analyze_liquidity_sweep(candles: &[Candle], symbol: &str, _config: &BotConfig) -> Option<TradeProposal> {
    let n = candles.len();
    if n < WINDOW + 1 {
        return None;
    }
    let atr = atr(candles, 14);
    if atr <= 0.0 {
        return None;
    }
    let window = &candles[n - WINDOW..n - SWEEP_BARS];
    let swing_low = lowest_low(window)?;
    let swing_high = highest_high(window)?;
    let recent = &candles[n - SWEEP_BARS..];
    let before_last = &candles[n - 1 - SHIFT_BARS..n - 1];
    let last = candles.last()?;
    let rsi = rsi_last(&closes(candles), 14);

    for direction in [Direction::Buy, Direction::Sell] {
        let sweep = match direction {
            Direction::Buy => recent
                .iter()
                .filter(|c| c.low < swing_low && c.close > swing_low)
                .min_by(|a, b| a.low.total_cmp(&b.low)),
            Direction::Sell => recent
                .iter()
                .filter(|c| c.high > swing_high && c.close < swing_high)
                .max_by(|a, b| a.high.total_cmp(&b.high)),
        };
        let Some(sweep) = sweep else { continue };

        let shifted = match direction {
            Direction::Buy => last.close > highest_high(before_last)?,
            Direction::Sell => last.close < lowest_low(before_last)?,
        };
        if !shifted {
            continue;
        }

        let (depth, stop_loss, target) = match direction {
            Direction::Buy => (swing_low - sweep.low, sweep.low - 0.2 * atr, swing_high),
            Direction::Sell => (sweep.high - swing_high, sweep.high + 0.2 * atr, swing_low),
        };
        let rsi_confirms = match direction {
            Direction::Buy => rsi > 50.0,
            Direction::Sell => rsi < 50.0,
        };
        let mut confidence = Confidence::new(62.0);
        confidence.add_if(depth >= 0.5 * atr, 10.0, "deep sweep");
        confidence.add_if(rsi_confirms, 5.0, "RSI confirms");
        confidence.add_if(closes_in(sweep, direction), 5.0, "sweep candle reversed");

        debug!(symbol, %direction, depth, "liquidity sweep with structure shift");
        return build_proposal(
            StrategyId::LiquiditySweep,
            symbol,
            direction,
            Levels { entry: last.close, stop_loss, target },
            &confidence,
            format!("liquidity swept by {depth:.5} then structure shifted {direction}"),
        );
    }
    None
}
