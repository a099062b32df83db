//! Regular RSI divergence at swing points

use tracing::debug;

use crate::config::BotConfig;
use crate::data::{closes, highest_high, lowest_low, Candle};
use crate::indicators::{atr, rsi, swing_highs, swing_lows};
use crate::strategy::base::{build_proposal, closes_in, Confidence, Levels};
use crate::strategy::{Direction, Strategy, StrategyId, TradeProposal};

const LOOKBACK: usize = 40;
const SWING_STRENGTH: usize = 2;

#[derive(Debug, Clone, Copy, Default)]
pub struct RsiDivergenceStrategy;

impl Strategy for RsiDivergenceStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::RsiDivergence
    }

    fn analyze(&self, candles: &[Candle], symbol: &str, config: &BotConfig) -> Option<TradeProposal> {
        analyze_rsi_divergence(candles, symbol, config)
    }
}

pub fn analyze_rsi_divergence(candles: &[Candle], symbol: &str, _config: &BotConfig) -> Option<TradeProposal> {
    let n = candles.len();
    if n < LOOKBACK + 15 {
        return None;
    }
    let atr = atr(candles, 14);
    if atr <= 0.0 {
        return None;
    }
    let rsi = rsi(&closes(candles), 14);
    let offset = n - LOOKBACK;
    let window = &candles[offset..];
    let last = candles.last()?;

    for direction in [Direction::Buy, Direction::Sell] {
        let swings = match direction {
            Direction::Buy => swing_lows(window, SWING_STRENGTH),
            Direction::Sell => swing_highs(window, SWING_STRENGTH),
        };
        let [.., first, second] = swings.as_slice() else { continue };
        let (rsi_first, rsi_second) = (rsi[offset + first.index], rsi[offset + second.index]);
        let diverges = match direction {
            Direction::Buy => second.price < first.price && rsi_second > rsi_first && rsi_second < 40.0,
            Direction::Sell => second.price > first.price && rsi_second < rsi_first && rsi_second > 60.0,
        };
        if !diverges || !closes_in(last, direction) {
            continue;
        }

        let between = &window[first.index..=second.index];
        let sign = direction.sign();
        let target = match direction {
            Direction::Buy => highest_high(between)?,
            Direction::Sell => lowest_low(between)?,
        };
        let gap = (rsi_second - rsi_first).abs();
        let mut confidence = Confidence::new(60.0);
        confidence.add_if(gap >= 5.0, 10.0, "wide RSI gap");
        confidence.add_if(window.len() - 1 - second.index <= 10, 5.0, "fresh swing");
        confidence.add_if(last.body_ratio() >= 0.5, 5.0, "strong body");

        debug!(symbol, %direction, gap, "RSI divergence");
        return build_proposal(
            StrategyId::RsiDivergence,
            symbol,
            direction,
            Levels {
                entry: last.close,
                stop_loss: second.price - sign * 0.3 * atr,
                target,
            },
            &confidence,
            format!("{direction} divergence, RSI {rsi_first:.1} -> {rsi_second:.1}"),
        );
    }
    None
}
