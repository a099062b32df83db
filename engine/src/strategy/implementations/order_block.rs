//! Order block rejection

use crate::config::BotConfig;
use crate::data::{highest_high, lowest_low, Candle};
use crate::indicators::{atr, trend_bias};
use crate::strategy::base::{build_proposal, closes_in, Confidence, Levels};
use crate::strategy::{Direction, Strategy, StrategyId, TradeProposal};

const LOOKBACK: usize = 30;
const IMPULSE_BARS: usize = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderBlockStrategy;

impl Strategy for OrderBlockStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::OrderBlock
    }

    fn analyze(&self, candles: &[Candle], symbol: &str, config: &BotConfig) -> Option<TradeProposal> {
        analyze_order_block(candles, symbol, config)
    }
}

/// Last opposite candle before a displacement that broke its extreme
struct Block {
    index: usize,
    high: f64,
    low: f64,
    impulse: f64,
}

fn find_block(candles: &[Candle], direction: Direction, atr: f64) -> Option<Block> {
    let n = candles.len();
    let start = n.saturating_sub(LOOKBACK);
    // the impulse must complete before the last candle
    let newest = n.checked_sub(IMPULSE_BARS + 2)?;
    (start..=newest).rev().find_map(|i| {
        let block = &candles[i];
        if !closes_in(block, direction.opposite()) {
            return None;
        }
        let impulse = &candles[i + 1..=i + IMPULSE_BARS];
        let end = impulse.last()?;
        let (displacement, broke) = match direction {
            Direction::Buy => (end.close - block.close, highest_high(impulse)? > block.high),
            Direction::Sell => (block.close - end.close, lowest_low(impulse)? < block.low),
        };
        (displacement >= 1.5 * atr && broke).then_some(Block {
            index: i,
            high: block.high,
            low: block.low,
            impulse: displacement,
        })
    })
}

pub fn analyze_order_block(candles: &[Candle], symbol: &str, _config: &BotConfig) -> Option<TradeProposal> {
    let n = candles.len();
    if n < LOOKBACK {
        return None;
    }
    let atr = atr(candles, 14);
    if atr <= 0.0 {
        return None;
    }
    let last = candles.last()?;

    for direction in [Direction::Buy, Direction::Sell] {
        let Some(block) = find_block(candles, direction, atr) else { continue };
        let mid = (block.high + block.low) / 2.0;
        let (tapped, held) = match direction {
            Direction::Buy => (last.low <= block.high, last.close > mid),
            Direction::Sell => (last.high >= block.low, last.close < mid),
        };
        if !(tapped && held && closes_in(last, direction)) {
            continue;
        }

        let since_block = &candles[block.index..];
        let (stop_loss, target, wick) = match direction {
            Direction::Buy => (block.low - 0.2 * atr, highest_high(since_block)?, last.lower_wick()),
            Direction::Sell => (block.high + 0.2 * atr, lowest_low(since_block)?, last.upper_wick()),
        };
        let mut confidence = Confidence::new(60.0);
        confidence.add_if(block.impulse >= 2.5 * atr, 10.0, "strong displacement");
        confidence.add_if(wick >= last.body_size() && wick > 0.0, 5.0, "rejection wick");
        confidence.add_if(trend_bias(candles) == Some(direction), 5.0, "trend agrees");

        return build_proposal(
            StrategyId::OrderBlock,
            symbol,
            direction,
            Levels { entry: last.close, stop_loss, target },
            &confidence,
            format!("{direction} order block {:.5}-{:.5} held", block.low, block.high),
        );
    }
    None
}
