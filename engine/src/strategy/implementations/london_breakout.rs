//! London session breakout of the Asian range

use tracing::debug;

use crate::config::BotConfig;
use crate::data::{closes, Candle};
use crate::indicators::{atr, ema_last};
use crate::strategy::base::{build_proposal, Confidence, Levels};
use crate::strategy::{Direction, Strategy, StrategyId, TradeProposal};

/// UTC hours the breakout may trigger in
const LONDON_HOURS: std::ops::Range<u32> = 7..10;
/// UTC hours forming the Asian range
const ASIAN_HOURS: std::ops::Range<u32> = 0..7;
const MIN_ASIAN_BARS: usize = 4;

#[derive(Debug, Clone, Copy, Default)]
pub struct LondonBreakoutStrategy;

impl Strategy for LondonBreakoutStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::LondonBreakout
    }

    fn analyze(&self, candles: &[Candle], symbol: &str, config: &BotConfig) -> Option<TradeProposal> {
        analyze_london_breakout(candles, symbol, config)
    }
}

pub fn analyze_london_breakout(candles: &[Candle], symbol: &str, _config: &BotConfig) -> Option<TradeProposal> {
    let n = candles.len();
    let last = candles.last()?;
    if n < 2 || !LONDON_HOURS.contains(&last.utc_hour()) {
        return None;
    }
    let atr = atr(candles, 14);
    if atr <= 0.0 {
        return None;
    }

    let day = last.open_time.date_naive();
    let asian: Vec<&Candle> = candles
        .iter()
        .filter(|c| c.open_time.date_naive() == day && ASIAN_HOURS.contains(&c.utc_hour()))
        .collect();
    if asian.len() < MIN_ASIAN_BARS {
        return None;
    }
    let range_high = asian.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    let range_low = asian.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let range = range_high - range_low;
    if range <= 0.0 {
        return None;
    }

    let prev = &candles[n - 2];
    let direction = if last.close > range_high + 0.1 * atr && prev.close <= range_high {
        Direction::Buy
    } else if last.close < range_low - 0.1 * atr && prev.close >= range_low {
        Direction::Sell
    } else {
        return None;
    };
    let sign = direction.sign();

    let ema50_agrees = ema_last(&closes(candles), 50)
        .map(|e| (last.close - e) * sign > 0.0)
        .unwrap_or(false);
    let mut confidence = Confidence::new(60.0);
    confidence.add_if(range <= 1.5 * atr, 10.0, "tight Asian range");
    confidence.add_if(last.body_ratio() >= 0.6, 5.0, "strong body");
    confidence.add_if(ema50_agrees, 5.0, "EMA50 agrees");

    let stop_loss = if range <= 2.0 * atr {
        match direction {
            Direction::Buy => range_low,
            Direction::Sell => range_high,
        }
    } else {
        (range_high + range_low) / 2.0
    };

    debug!(symbol, %direction, range_high, range_low, "London breakout");
    build_proposal(
        StrategyId::LondonBreakout,
        symbol,
        direction,
        Levels {
            entry: last.close,
            stop_loss,
            target: last.close + sign * 1.5 * range,
        },
        &confidence,
        format!("London {direction} breakout of Asian range {range_low:.5}-{range_high:.5}"),
    )
}
