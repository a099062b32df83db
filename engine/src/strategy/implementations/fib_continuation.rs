//! Trend continuation from a 50-61.8% retracement

use crate::config::BotConfig;
use crate::data::{closes, tail, Candle};
use crate::indicators::{atr, rsi_last, trend_bias};
use crate::strategy::base::{build_proposal, closes_in, Confidence, Levels};
use crate::strategy::{Direction, Strategy, StrategyId, TradeProposal};

const IMPULSE_WINDOW: usize = 60;
const ZONE: (f64, f64) = (0.5, 0.618);
const ZONE_TOLERANCE: f64 = 0.02;
const GOLDEN: (f64, f64) = (0.55, 0.618);

#[derive(Debug, Clone, Copy, Default)]
pub struct FibContinuationStrategy;

impl Strategy for FibContinuationStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::FibContinuation
    }

    fn analyze(&self, candles: &[Candle], symbol: &str, config: &BotConfig) -> Option<TradeProposal> {
        analyze_fib_continuation(candles, symbol, config)
    }
}

/// Index of the extreme candle by `key`, first occurrence wins
fn extreme_index(candles: &[Candle], key: impl Fn(&Candle) -> f64, higher: bool) -> Option<usize> {
    candles
        .iter()
        .enumerate()
        .reduce(|best, cur| {
            let better = if higher { key(cur.1) > key(best.1) } else { key(cur.1) < key(best.1) };
            if better { cur } else { best }
        })
        .map(|(i, _)| i)
}

pub fn analyze_fib_continuation(candles: &[Candle], symbol: &str, _config: &BotConfig) -> Option<TradeProposal> {
    let direction = trend_bias(candles)?;
    let atr = atr(candles, 14);
    if atr <= 0.0 {
        return None;
    }
    let window = tail(candles, IMPULSE_WINDOW);
    let last = candles.last()?;

    // impulse origin then the later impulse extreme
    let (origin, extreme) = match direction {
        Direction::Buy => {
            let low = extreme_index(window, |c| c.low, false)?;
            let high = low + extreme_index(&window[low..], |c| c.high, true)?;
            (window[low].low, (high, window[high].high))
        }
        Direction::Sell => {
            let high = extreme_index(window, |c| c.high, true)?;
            let low = high + extreme_index(&window[high..], |c| c.low, false)?;
            (window[high].high, (low, window[low].low))
        }
    };
    let (extreme_at, extreme) = extreme;
    if extreme_at + 1 >= window.len() {
        return None;
    }
    let sign = direction.sign();
    let impulse = (extreme - origin) * sign;
    if impulse <= 0.0 {
        return None;
    }
    let retracement = (extreme - last.close) * sign / impulse;
    if retracement < ZONE.0 - ZONE_TOLERANCE || retracement > ZONE.1 + ZONE_TOLERANCE {
        return None;
    }
    if !closes_in(last, direction) {
        return None;
    }

    let rsi = rsi_last(&closes(candles), 14);
    let mut confidence = Confidence::new(60.0);
    confidence.add_if((GOLDEN.0..=GOLDEN.1).contains(&retracement), 10.0, "golden zone");
    confidence.add_if((40.0..=60.0).contains(&rsi), 5.0, "RSI neutral");
    confidence.add_if(impulse >= 3.0 * atr, 5.0, "strong impulse");

    build_proposal(
        StrategyId::FibContinuation,
        symbol,
        direction,
        Levels {
            entry: last.close,
            stop_loss: extreme - sign * 0.786 * impulse - sign * 0.2 * atr,
            target: origin + sign * 1.272 * impulse,
        },
        &confidence,
        format!("{:.1}% retracement of {direction} impulse", retracement * 100.0),
    )
}
