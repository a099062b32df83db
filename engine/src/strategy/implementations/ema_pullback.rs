//! EMA200 trend pullback

use tracing::debug;

use crate::config::BotConfig;
use crate::data::{closes, highest_high, lowest_low, tail, Candle};
use crate::indicators::{atr, ema, rsi_last};
use crate::strategy::base::{build_proposal, closes_in, Confidence, Levels};
use crate::strategy::{Direction, Strategy, StrategyId, TradeProposal};

const MIN_CANDLES: usize = 210;
const SLOPE_BARS: usize = 10;

/// Buy pullbacks to EMA50 in an EMA200 uptrend (mirror for sell)
#[derive(Debug, Clone, Copy, Default)]
pub struct EmaPullbackStrategy;

impl Strategy for EmaPullbackStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::EmaPullback
    }

    fn analyze(&self, candles: &[Candle], symbol: &str, config: &BotConfig) -> Option<TradeProposal> {
        analyze_ema_pullback(candles, symbol, config)
    }
}

pub fn analyze_ema_pullback(candles: &[Candle], symbol: &str, _config: &BotConfig) -> Option<TradeProposal> {
    if candles.len() < MIN_CANDLES {
        return None;
    }
    let atr = atr(candles, 14);
    if atr <= 0.0 {
        return None;
    }
    let closes = closes(candles);
    let ema200 = ema(&closes, 200);
    let ema50 = ema(&closes, 50);
    let (&e200, &e50) = (ema200.last()?, ema50.last()?);
    let last = candles.last()?;
    let close = last.close;

    let direction = if close > e200 && e50 > e200 {
        Direction::Buy
    } else if close < e200 && e50 < e200 {
        Direction::Sell
    } else {
        return None;
    };

    if (close - e50).abs() > 0.5 * atr {
        debug!(symbol, distance = (close - e50).abs(), atr, "price too far from EMA50");
        return None;
    }
    let rsi = rsi_last(&closes, 14);
    let rsi_ok = match direction {
        Direction::Buy => (40.0..=65.0).contains(&rsi),
        Direction::Sell => (35.0..=60.0).contains(&rsi),
    };
    if !rsi_ok || !closes_in(last, direction) {
        return None;
    }

    let sign = direction.sign();
    let slope = |series: &[f64]| -> f64 {
        if series.len() > SLOPE_BARS {
            (series[series.len() - 1] - series[series.len() - 1 - SLOPE_BARS]) * sign
        } else {
            0.0
        }
    };

    let mut confidence = Confidence::new(60.0);
    confidence.add_if(slope(&ema200) > 0.0, 10.0, "EMA200 sloping");
    confidence.add_if((45.0..=55.0).contains(&rsi), 5.0, "RSI balanced");
    confidence.add_if(last.body_ratio() >= 0.5, 5.0, "strong body");
    confidence.add_if(slope(&ema50) > 0.0, 5.0, "EMA50 sloping");

    let (stop_loss, target) = match direction {
        Direction::Buy => (
            lowest_low(tail(candles, 20))? - 0.2 * atr,
            highest_high(tail(candles, 50))?,
        ),
        Direction::Sell => (
            highest_high(tail(candles, 20))? + 0.2 * atr,
            lowest_low(tail(candles, 50))?,
        ),
    };

    build_proposal(
        StrategyId::EmaPullback,
        symbol,
        direction,
        Levels { entry: close, stop_loss, target },
        &confidence,
        format!("EMA200 {direction} pullback to EMA50 (RSI {rsi:.1})"),
    )
}
