//! Mean reversion to the VWAP proxy

use tracing::debug;

use crate::config::BotConfig;
use crate::data::{closes, highest_high, lowest_low, tail, Candle};
use crate::indicators::{adx, atr, rsi_last, vwap};
use crate::strategy::base::{build_proposal, closes_in, Confidence, Levels};
use crate::strategy::{Direction, Strategy, StrategyId, TradeProposal};

const MIN_CANDLES: usize = 20;

#[derive(Debug, Clone, Copy, Default)]
pub struct VwapReversionStrategy;

impl Strategy for VwapReversionStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::VwapReversion
    }

    fn analyze(&self, candles: &[Candle], symbol: &str, config: &BotConfig) -> Option<TradeProposal> {
        analyze_vwap_reversion(candles, symbol, config)
    }
}

pub fn analyze_vwap_reversion(candles: &[Candle], symbol: &str, _config: &BotConfig) -> Option<TradeProposal> {
    if candles.len() < MIN_CANDLES {
        return None;
    }
    let atr = atr(candles, 14);
    if atr <= 0.0 {
        return None;
    }
    let vwap = vwap(candles);
    let last = candles.last()?;
    let deviation = (last.close - vwap) / atr;
    let rsi = rsi_last(&closes(candles), 14);

    let direction = if deviation <= -2.0 && rsi < 35.0 {
        Direction::Buy
    } else if deviation >= 2.0 && rsi > 65.0 {
        Direction::Sell
    } else {
        return None;
    };
    if !closes_in(last, direction) {
        return None;
    }

    let mut confidence = Confidence::new(58.0);
    confidence.add_if(deviation.abs() >= 3.0, 10.0, "extreme deviation");
    confidence.add_if(adx(candles, 14) < 25.0, 5.0, "ranging");
    confidence.add_if(rsi < 25.0 || rsi > 75.0, 5.0, "RSI extreme");

    let recent = tail(candles, 5);
    let stop_loss = match direction {
        Direction::Buy => lowest_low(recent)? - 0.2 * atr,
        Direction::Sell => highest_high(recent)? + 0.2 * atr,
    };

    debug!(symbol, %direction, deviation, rsi, "VWAP stretch");
    build_proposal(
        StrategyId::VwapReversion,
        symbol,
        direction,
        Levels { entry: last.close, stop_loss, target: vwap },
        &confidence,
        format!("{deviation:.1} ATR from VWAP {vwap:.5}, RSI {rsi:.1}"),
    )
}
