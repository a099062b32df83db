//! Market structure helpers: swing points, candle patterns, trend bias

use crate::data::{closes, Candle};
use crate::indicators::{ema_last, rsi_last};
use crate::strategy::Direction;

/// Local price extremum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingPoint {
    /// Index into the candle slice the point was found in
    pub index: usize,
    pub price: f64,
}

/// Highs strictly above the `strength` candles on each side
pub fn swing_highs(candles: &[Candle], strength: usize) -> Vec<SwingPoint> {
    swing_points(candles, strength, |c| c.high, |a, b| a > b)
}

/// Lows strictly below the `strength` candles on each side
pub fn swing_lows(candles: &[Candle], strength: usize) -> Vec<SwingPoint> {
    swing_points(candles, strength, |c| c.low, |a, b| a < b)
}

fn swing_points(
    candles: &[Candle],
    strength: usize,
    price: impl Fn(&Candle) -> f64,
    beats: impl Fn(f64, f64) -> bool,
) -> Vec<SwingPoint> {
    let strength = strength.max(1);
    if candles.len() < 2 * strength + 1 {
        return Vec::new();
    }
    (strength..candles.len() - strength)
        .filter(|&i| {
            let p = price(&candles[i]);
            (i - strength..=i + strength)
                .filter(|&j| j != i)
                .all(|j| beats(p, price(&candles[j])))
        })
        .map(|i| SwingPoint {
            index: i,
            price: price(&candles[i]),
        })
        .collect()
}

/// Reversal candle pattern formed by the last one or two candles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Engulfing,
    PinBar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandlePattern {
    pub kind: PatternKind,
    pub direction: Direction,
}

/// Detect an engulfing or pin-bar pattern on the last candle.
///
/// Engulfing takes precedence; at most one pattern is reported.
pub fn detect_pattern(candles: &[Candle]) -> Option<CandlePattern> {
    let last = candles.last()?;
    if candles.len() >= 2 {
        let prev = &candles[candles.len() - 2];
        if prev.is_bearish()
            && last.is_bullish()
            && last.close >= prev.open
            && last.open <= prev.close
        {
            return Some(CandlePattern {
                kind: PatternKind::Engulfing,
                direction: Direction::Buy,
            });
        }
        if prev.is_bullish()
            && last.is_bearish()
            && last.close <= prev.open
            && last.open >= prev.close
        {
            return Some(CandlePattern {
                kind: PatternKind::Engulfing,
                direction: Direction::Sell,
            });
        }
    }

    let range = last.range();
    if range <= 0.0 {
        return None;
    }
    let body = last.body_size();
    let (upper, lower) = (last.upper_wick(), last.lower_wick());
    if lower >= 2.0 * body && lower >= 0.6 * range && upper <= 0.25 * range {
        return Some(CandlePattern {
            kind: PatternKind::PinBar,
            direction: Direction::Buy,
        });
    }
    if upper >= 2.0 * body && upper >= 0.6 * range && lower <= 0.25 * range {
        return Some(CandlePattern {
            kind: PatternKind::PinBar,
            direction: Direction::Sell,
        });
    }
    None
}

/// EMA50 against EMA200; `None` when they coincide or data is too short
pub fn trend_bias(candles: &[Candle]) -> Option<Direction> {
    if candles.len() < 200 {
        return None;
    }
    let closes = closes(candles);
    let fast = ema_last(&closes, 50)?;
    let slow = ema_last(&closes, 200)?;
    if fast > slow {
        Some(Direction::Buy)
    } else if fast < slow {
        Some(Direction::Sell)
    } else {
        None
    }
}

/// RSI(14) side of 50; `None` exactly at 50
pub fn momentum_bias(candles: &[Candle]) -> Option<Direction> {
    let value = rsi_last(&closes(candles), 14);
    if value > 50.0 {
        Some(Direction::Buy)
    } else if value < 50.0 {
        Some(Direction::Sell)
    } else {
        None
    }
}

/// Count of trailing candles closing in `direction`
pub fn consecutive_closes(candles: &[Candle], direction: Direction) -> usize {
    candles
        .iter()
        .rev()
        .take_while(|c| match direction {
            Direction::Buy => c.is_bullish(),
            Direction::Sell => c.is_bearish(),
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(), open, high, low, close)
    }

    #[test]
    fn test_swing_points() {
        let highs = [1.0, 2.0, 5.0, 2.0, 1.0, 3.0, 1.0];
        let candles: Vec<Candle> = highs.iter().map(|&h| candle(h - 0.5, h, h - 1.0, h - 0.2)).collect();
        let found = swing_highs(&candles, 2);
        assert_eq!(found, vec![SwingPoint { index: 2, price: 5.0 }]);
        let lows = swing_lows(&candles, 1);
        assert!(lows.iter().any(|p| p.index == 4));
    }

    #[test]
    fn test_engulfing() {
        let candles = vec![candle(10.0, 10.2, 9.0, 9.2), candle(9.1, 10.6, 9.0, 10.4)];
        let pattern = detect_pattern(&candles).unwrap();
        assert_eq!(pattern.kind, PatternKind::Engulfing);
        assert_eq!(pattern.direction, Direction::Buy);
    }

    #[test]
    fn test_pin_bar() {
        let candles = vec![candle(10.0, 10.1, 9.9, 10.0), candle(10.0, 10.05, 9.0, 10.04)];
        let pattern = detect_pattern(&candles).unwrap();
        assert_eq!(pattern.kind, PatternKind::PinBar);
        assert_eq!(pattern.direction, Direction::Buy);
    }

    #[test]
    fn test_consecutive_closes() {
        let candles = vec![
            candle(1.0, 1.2, 0.9, 0.95),
            candle(1.0, 1.2, 0.9, 1.1),
            candle(1.1, 1.3, 1.0, 1.2),
        ];
        assert_eq!(consecutive_closes(&candles, Direction::Buy), 2);
        assert_eq!(consecutive_closes(&candles, Direction::Sell), 0);
    }
}
