//! OHLC candle data structures

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// OHLC candle. Sequences are ordered oldest-first at a fixed timeframe.
///
/// The upstream feed carries no reliable volume, so none is stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Candle open time
    pub open_time: DateTime<Utc>,
    /// Opening price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Closing price
    pub close: f64,
}

impl Candle {
    /// Create a new candle
    pub fn new(open_time: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            open_time,
            open,
            high,
            low,
            close,
        }
    }

    /// Get typical price (HLC/3)
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Get median price (HL/2)
    pub fn median_price(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    /// Check if candle is bullish
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Check if candle is bearish
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Get body size (absolute difference between open and close)
    pub fn body_size(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Get upper wick size
    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    /// Get lower wick size
    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    /// Get total range (high - low)
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Body as a fraction of the full range, 0 for a flat candle
    pub fn body_ratio(&self) -> f64 {
        let range = self.range();
        if range > 0.0 {
            self.body_size() / range
        } else {
            0.0
        }
    }

    /// UTC hour of the candle open
    pub fn utc_hour(&self) -> u32 {
        self.open_time.hour()
    }
}

/// Close prices, oldest first
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// High prices, oldest first
pub fn highs(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.high).collect()
}

/// Low prices, oldest first
pub fn lows(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.low).collect()
}

/// Highest high over a slice, `None` when empty
pub fn highest_high(candles: &[Candle]) -> Option<f64> {
    candles.iter().map(|c| c.high).reduce(f64::max)
}

/// Lowest low over a slice, `None` when empty
pub fn lowest_low(candles: &[Candle]) -> Option<f64> {
    candles.iter().map(|c| c.low).reduce(f64::min)
}

/// The last `n` candles (or all of them when shorter)
pub fn tail(candles: &[Candle], n: usize) -> &[Candle] {
    &candles[candles.len().saturating_sub(n)..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new(Utc.with_ymd_and_hms(2025, 1, 6, 8, 15, 0).unwrap(), open, high, low, close)
    }

    #[test]
    fn test_candle_shape() {
        let c = candle(100.0, 110.0, 95.0, 105.0);
        assert!(c.is_bullish());
        assert!(!c.is_bearish());
        assert_eq!(c.range(), 15.0);
        assert_eq!(c.body_size(), 5.0);
        assert_eq!(c.upper_wick(), 5.0);
        assert_eq!(c.lower_wick(), 5.0);
        assert_eq!(c.utc_hour(), 8);
    }

    #[test]
    fn test_flat_candle_body_ratio() {
        let c = candle(1.0, 1.0, 1.0, 1.0);
        assert_eq!(c.body_ratio(), 0.0);
    }

    #[test]
    fn test_extremes_and_tail() {
        let candles = vec![
            candle(1.0, 2.0, 0.5, 1.5),
            candle(1.5, 3.0, 1.0, 2.5),
            candle(2.5, 2.8, 0.2, 0.4),
        ];
        assert_eq!(highest_high(&candles), Some(3.0));
        assert_eq!(lowest_low(&candles), Some(0.2));
        assert_eq!(tail(&candles, 2).len(), 2);
        assert_eq!(tail(&candles, 10).len(), 3);
        assert_eq!(highest_high(&[]), None);
    }
}
