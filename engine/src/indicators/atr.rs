//! ATR (Average True Range) indicator

use crate::data::Candle;

/// True range of `current` against the previous close
pub fn true_range(current: &Candle, prev_close: f64) -> f64 {
    (current.high - current.low)
        .max((current.high - prev_close).abs())
        .max((current.low - prev_close).abs())
}

/// Simple average of the trailing `period` true ranges.
///
/// Returns exactly 0 when fewer than `period + 1` candles are supplied;
/// callers treat 0 as "indicator unavailable" and abstain.
pub fn atr(candles: &[Candle], period: usize) -> f64 {
    if period == 0 || candles.len() < period + 1 {
        return 0.0;
    }
    let start = candles.len() - period;
    let sum: f64 = (start..candles.len())
        .map(|i| true_range(&candles[i], candles[i - 1].close))
        .sum();
    (sum / period as f64).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn candle(high: f64, low: f64, close: f64) -> Candle {
        Candle::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(), close, high, low, close)
    }

    #[test]
    fn test_atr_insufficient() {
        let candles = vec![candle(2.0, 1.0, 1.5); 14];
        assert_eq!(atr(&candles, 14), 0.0);
        assert_eq!(atr(&candles, 0), 0.0);
    }

    #[test]
    fn test_atr_constant_range() {
        let candles = vec![candle(2.0, 1.0, 1.5); 20];
        assert!((atr(&candles, 14) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_true_range_gap() {
        let c = candle(12.0, 11.0, 11.5);
        assert_eq!(true_range(&c, 10.0), 2.0);
        assert_eq!(true_range(&c, 13.0), 2.0);
    }
}
