//! VWAP proxy

use crate::data::Candle;

/// Range-weighted average of typical price over the whole window.
///
/// The feed has no usable volume, so candle range stands in for it:
/// `sum(typical * range) / sum(range)`. A window with zero total range falls
/// back to the plain average of typical prices; an empty window yields 0.
pub fn vwap(candles: &[Candle]) -> f64 {
    if candles.is_empty() {
        return 0.0;
    }
    let (weighted, total_range) = candles.iter().fold((0.0, 0.0), |(w, r), c| {
        let range = c.range();
        (w + c.typical_price() * range, r + range)
    });
    if total_range > 0.0 {
        weighted / total_range
    } else {
        candles.iter().map(|c| c.typical_price()).sum::<f64>() / candles.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn candle(high: f64, low: f64, close: f64) -> Candle {
        Candle::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(), close, high, low, close)
    }

    #[test]
    fn test_vwap_weights_by_range() {
        // typical 10 with range 4, typical 20 with range 1
        let candles = vec![candle(12.0, 8.0, 10.0), candle(20.5, 19.5, 20.0)];
        let expected = (10.0 * 4.0 + 20.0 * 1.0) / 5.0;
        assert!((vwap(&candles) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_vwap_degenerate_windows() {
        assert_eq!(vwap(&[]), 0.0);
        let flat = vec![candle(5.0, 5.0, 5.0), candle(7.0, 7.0, 7.0)];
        assert!((vwap(&flat) - 6.0).abs() < 1e-12);
    }
}
