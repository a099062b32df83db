//! ADX (Average Directional Index) indicator

use crate::data::Candle;
use crate::indicators::true_range;

/// ADX reported when there is not enough data
pub const NEUTRAL_ADX: f64 = 20.0;

/// Wilder ADX of the last candle.
///
/// Needs `2 * period + 1` candles (one period to seed the smoothed
/// +DM/-DM/TR, one to seed the ADX average); returns 20 otherwise.
pub fn adx(candles: &[Candle], period: usize) -> f64 {
    if period == 0 || candles.len() < 2 * period + 1 {
        return NEUTRAL_ADX;
    }

    let mut plus_dm = Vec::with_capacity(candles.len() - 1);
    let mut minus_dm = Vec::with_capacity(candles.len() - 1);
    let mut tr = Vec::with_capacity(candles.len() - 1);
    for i in 1..candles.len() {
        let up = candles[i].high - candles[i - 1].high;
        let down = candles[i - 1].low - candles[i].low;
        plus_dm.push(if up > down && up > 0.0 { up } else { 0.0 });
        minus_dm.push(if down > up && down > 0.0 { down } else { 0.0 });
        tr.push(true_range(&candles[i], candles[i - 1].close));
    }

    let p = period as f64;
    let mut smooth_plus: f64 = plus_dm[..period].iter().sum();
    let mut smooth_minus: f64 = minus_dm[..period].iter().sum();
    let mut smooth_tr: f64 = tr[..period].iter().sum();

    let mut dx_values = Vec::with_capacity(tr.len() - period + 1);
    dx_values.push(dx(smooth_plus, smooth_minus, smooth_tr));
    for i in period..tr.len() {
        smooth_plus = smooth_plus - smooth_plus / p + plus_dm[i];
        smooth_minus = smooth_minus - smooth_minus / p + minus_dm[i];
        smooth_tr = smooth_tr - smooth_tr / p + tr[i];
        dx_values.push(dx(smooth_plus, smooth_minus, smooth_tr));
    }

    let mut adx = dx_values[..period].iter().sum::<f64>() / p;
    for &value in &dx_values[period..] {
        adx = (adx * (p - 1.0) + value) / p;
    }
    adx
}

fn dx(plus: f64, minus: f64, tr: f64) -> f64 {
    if tr <= 0.0 {
        return 0.0;
    }
    let plus_di = 100.0 * plus / tr;
    let minus_di = 100.0 * minus / tr;
    let sum = plus_di + minus_di;
    if sum <= 0.0 {
        0.0
    } else {
        100.0 * (plus_di - minus_di).abs() / sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn series(step: f64, n: usize) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let base = 100.0 + step * i as f64;
                Candle::new(start + Duration::minutes(15 * i as i64), base, base + 0.5, base - 0.5, base + step * 0.5)
            })
            .collect()
    }

    #[test]
    fn test_adx_insufficient_is_neutral() {
        assert_eq!(adx(&series(1.0, 20), 14), NEUTRAL_ADX);
    }

    #[test]
    fn test_adx_strong_trend() {
        let value = adx(&series(1.0, 80), 14);
        assert!(value > 40.0, "adx {value}");
        assert!(value <= 100.0);
    }

    #[test]
    fn test_adx_flat_market() {
        let value = adx(&series(0.0, 80), 14);
        assert!(value < 1e-9);
    }
}
