//! RSI (Relative Strength Index) indicator

/// Neutral RSI reported when there is not enough data
pub const NEUTRAL_RSI: f64 = 50.0;

/// Calculate Wilder RSI, aligned with the input.
///
/// The first `period` entries (no complete window yet) are 50. If the input
/// holds fewer than `period + 1` closes the whole sequence is 50.
pub fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let period = period.max(1);
    let mut result = vec![NEUTRAL_RSI; closes.len()];
    if closes.len() < period + 1 {
        return result;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let change = closes[i] - closes[i - 1];
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss -= change;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    result[period] = rsi_from_averages(avg_gain, avg_loss);

    let p = period as f64;
    for i in (period + 1)..closes.len() {
        let change = closes[i] - closes[i - 1];
        let (gain, loss) = if change > 0.0 { (change, 0.0) } else { (0.0, -change) };
        avg_gain = (avg_gain * (p - 1.0) + gain) / p;
        avg_loss = (avg_loss * (p - 1.0) + loss) / p;
        result[i] = rsi_from_averages(avg_gain, avg_loss);
    }
    result
}

/// Last RSI value (50 on insufficient data)
pub fn rsi_last(closes: &[f64], period: usize) -> f64 {
    rsi(closes, period).last().copied().unwrap_or(NEUTRAL_RSI)
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            NEUTRAL_RSI
        } else {
            100.0
        }
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_insufficient_data() {
        let closes = vec![100.0, 102.0, 101.0, 103.0, 105.0, 104.0, 106.0];
        assert_eq!(rsi(&closes, 14), vec![50.0; 7]);
        assert_eq!(rsi_last(&[], 14), 50.0);
    }

    #[test]
    fn test_rsi_bounds() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + ((i * 7) % 11) as f64).collect();
        for value in rsi(&closes, 14) {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn test_rsi_extremes() {
        let rising: Vec<f64> = (0..30).map(|i| i as f64).collect();
        assert_eq!(rsi_last(&rising, 14), 100.0);
        let falling: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        assert!(rsi_last(&falling, 14) < 1e-9);
        let flat = vec![5.0; 30];
        assert_eq!(rsi_last(&flat, 14), 50.0);
    }

    #[test]
    fn test_rsi_balanced_moves() {
        // alternating +1 / -1 keeps gains and losses equal
        let closes: Vec<f64> = (0..41).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect();
        let value = rsi_last(&closes, 14);
        assert!((value - 50.0).abs() < 5.0);
    }
}
