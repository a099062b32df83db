//! EMA (Exponential Moving Average) indicator

/// Simple average of a slice, `None` when empty
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Calculate EMA over a series.
///
/// Seeds with the simple average of the first `period` values, then smooths
/// with multiplier `2 / (period + 1)`. The result is `period - 1` shorter than
/// the input. When the input is shorter than `period`, the result is the first
/// value repeated for the whole input length.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let period = period.max(1);
    let Some(&first) = values.first() else {
        return Vec::new();
    };
    if values.len() < period {
        return vec![first; values.len()];
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut result = Vec::with_capacity(values.len() - period + 1);
    let mut prev = values[..period].iter().sum::<f64>() / period as f64;
    result.push(prev);
    for &value in &values[period..] {
        prev = (value - prev) * k + prev;
        result.push(prev);
    }
    result
}

/// Last EMA value, `None` for empty input
pub fn ema_last(values: &[f64], period: usize) -> Option<f64> {
    ema(values, period).last().copied()
}
