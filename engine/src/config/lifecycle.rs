//! Breakeven promotion thresholds

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Entry stop distance at or above which a trade counts as swing
    pub swing_sl_pips: f64,
    /// Swing trades promote only past this profit
    pub swing_min_profit_pips: f64,
    /// Favorable closes in a row confirming swing momentum
    pub swing_momentum_closes: usize,
    /// RSI band confirming buy momentum; sell uses the mirror band
    pub swing_rsi_buy: (f64, f64),
    pub swing_rsi_sell: (f64, f64),
    pub swing_buffer_pips: f64,
    /// Standard trades promote past this many ATRs of profit
    pub standard_min_profit_atr: f64,
    /// ... or past this much floating profit in account currency
    pub standard_min_profit_money: f64,
    pub standard_buffer_pips: f64,
    pub atr_period: usize,
    pub rsi_period: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            swing_sl_pips: 50.0,
            swing_min_profit_pips: 40.0,
            swing_momentum_closes: 3,
            swing_rsi_buy: (55.0, 75.0),
            swing_rsi_sell: (25.0, 45.0),
            swing_buffer_pips: 5.0,
            standard_min_profit_atr: 1.0,
            standard_min_profit_money: 10.0,
            standard_buffer_pips: 2.0,
            atr_period: 14,
            rsi_period: 14,
        }
    }
}
