//! Position lifecycle: breakeven promotion only.
//!
//! Exits are left to the broker-side stop loss and take profit. The manager
//! never closes a position, never takes profit early and never loosens a
//! stop; the only change it makes is moving the stop to entry plus a small
//! buffer once the trade has earned it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::LifecycleConfig;
use crate::data::{closes, pip_size, Candle};
use crate::exchange::{with_timeout, BrokerConnection};
use crate::indicators::{atr, consecutive_closes, rsi_last};
use crate::portfolio::Position;
use crate::strategy::{Direction, StrategyId};

/// Holding style that selects the promotion thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeClass {
    Standard,
    Swing,
}

/// Strategy that opened a position, recorded at execution time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyPositionLink {
    pub strategy: StrategyId,
    pub entry_sl_pips: f64,
    pub entry_tp_pips: f64,
    /// Explicit tag; inferred from the stop distance when absent
    pub class: Option<TradeClass>,
}

/// Stop move decided for one position
#[derive(Debug, Clone, PartialEq)]
pub struct BreakevenPlan {
    pub position_id: String,
    pub class: TradeClass,
    pub new_stop_loss: f64,
    pub profit_pips: f64,
}

/// Result of one lifecycle pass over an account
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LifecycleReport {
    pub promoted: Vec<BreakevenPlan>,
    pub skipped: usize,
    pub failures: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PositionLifecycleManager {
    config: LifecycleConfig,
}

impl PositionLifecycleManager {
    pub fn new(config: LifecycleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub fn classify(&self, position: &Position, link: Option<&StrategyPositionLink>) -> TradeClass {
        if let Some(class) = link.and_then(|l| l.class) {
            return class;
        }
        let entry_sl_pips = link
            .map(|l| l.entry_sl_pips)
            .or_else(|| position.stop_distance_pips().filter(|p| *p > 0.0));
        match entry_sl_pips {
            Some(pips) if pips >= self.config.swing_sl_pips => TradeClass::Swing,
            _ => TradeClass::Standard,
        }
    }

    /// Decide whether the position's stop moves to breakeven this cycle
    pub fn evaluate(
        &self,
        position: &Position,
        link: Option<&StrategyPositionLink>,
        candles: &[Candle],
    ) -> Option<BreakevenPlan> {
        if position.is_at_breakeven() {
            return None;
        }
        let class = self.classify(position, link);
        let direction = position.direction;
        let profit_pips = position.profit_pips();

        let (ready, buffer_pips) = match class {
            TradeClass::Swing => {
                let rsi = rsi_last(&closes(candles), self.config.rsi_period);
                let (lo, hi) = match direction {
                    Direction::Buy => self.config.swing_rsi_buy,
                    Direction::Sell => self.config.swing_rsi_sell,
                };
                let momentum = consecutive_closes(candles, direction) >= self.config.swing_momentum_closes
                    || (candles.len() > self.config.rsi_period && (lo..=hi).contains(&rsi));
                (profit_pips >= self.config.swing_min_profit_pips && momentum, self.config.swing_buffer_pips)
            }
            TradeClass::Standard => {
                let atr = atr(candles, self.config.atr_period);
                let by_atr = atr > 0.0 && position.favorable_move() >= self.config.standard_min_profit_atr * atr;
                let by_money = position.profit >= self.config.standard_min_profit_money;
                (by_atr || by_money, self.config.standard_buffer_pips)
            }
        };
        if !ready {
            return None;
        }

        let sign = direction.sign();
        let new_stop_loss = position.open_price + sign * buffer_pips * pip_size(&position.symbol);
        let tightens = position
            .stop_loss
            .map(|old| (new_stop_loss - old) * sign > 0.0)
            .unwrap_or(true);
        let below_price = (position.current_price - new_stop_loss) * sign > 0.0;
        if !(tightens && below_price) {
            return None;
        }
        Some(BreakevenPlan {
            position_id: position.id.clone(),
            class,
            new_stop_loss,
            profit_pips,
        })
    }

    /// Promote eligible positions through the broker.
    ///
    /// A position without candles or whose modify call fails is logged and
    /// skipped; the rest of the pass continues.
    pub async fn manage(
        &self,
        broker: &dyn BrokerConnection,
        positions: &[Position],
        link_for: impl Fn(&str) -> Option<StrategyPositionLink>,
        candles: &HashMap<String, Arc<Vec<Candle>>>,
        timeout: Duration,
    ) -> LifecycleReport {
        let mut report = LifecycleReport::default();
        for position in positions {
            let Some(series) = candles.get(&position.symbol) else {
                debug!(position_id = %position.id, symbol = %position.symbol, "no candles, skipping position");
                report.skipped += 1;
                continue;
            };
            let link = link_for(&position.id);
            let Some(plan) = self.evaluate(position, link.as_ref(), series) else {
                continue;
            };

            let modify = broker.modify_position(&position.id, plan.new_stop_loss, position.take_profit);
            match with_timeout(timeout, "modify_position", modify).await {
                Ok(()) => {
                    info!(
                        position_id = %position.id,
                        symbol = %position.symbol,
                        class = ?plan.class,
                        stop_loss = plan.new_stop_loss,
                        profit_pips = plan.profit_pips,
                        "stop moved to breakeven"
                    );
                    report.promoted.push(plan);
                }
                Err(e) => {
                    warn!(position_id = %position.id, error = %e, "breakeven promotion failed");
                    report.failures += 1;
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};

    fn candles(closes: &[f64]) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut prev = closes[0];
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let candle = Candle::new(
                    start + ChronoDuration::minutes(15 * i as i64),
                    prev,
                    prev.max(c) + 0.0002,
                    prev.min(c) - 0.0002,
                    c,
                );
                prev = c;
                candle
            })
            .collect()
    }

    fn flat(n: usize, price: f64) -> Vec<Candle> {
        candles(&vec![price; n])
    }

    #[test]
    fn test_standard_promotion_by_money() {
        let manager = PositionLifecycleManager::default();
        let mut pos = Position::new("1", "EURUSD", Direction::Buy, 0.1, 1.1000);
        pos.current_price = 1.1003;
        pos.stop_loss = Some(1.0980);
        pos.profit = 12.0;
        let plan = manager.evaluate(&pos, None, &flat(30, 1.1)).unwrap();
        assert_eq!(plan.class, TradeClass::Standard);
        assert!((plan.new_stop_loss - 1.1002).abs() < 1e-9);

        pos.profit = 5.0;
        assert!(manager.evaluate(&pos, None, &flat(30, 1.1)).is_none());
    }

    #[test]
    fn test_swing_needs_distance_and_momentum() {
        let manager = PositionLifecycleManager::default();
        let mut pos = Position::new("1", "XAUUSD", Direction::Sell, 0.1, 2000.0);
        pos.stop_loss = Some(2008.0);
        pos.current_price = 1995.0;
        pos.profit = 500.0;
        assert_eq!(manager.classify(&pos, None), TradeClass::Swing);
        // 50 pips of profit but no momentum in flat candles
        assert!(manager.evaluate(&pos, None, &flat(30, 1995.0)).is_none());

        let falling: Vec<f64> = (0..30).map(|i| 2000.0 - i as f64 * 0.2).collect();
        let plan = manager.evaluate(&pos, None, &candles(&falling)).unwrap();
        assert!((plan.new_stop_loss - 1999.5).abs() < 1e-9);
    }

    #[test]
    fn test_never_loosens_or_repeats() {
        let manager = PositionLifecycleManager::default();
        let mut pos = Position::new("1", "EURUSD", Direction::Buy, 0.1, 1.1000);
        pos.current_price = 1.1050;
        pos.profit = 50.0;
        pos.stop_loss = Some(1.1005);
        assert!(manager.evaluate(&pos, None, &flat(30, 1.1)).is_none());

        pos.stop_loss = Some(1.0990);
        pos.current_price = 1.1001;
        // new stop would sit above the current price
        assert!(manager.evaluate(&pos, None, &flat(30, 1.1)).is_none());
    }

    #[test]
    fn test_link_tag_overrides_inference() {
        let manager = PositionLifecycleManager::default();
        let pos = Position::new("1", "EURUSD", Direction::Buy, 0.1, 1.1000);
        let link = StrategyPositionLink {
            strategy: StrategyId::FibContinuation,
            entry_sl_pips: 20.0,
            entry_tp_pips: 40.0,
            class: Some(TradeClass::Swing),
        };
        assert_eq!(manager.classify(&pos, Some(&link)), TradeClass::Swing);
        let untagged = StrategyPositionLink { class: None, entry_sl_pips: 60.0, ..link };
        assert_eq!(manager.classify(&pos, Some(&untagged)), TradeClass::Swing);
        let short = StrategyPositionLink { class: None, ..link };
        assert_eq!(manager.classify(&pos, Some(&short)), TradeClass::Standard);
    }
}
