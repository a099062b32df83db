//! Risk gate: daily loss limit, hedging ban and position sizing

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::config::{BotConfig, RiskConfig, MIN_LOT};
use crate::data::InstrumentClass;
use crate::error::Result;
use crate::portfolio::Position;
use crate::strategy::Direction;

/// Account figures the gate decided on
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AccountRiskState {
    pub balance: f64,
    pub equity: f64,
    pub open_position_count: usize,
    pub floating_pl: f64,
    pub daily_loss_accumulated: f64,
}

/// Outcome of a risk check. A refusal is a normal result, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskDecision {
    pub allowed: bool,
    pub reason: String,
    pub state: AccountRiskState,
}

/// Per-account loss tracking for one trading day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyLossState {
    pub day: NaiveDate,
    pub day_start_balance: f64,
    /// Latched until the day changes
    pub breached: bool,
}

/// Confidence scaling applied to the tier's risk percentage
pub fn confidence_factor(confidence: f64) -> f64 {
    if confidence >= 85.0 {
        1.0
    } else if confidence >= 70.0 {
        0.8
    } else {
        0.6
    }
}

/// Realized loss since the day start plus current floating loss
fn daily_loss(day_start_balance: f64, balance: f64, floating_pl: f64) -> f64 {
    (day_start_balance - balance).max(0.0) + (-floating_pl).max(0.0)
}

/// An open position on `symbol` in the opposite direction, if any
pub fn opposing_position<'a>(positions: &'a [Position], symbol: &str, direction: Direction) -> Option<&'a Position> {
    positions
        .iter()
        .find(|p| p.symbol.eq_ignore_ascii_case(symbol) && p.direction == direction.opposite())
}

pub struct RiskGate {
    config: RiskConfig,
    tz: Tz,
    accounts: DashMap<String, Arc<Mutex<Option<DailyLossState>>>>,
}

impl RiskGate {
    pub fn new(config: RiskConfig) -> Result<Self> {
        let config = config.validate()?;
        let tz = config.timezone()?;
        Ok(Self {
            config,
            tz,
            accounts: DashMap::new(),
        })
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Hold the account's risk state for a check-then-execute sequence.
    ///
    /// Other trades on the same account wait on the guard; unrelated
    /// accounts are unaffected.
    pub async fn lock(&self, account_id: &str) -> RiskGuard<'_> {
        let cell = self
            .accounts
            .entry(account_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone();
        RiskGuard {
            gate: self,
            account_id: account_id.to_string(),
            state: cell.lock_owned().await,
        }
    }

    /// Lock, check and release in one step
    pub async fn can_open(
        &self,
        account_id: &str,
        balance: f64,
        equity: f64,
        open_position_count: usize,
        floating_pl: f64,
        confidence: f64,
    ) -> RiskDecision {
        self.lock(account_id)
            .await
            .can_open(balance, equity, open_position_count, floating_pl, confidence)
    }

    /// Record the account's refreshed figures for the trading day.
    ///
    /// Called every cycle so losses realized before the first signal of the
    /// day still count against the limit.
    pub async fn observe(&self, account_id: &str, balance: f64, floating_pl: f64, now: DateTime<Utc>) -> DailyLossState {
        self.lock(account_id).await.observe_at(now, balance, floating_pl)
    }

    /// `true` unless an opposing position is open on the symbol
    pub fn check_hedge(&self, positions: &[Position], symbol: &str, direction: Direction) -> bool {
        match opposing_position(positions, symbol, direction) {
            Some(p) => {
                debug!(symbol, %direction, position_id = %p.id, "opposing position open");
                false
            }
            None => true,
        }
    }

    /// Lot size from the balance tier, stop distance and confidence.
    ///
    /// Capped at `min(bot max lot, tier max lot x multiplier)`, then floored
    /// to the 0.01 lot step, never below 0.01.
    pub fn size_position(
        &self,
        balance: f64,
        sl_pips: f64,
        symbol: &str,
        confidence: f64,
        bot: &BotConfig,
        lot_multiplier: f64,
    ) -> f64 {
        if !sl_pips.is_finite() || sl_pips <= 0.0 || !balance.is_finite() || balance <= 0.0 {
            return MIN_LOT;
        }
        let multiplier = if lot_multiplier.is_finite() && lot_multiplier > 0.0 { lot_multiplier } else { 1.0 };
        let tier = self.config.tier_for(balance);
        let risk_amount = balance * tier.risk_percent / 100.0 * confidence_factor(confidence);
        let pip_value = InstrumentClass::of(symbol).pip_value_per_lot();
        let raw = risk_amount / (sl_pips * pip_value) * multiplier;
        let cap = bot.max_lot_size.min(tier.max_lot * multiplier);
        let lot = (raw.min(cap) * 100.0 + 1e-9).floor() / 100.0;
        lot.max(MIN_LOT)
    }
}

/// Exclusive access to one account's daily loss state
pub struct RiskGuard<'a> {
    gate: &'a RiskGate,
    account_id: String,
    state: OwnedMutexGuard<Option<DailyLossState>>,
}

impl RiskGuard<'_> {
    pub fn can_open(
        &mut self,
        balance: f64,
        equity: f64,
        open_position_count: usize,
        floating_pl: f64,
        confidence: f64,
    ) -> RiskDecision {
        self.can_open_at(Utc::now(), balance, equity, open_position_count, floating_pl, confidence)
    }

    /// Roll the trading day if needed and latch a breach.
    ///
    /// The first observation of a day fixes its start balance.
    pub fn observe_at(&mut self, now: DateTime<Utc>, balance: f64, floating_pl: f64) -> DailyLossState {
        let today = now.with_timezone(&self.gate.tz).date_naive();
        if self.state.map_or(true, |d| d.day != today) {
            *self.state = None;
        }
        let day = self.state.get_or_insert(DailyLossState {
            day: today,
            day_start_balance: balance,
            breached: false,
        });

        let accumulated = daily_loss(day.day_start_balance, balance, floating_pl);
        let limit = self.gate.config.max_daily_loss * day.day_start_balance;
        if day.day_start_balance > 0.0 && accumulated >= limit && !day.breached {
            warn!(
                account_id = %self.account_id,
                accumulated,
                limit,
                "daily loss limit breached"
            );
            day.breached = true;
        }
        *day
    }

    /// [`can_open`](Self::can_open) at an explicit instant
    pub fn can_open_at(
        &mut self,
        now: DateTime<Utc>,
        balance: f64,
        equity: f64,
        open_position_count: usize,
        floating_pl: f64,
        confidence: f64,
    ) -> RiskDecision {
        let day = self.observe_at(now, balance, floating_pl);
        let accumulated = daily_loss(day.day_start_balance, balance, floating_pl);
        let limit = self.gate.config.max_daily_loss * day.day_start_balance;

        let state = AccountRiskState {
            balance,
            equity,
            open_position_count,
            floating_pl,
            daily_loss_accumulated: accumulated,
        };
        let (allowed, reason) = if day.breached {
            (false, format!("daily loss limit reached ({accumulated:.2} >= {limit:.2})"))
        } else if balance <= 0.0 {
            (false, "no balance".to_string())
        } else if confidence <= 0.0 {
            (false, "no confidence".to_string())
        } else {
            (true, "ok".to_string())
        };
        RiskDecision { allowed, reason, state }
    }

    pub fn daily_state(&self) -> Option<DailyLossState> {
        *self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn gate() -> RiskGate {
        RiskGate::new(RiskConfig::default()).unwrap()
    }

    fn bot(max_lot: f64) -> BotConfig {
        BotConfig {
            allowed_pairs: vec!["EURUSD".into()],
            max_lot_size: max_lot,
            ..Default::default()
        }
    }

    #[test]
    fn test_size_position_tiers() {
        let gate = gate();
        // 1000 * 2% * 1.0 / (20 pips * 10) = 0.1
        let lot = gate.size_position(1_000.0, 20.0, "EURUSD", 90.0, &bot(5.0), 1.0);
        assert!((lot - 0.10).abs() < 1e-9);
        // confidence 75 -> factor 0.8
        let lot = gate.size_position(1_000.0, 20.0, "EURUSD", 75.0, &bot(5.0), 1.0);
        assert!((lot - 0.08).abs() < 1e-9);
        // tier cap 0.25 * 1.5 = 0.375 lands on the step below
        let lot = gate.size_position(1_000.0, 2.0, "EURUSD", 90.0, &bot(5.0), 1.5);
        assert!((lot - 0.37).abs() < 1e-9);
        // bot cap
        let lot = gate.size_position(1_000.0, 2.0, "EURUSD", 90.0, &bot(0.2), 1.0);
        assert!((lot - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_size_position_stays_on_lot_step() {
        let gate = gate();
        // 0.25 * 1.15 = 0.2875
        let lot = gate.size_position(1_000.0, 2.0, "EURUSD", 90.0, &bot(5.0), 1.15);
        assert!((lot - 0.28).abs() < 1e-9);
        for multiplier in [1.0, 1.15, 1.3, 1.5] {
            for balance in [250.0, 1_000.0, 7_500.0, 40_000.0] {
                for sl_pips in [1.5, 8.0, 25.0, 140.0] {
                    let lot = gate.size_position(balance, sl_pips, "EURUSD", 77.0, &bot(5.0), multiplier);
                    let steps = lot * 100.0;
                    assert!((steps - steps.round()).abs() < 1e-6, "lot {lot} off the 0.01 step");
                    assert!(lot >= MIN_LOT);
                }
            }
        }
    }

    #[test]
    fn test_size_position_minimum() {
        let gate = gate();
        assert_eq!(gate.size_position(1_000.0, 0.0, "EURUSD", 90.0, &bot(1.0), 1.0), MIN_LOT);
        assert_eq!(gate.size_position(50.0, 500.0, "XAUUSD", 60.0, &bot(1.0), 1.0), MIN_LOT);
    }

    #[tokio::test]
    async fn test_breach_latches_until_next_day() {
        let gate = gate();
        let day1 = Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap();
        let mut guard = gate.lock("acc").await;
        assert!(guard.can_open_at(day1, 1_000.0, 1_000.0, 0, 0.0, 80.0).allowed);

        let decision = guard.can_open_at(day1, 960.0, 940.0, 1, -20.0, 95.0);
        assert!(!decision.allowed);
        assert!((decision.state.daily_loss_accumulated - 60.0).abs() < 1e-9);

        // recovered balance stays blocked the same day
        assert!(!guard.can_open_at(day1, 1_000.0, 1_000.0, 0, 0.0, 95.0).allowed);

        let day2 = Utc.with_ymd_and_hms(2025, 3, 4, 0, 5, 0).unwrap();
        assert!(guard.can_open_at(day2, 940.0, 940.0, 0, 0.0, 80.0).allowed);
        assert_eq!(guard.daily_state().unwrap().day_start_balance, 940.0);
    }

    #[tokio::test]
    async fn test_observed_loss_counts_before_first_check() {
        let gate = gate();
        let morning = Utc.with_ymd_and_hms(2025, 3, 3, 7, 0, 0).unwrap();
        let state = gate.observe("acc", 10_000.0, -50.0, morning).await;
        assert_eq!(state.day_start_balance, 10_000.0);
        assert!(!state.breached);

        let noon = Utc.with_ymd_and_hms(2025, 3, 3, 12, 0, 0).unwrap();
        assert!(gate.observe("acc", 9_400.0, 0.0, noon).await.breached);

        let mut guard = gate.lock("acc").await;
        let decision = guard.can_open_at(noon, 10_100.0, 10_100.0, 0, 0.0, 90.0);
        assert!(!decision.allowed, "{}", decision.reason);
    }

    #[tokio::test]
    async fn test_accounts_are_isolated() {
        let gate = gate();
        let breached = gate.can_open("a", 900.0, 900.0, 0, -100.0, 80.0).await;
        assert!(!breached.allowed);
        assert!(gate.can_open("b", 900.0, 900.0, 0, 0.0, 80.0).await.allowed);
    }

    #[test]
    fn test_hedge_check() {
        let gate = gate();
        let positions = vec![Position::new("1", "XAUUSD", Direction::Buy, 0.1, 2000.0)];
        assert!(!gate.check_hedge(&positions, "xauusd", Direction::Sell));
        assert!(gate.check_hedge(&positions, "XAUUSD", Direction::Buy));
        assert!(gate.check_hedge(&positions, "EURUSD", Direction::Sell));
    }
}
