//! Mutable state owned by one scheduler instance

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::time::Instant;

use crate::data::CandleCache;
use crate::exchange::AccountInfo;
use crate::portfolio::{Position, StrategyPositionLink};

/// Strategy link plus the account and robot that opened the position
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedPosition {
    pub account_id: String,
    pub robot_id: String,
    pub link: StrategyPositionLink,
}

/// Last account view written by the trading cycle, read by the stream loop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSnapshot {
    pub account_id: String,
    pub owner_id: String,
    pub info: AccountInfo,
    pub positions: Vec<Position>,
    pub updated_at: DateTime<Utc>,
}

/// Candle cache, cooldowns, strategy links and live snapshots.
///
/// All maps lock per key so accounts processed in parallel do not
/// serialize on each other.
pub struct SchedulerState {
    pub candles: CandleCache,
    cooldowns: DashMap<(String, String), Instant>,
    links: DashMap<String, TrackedPosition>,
    snapshots: DashMap<String, AccountSnapshot>,
}

impl SchedulerState {
    pub fn new(cache_ttl: Duration) -> Self {
        Self {
            candles: CandleCache::new(cache_ttl),
            cooldowns: DashMap::new(),
            links: DashMap::new(),
            snapshots: DashMap::new(),
        }
    }

    fn cooldown_key(account_id: &str, symbol: &str) -> (String, String) {
        (account_id.to_string(), symbol.to_ascii_uppercase())
    }

    /// A trade on the symbol happened within `cooldown`
    pub fn in_cooldown(&self, account_id: &str, symbol: &str, cooldown: Duration) -> bool {
        self.cooldowns
            .get(&Self::cooldown_key(account_id, symbol))
            .map(|at| at.elapsed() < cooldown)
            .unwrap_or(false)
    }

    pub fn mark_traded(&self, account_id: &str, symbol: &str) {
        self.cooldowns.insert(Self::cooldown_key(account_id, symbol), Instant::now());
    }

    pub fn track(&self, position_id: impl Into<String>, tracked: TrackedPosition) {
        self.links.insert(position_id.into(), tracked);
    }

    pub fn link(&self, position_id: &str) -> Option<StrategyPositionLink> {
        self.links.get(position_id).map(|t| t.link)
    }

    pub fn untrack(&self, position_id: &str) -> Option<TrackedPosition> {
        self.links.remove(position_id).map(|(_, t)| t)
    }

    /// Tracked positions of an account the broker no longer reports
    pub fn vanished_positions(&self, account_id: &str, open: &[Position]) -> Vec<String> {
        self.links
            .iter()
            .filter(|e| e.account_id == account_id && !open.iter().any(|p| &p.id == e.key()))
            .map(|e| e.key().clone())
            .collect()
    }

    pub fn tracked_count(&self) -> usize {
        self.links.len()
    }

    pub fn store_snapshot(&self, snapshot: AccountSnapshot) {
        self.snapshots.insert(snapshot.account_id.clone(), snapshot);
    }

    pub fn snapshot(&self, account_id: &str) -> Option<AccountSnapshot> {
        self.snapshots.get(account_id).map(|s| s.clone())
    }

    pub fn snapshots(&self) -> Vec<AccountSnapshot> {
        let mut all: Vec<_> = self.snapshots.iter().map(|s| s.value().clone()).collect();
        all.sort_by(|a, b| a.account_id.cmp(&b.account_id));
        all
    }

    /// Drop snapshots of accounts that no longer have an enabled robot
    pub fn retain_snapshots(&self, active: &HashSet<String>) {
        self.snapshots.retain(|account_id, _| active.contains(account_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{Direction, StrategyId};

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_window() {
        let state = SchedulerState::new(Duration::from_secs(60));
        let cooldown = Duration::from_secs(900);
        assert!(!state.in_cooldown("acc", "XAUUSD", cooldown));
        state.mark_traded("acc", "xauusd");
        assert!(state.in_cooldown("acc", "XAUUSD", cooldown));
        assert!(!state.in_cooldown("other", "XAUUSD", cooldown));
        tokio::time::advance(Duration::from_secs(901)).await;
        assert!(!state.in_cooldown("acc", "XAUUSD", cooldown));
    }

    #[test]
    fn test_vanished_positions() {
        let state = SchedulerState::new(Duration::from_secs(60));
        let link = StrategyPositionLink {
            strategy: StrategyId::OrderBlock,
            entry_sl_pips: 20.0,
            entry_tp_pips: 40.0,
            class: None,
        };
        for (id, account) in [("p1", "a"), ("p2", "a"), ("p3", "b")] {
            state.track(
                id,
                TrackedPosition { account_id: account.into(), robot_id: "r".into(), link },
            );
        }
        let open = vec![Position::new("p1", "EURUSD", Direction::Buy, 0.1, 1.1)];
        assert_eq!(state.vanished_positions("a", &open), vec!["p2".to_string()]);
        assert!(state.untrack("p2").is_some());
        assert_eq!(state.tracked_count(), 2);
    }
}
