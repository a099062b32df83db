//! Position tracking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::{pip_size, price_to_pips};
use crate::strategy::Direction;

/// Broker-owned open position, mirrored locally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Broker position ID
    pub id: String,
    pub symbol: String,
    pub direction: Direction,
    /// Lots
    pub volume: f64,
    pub open_price: f64,
    pub current_price: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    /// Floating profit in account currency
    pub profit: f64,
    #[serde(default)]
    pub opened_at: Option<DateTime<Utc>>,
}

impl Position {
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        direction: Direction,
        volume: f64,
        open_price: f64,
    ) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            direction,
            volume,
            open_price,
            current_price: open_price,
            stop_loss: None,
            take_profit: None,
            profit: 0.0,
            opened_at: None,
        }
    }

    /// Signed price move in the position's favour
    pub fn favorable_move(&self) -> f64 {
        (self.current_price - self.open_price) * self.direction.sign()
    }

    /// Signed profit in pips
    pub fn profit_pips(&self) -> f64 {
        self.favorable_move() / pip_size(&self.symbol)
    }

    /// Distance from entry to stop in pips, if a stop is set
    pub fn stop_distance_pips(&self) -> Option<f64> {
        self.stop_loss.map(|sl| price_to_pips(&self.symbol, self.open_price - sl))
    }

    /// Stop already sits at or beyond the entry on the profit side
    pub fn is_at_breakeven(&self) -> bool {
        self.stop_loss
            .map(|sl| (sl - self.open_price) * self.direction.sign() >= 0.0)
            .unwrap_or(false)
    }
}
