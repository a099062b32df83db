//! Order placement types

use serde::{Deserialize, Serialize};

use crate::strategy::{AggregatedSignal, Direction, StrategyId};

/// Account figures reported by the broker
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AccountInfo {
    pub balance: f64,
    pub equity: f64,
    pub margin: f64,
}

impl AccountInfo {
    /// Floating P/L implied by equity against balance
    pub fn floating_pl(&self) -> f64 {
        self.equity - self.balance
    }
}

/// Market order with attached stop loss and take profit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub direction: Direction,
    /// Lots
    pub volume: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub strategy: StrategyId,
    pub comment: String,
}

impl OrderRequest {
    pub fn from_signal(signal: &AggregatedSignal, volume: f64) -> Self {
        let p = &signal.proposal;
        Self {
            symbol: p.symbol.clone(),
            direction: p.direction,
            volume,
            entry_price: p.entry_price,
            stop_loss: p.stop_loss,
            take_profit: p.take_profit,
            strategy: p.strategy,
            comment: format!("{} x{}", p.strategy, signal.confluence_count),
        }
    }
}

/// Broker acknowledgement of an executed order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub position_id: String,
    /// Fill price when the broker reports it
    pub open_price: Option<f64>,
}
