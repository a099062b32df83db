//! Persistence collaborator

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::BotConfig;
use crate::error::Result;
use crate::strategy::{Direction, StrategyId};

/// One enabled robot bound to one broker account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotAccountPair {
    pub robot_id: String,
    /// Account owner, used as the notification audience
    pub owner_id: String,
    pub account_id: String,
    /// Opaque handle the broker connector and market data provider understand
    pub broker_handle: String,
    pub bot_config: BotConfig,
}

/// Trade opened by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub robot_id: String,
    pub account_id: String,
    pub position_id: String,
    pub symbol: String,
    pub direction: Direction,
    pub volume: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub strategy: StrategyId,
    pub agreeing: Vec<StrategyId>,
    pub confidence: f64,
    pub lot_multiplier: f64,
    pub rationale: String,
    pub opened_at: DateTime<Utc>,
}

#[async_trait]
pub trait Repository: Send + Sync {
    async fn get_enabled_robot_account_pairs(&self) -> Result<Vec<RobotAccountPair>>;

    async fn record_trade(&self, trade: &TradeRecord) -> Result<()>;

    /// The broker no longer reports the position
    async fn mark_trade_closed(&self, account_id: &str, position_id: &str, closed_at: DateTime<Utc>) -> Result<()>;
}
