//! Collaborator traits for market data and broker sessions

use std::sync::Arc;

use async_trait::async_trait;

use crate::data::Candle;
use crate::error::Result;
use crate::exchange::{AccountInfo, OrderRequest, TradeOutcome};
use crate::portfolio::Position;

/// Candle source.
///
/// Implementations report `EngineError::RateLimited` when throttled so the
/// cache can fall back to stale data, and `DataUnavailable` when the
/// instrument simply has no history.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn get_candles(
        &self,
        account_handle: &str,
        symbol: &str,
        timeframe: &str,
        count: usize,
    ) -> Result<Vec<Candle>>;
}

/// One authenticated broker session
#[async_trait]
pub trait BrokerConnection: Send + Sync {
    async fn get_account_info(&self) -> Result<AccountInfo>;

    async fn get_open_positions(&self) -> Result<Vec<Position>>;

    async fn execute_trade(&self, order: &OrderRequest) -> Result<TradeOutcome>;

    /// Replace the stop (and optionally the target) of an open position
    async fn modify_position(&self, position_id: &str, stop_loss: f64, take_profit: Option<f64>) -> Result<()>;

    /// Part of the broker contract; the engine leaves exits to broker-side
    /// stop loss and take profit and never calls this.
    async fn close_position(&self, position_id: &str) -> Result<()>;
}

/// Opens (or reuses) broker sessions by account handle
#[async_trait]
pub trait BrokerConnector: Send + Sync {
    async fn connect(&self, broker_handle: &str) -> Result<Arc<dyn BrokerConnection>>;
}
