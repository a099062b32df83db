//! Notification collaborator

use async_trait::async_trait;

use crate::error::Result;
use crate::exchange::AccountInfo;
use crate::portfolio::Position;
use crate::repository::TradeRecord;

/// Live view and alert delivery
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn publish_position_update(&self, owner_id: &str, positions: &[Position]) -> Result<()>;

    async fn publish_balance_update(&self, owner_id: &str, info: &AccountInfo) -> Result<()>;

    /// Trade opened by the engine
    async fn publish_trade_opened(&self, _owner_id: &str, _trade: &TradeRecord) -> Result<()> {
        Ok(())
    }
}
