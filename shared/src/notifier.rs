//! Redis pub/sub [`NotificationSink`]

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use serde::Serialize;
use tracing::debug;
use trade_engine::exchange::AccountInfo;
use trade_engine::notify::NotificationSink;
use trade_engine::portfolio::Position;
use trade_engine::repository::TradeRecord;
use trade_engine::EngineError;

pub fn get_redis_client(redis_url: &str) -> Result<Client> {
    let client = Client::open(redis_url).context("invalid Redis URL")?;
    Ok(client)
}

/// Message published on every channel
#[derive(Debug, Serialize)]
struct LiveUpdate<'a, T: Serialize> {
    kind: &'a str,
    owner_id: &'a str,
    sent_at: DateTime<Utc>,
    data: T,
}

fn encode<T: Serialize>(kind: &str, owner_id: &str, sent_at: DateTime<Utc>, data: T) -> serde_json::Result<String> {
    serde_json::to_string(&LiveUpdate {
        kind,
        owner_id,
        sent_at,
        data,
    })
}

/// Publishes live updates to `<prefix>:<owner_id>:<kind>`
#[derive(Clone)]
pub struct RedisNotifier {
    connection: MultiplexedConnection,
    prefix: String,
}

impl RedisNotifier {
    pub async fn connect(client: &Client, prefix: impl Into<String>) -> Result<Self> {
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .context("failed to connect to Redis")?;
        Ok(Self {
            connection,
            prefix: prefix.into(),
        })
    }

    pub fn channel(&self, owner_id: &str, kind: &str) -> String {
        channel_name(&self.prefix, owner_id, kind)
    }

    async fn publish<T: Serialize>(&self, owner_id: &str, kind: &str, data: T) -> trade_engine::Result<()> {
        let channel = self.channel(owner_id, kind);
        let message = encode(kind, owner_id, Utc::now(), data)
            .map_err(|e| EngineError::DataUnavailable(format!("unserializable {kind} update: {e}")))?;
        let mut connection = self.connection.clone();
        let receivers: i64 = connection
            .publish(&channel, message)
            .await
            .map_err(|e| EngineError::NotConnected(format!("redis publish to {channel}: {e}")))?;
        debug!(channel = %channel, receivers, "live update published");
        Ok(())
    }
}

fn channel_name(prefix: &str, owner_id: &str, kind: &str) -> String {
    format!("{prefix}:{owner_id}:{kind}")
}

#[async_trait]
impl NotificationSink for RedisNotifier {
    async fn publish_position_update(&self, owner_id: &str, positions: &[Position]) -> trade_engine::Result<()> {
        self.publish(owner_id, "positions", positions).await
    }

    async fn publish_balance_update(&self, owner_id: &str, info: &AccountInfo) -> trade_engine::Result<()> {
        self.publish(owner_id, "balance", info).await
    }

    async fn publish_trade_opened(&self, owner_id: &str, trade: &TradeRecord) -> trade_engine::Result<()> {
        self.publish(owner_id, "trades", trade).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use trade_engine::strategy::Direction;

    #[test]
    fn test_channel_name() {
        assert_eq!(channel_name("trading", "owner-1", "balance"), "trading:owner-1:balance");
    }

    #[test]
    fn test_position_update_payload() {
        let sent_at = Utc.with_ymd_and_hms(2025, 4, 1, 12, 0, 0).unwrap();
        let positions = vec![Position::new("77", "XAUUSD", Direction::Buy, 0.2, 2310.5)];
        let raw = encode("positions", "owner-1", sent_at, positions.as_slice()).unwrap();

        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["kind"], "positions");
        assert_eq!(value["owner_id"], "owner-1");
        assert_eq!(value["data"][0]["id"], "77");
        assert_eq!(value["data"][0]["direction"], "buy");
        assert_eq!(value["sent_at"], "2025-04-01T12:00:00Z");
    }

    #[test]
    fn test_balance_update_payload() {
        let info = AccountInfo {
            balance: 5_000.0,
            equity: 4_950.0,
            margin: 120.0,
        };
        let raw = encode("balance", "owner-2", Utc::now(), &info).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["data"]["equity"], 4_950.0);
    }
}
