//! sea-orm backed [`Repository`] for the engine

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{NotSet, Set};
use tracing::{debug, warn};
use trade_engine::config::BotConfig;
use trade_engine::repository::{Repository, RobotAccountPair, TradeRecord};
use trade_engine::EngineError;

use crate::entity::{robots, trades};

pub struct SeaOrmRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn find_enabled_robots(&self) -> Result<Vec<robots::Model>> {
        let robots = robots::Entity::find()
            .filter(robots::Column::Enabled.eq(true))
            .all(self.db.as_ref())
            .await
            .context("failed to load enabled robots")?;
        Ok(robots)
    }

    pub async fn insert_trade(&self, trade: &TradeRecord) -> Result<()> {
        let active_model = trade_to_active_model(trade)?;
        trades::Entity::insert(active_model)
            .exec(self.db.as_ref())
            .await
            .with_context(|| format!("failed to insert trade for position {}", trade.position_id))?;
        Ok(())
    }

    /// Returns the number of open trade rows that were closed
    pub async fn close_trade(&self, account_id: &str, position_id: &str, closed_at: DateTime<Utc>) -> Result<u64> {
        let result = trades::Entity::update_many()
            .col_expr(trades::Column::Status, Expr::value(trades::STATUS_CLOSED))
            .col_expr(trades::Column::ClosedAt, Expr::value(closed_at))
            .filter(trades::Column::AccountId.eq(account_id))
            .filter(trades::Column::PositionId.eq(position_id))
            .filter(trades::Column::Status.eq(trades::STATUS_OPEN))
            .exec(self.db.as_ref())
            .await
            .with_context(|| format!("failed to close trade for position {position_id}"))?;
        Ok(result.rows_affected)
    }
}

/// Pair a stored robot with its parsed configuration
pub fn robot_to_pair(robot: &robots::Model) -> Result<RobotAccountPair> {
    let bot_config: BotConfig = serde_json::from_value(robot.config.clone())
        .with_context(|| format!("robot {} has an unreadable config", robot.id))?;
    Ok(RobotAccountPair {
        robot_id: robot.id.to_string(),
        owner_id: robot.owner_id.clone(),
        account_id: robot.account_id.clone(),
        broker_handle: robot.broker_handle.clone(),
        bot_config,
    })
}

pub fn trade_to_active_model(trade: &TradeRecord) -> Result<trades::ActiveModel> {
    let robot_id: u64 = trade
        .robot_id
        .parse()
        .with_context(|| format!("robot id {:?} is not numeric", trade.robot_id))?;
    let agreeing: Vec<&str> = trade.agreeing.iter().map(|id| id.name()).collect();

    Ok(trades::ActiveModel {
        id: NotSet,
        robot_id: Set(robot_id),
        account_id: Set(trade.account_id.clone()),
        position_id: Set(trade.position_id.clone()),
        symbol: Set(trade.symbol.clone()),
        direction: Set(trade.direction.as_str().to_string()),
        volume: Set(trade.volume),
        entry_price: Set(trade.entry_price),
        stop_loss: Set(trade.stop_loss),
        take_profit: Set(trade.take_profit),
        strategy: Set(trade.strategy.name().to_string()),
        agreeing: Set(serde_json::to_value(agreeing)?),
        confidence: Set(trade.confidence),
        lot_multiplier: Set(trade.lot_multiplier),
        rationale: Set(trade.rationale.clone()),
        status: Set(trades::STATUS_OPEN.to_string()),
        opened_at: Set(trade.opened_at),
        closed_at: Set(None),
    })
}

fn repository_error(e: anyhow::Error) -> EngineError {
    EngineError::Repository(format!("{e:#}"))
}

#[async_trait]
impl Repository for SeaOrmRepository {
    async fn get_enabled_robot_account_pairs(&self) -> trade_engine::Result<Vec<RobotAccountPair>> {
        let robots = self.find_enabled_robots().await.map_err(repository_error)?;
        let mut pairs = Vec::with_capacity(robots.len());
        for robot in &robots {
            match robot_to_pair(robot) {
                Ok(pair) => pairs.push(pair),
                Err(e) => warn!(robot_id = robot.id, error = %e, "skipping robot"),
            }
        }
        debug!(robots = robots.len(), pairs = pairs.len(), "loaded enabled robots");
        Ok(pairs)
    }

    async fn record_trade(&self, trade: &TradeRecord) -> trade_engine::Result<()> {
        self.insert_trade(trade).await.map_err(repository_error)
    }

    async fn mark_trade_closed(
        &self,
        account_id: &str,
        position_id: &str,
        closed_at: DateTime<Utc>,
    ) -> trade_engine::Result<()> {
        let closed = self
            .close_trade(account_id, position_id, closed_at)
            .await
            .map_err(repository_error)?;
        if closed == 0 {
            debug!(account_id, position_id, "no open trade row for closed position");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use trade_engine::strategy::{Direction, StrategyId};

    fn robot(config: serde_json::Value) -> robots::Model {
        robots::Model {
            id: 42,
            owner_id: "owner-9".to_string(),
            name: "gold scalper".to_string(),
            account_id: "acc-3".to_string(),
            broker_handle: "mt5-demo".to_string(),
            enabled: true,
            config,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_robot_config_parsed_from_camel_case() {
        let pair = robot_to_pair(&robot(json!({
            "allowedPairs": ["XAUUSD", "EURUSD"],
            "minAlignments": 3,
            "alignWith": ["ema", "ob", "sweep"],
            "maxLotSize": 0.5,
            "pipOverrides": {"XAUUSD": {"slPips": 40.0, "tpPips": 120.0}}
        })))
        .unwrap();

        assert_eq!(pair.robot_id, "42");
        assert_eq!(pair.account_id, "acc-3");
        assert_eq!(pair.broker_handle, "mt5-demo");
        assert_eq!(pair.bot_config.allowed_pairs, vec!["XAUUSD", "EURUSD"]);
        assert_eq!(pair.bot_config.min_alignments, Some(3));
        assert_eq!(pair.bot_config.max_lot_size, 0.5);
        assert_eq!(pair.bot_config.pip_override("xauusd").map(|p| p.tp_pips), Some(120.0));
    }

    #[test]
    fn test_unreadable_robot_config_is_an_error() {
        let err = robot_to_pair(&robot(json!({"allowedPairs": "EURUSD"}))).unwrap_err();
        assert!(format!("{err:#}").contains("robot 42"));
    }

    #[test]
    fn test_trade_record_maps_to_open_row() {
        let trade = TradeRecord {
            robot_id: "42".to_string(),
            account_id: "acc-3".to_string(),
            position_id: "9001".to_string(),
            symbol: "EURUSD".to_string(),
            direction: Direction::Sell,
            volume: 0.3,
            entry_price: 1.1,
            stop_loss: 1.102,
            take_profit: 1.096,
            strategy: StrategyId::OrderBlock,
            agreeing: vec![StrategyId::OrderBlock, StrategyId::LiquiditySweep],
            confidence: 82.0,
            lot_multiplier: 1.0,
            rationale: "sell order block".to_string(),
            opened_at: Utc.with_ymd_and_hms(2025, 2, 3, 10, 15, 0).unwrap(),
        };

        let row = trade_to_active_model(&trade).unwrap();
        assert_eq!(row.robot_id.clone().unwrap(), 42);
        assert_eq!(row.direction.clone().unwrap(), "sell");
        assert_eq!(row.strategy.clone().unwrap(), "order_block");
        assert_eq!(row.status.clone().unwrap(), trades::STATUS_OPEN);
        assert_eq!(row.agreeing.clone().unwrap(), json!(["order_block", "liquidity_sweep"]));
        assert_eq!(row.closed_at.clone().unwrap(), None);
    }

    #[test]
    fn test_non_numeric_robot_id_rejected() {
        let trade = TradeRecord {
            robot_id: "robot-x".to_string(),
            account_id: "acc".to_string(),
            position_id: "1".to_string(),
            symbol: "EURUSD".to_string(),
            direction: Direction::Buy,
            volume: 0.01,
            entry_price: 1.0,
            stop_loss: 0.99,
            take_profit: 1.02,
            strategy: StrategyId::EmaPullback,
            agreeing: vec![StrategyId::EmaPullback],
            confidence: 70.0,
            lot_multiplier: 1.0,
            rationale: String::new(),
            opened_at: Utc::now(),
        };
        assert!(trade_to_active_model(&trade).is_err());
    }
}
