//! Trade Engine: multi-strategy confluence trading core
//!
//! This crate holds the decision and execution engine that sits above a
//! broker abstraction:
//!
//! - **Indicators**: EMA, RSI, ATR, ADX, a range-weighted VWAP proxy and
//!   market-structure helpers
//! - **Strategies**: eight independent analyzers producing trade proposals
//!   with structure-derived stop loss and take profit
//! - **Aggregation**: confluence voting under a per-robot alignment policy
//! - **Risk**: daily loss limit, no hedging, balance-tiered position sizing
//! - **Lifecycle**: breakeven promotion of open positions
//! - **Scheduler**: the trading cycle and the live position stream
//!
//! Brokers, market data, persistence and notifications are reached only
//! through the traits in [`exchange`], [`repository`] and [`notify`].
//!
//! # Example
//!
//! ```no_run
//! use trade_engine::prelude::*;
//!
//! # async fn run(collaborators: Collaborators) -> anyhow::Result<()> {
//! let config = EngineConfig::from_env()?;
//! let scheduler = Scheduler::new(config, collaborators)?;
//! scheduler.start();
//! tokio::signal::ctrl_c().await?;
//! scheduler.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod exchange;
pub mod indicators;
pub mod notify;
pub mod portfolio;
pub mod repository;
pub mod scheduler;
pub mod strategy;

pub use error::{EngineError, Result};

// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{
        AggregatorConfig, AlignmentPolicy, BotConfig, EngineConfig, LifecycleConfig, LotTier, PipOverride,
        RiskConfig, RiskTier, SchedulerConfig, StrategyWeights, ValidatedBot, WeightRow, MIN_LOT,
    };
    pub use crate::data::*;
    pub use crate::error::{EngineError, Result};
    pub use crate::exchange::*;
    pub use crate::indicators::*;
    pub use crate::notify::*;
    pub use crate::portfolio::{
        AccountRiskState, BreakevenPlan, DailyLossState, LifecycleReport, Position, PositionLifecycleManager,
        RiskDecision, RiskGate, RiskGuard, StrategyPositionLink, TradeClass,
    };
    pub use crate::repository::*;
    pub use crate::scheduler::*;
    pub use crate::strategy::*;
}
