//! Trading scheduler
//!
//! Two independent loops share one [`SchedulerState`]:
//!
//! - the trading cycle (default every 60s) loads enabled robots, runs the
//!   position lifecycle pass per account, then scans each robot's symbols and
//!   executes signals that clear the risk gate;
//! - the stream loop (default every 5s) republishes the cached account
//!   snapshots and never calls the broker.
//!
//! Accounts run concurrently, robots within an account run one after the
//! other.

pub mod rate_limit;
pub mod state;

pub use rate_limit::*;
pub use state::*;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{EngineConfig, SchedulerConfig, ValidatedBot};
use crate::data::Candle;
use crate::error::Result;
use crate::exchange::{
    with_timeout, AccountInfo, BrokerConnection, BrokerConnector, MarketDataProvider, OrderRequest,
};
use crate::notify::NotificationSink;
use crate::portfolio::{
    PositionLifecycleManager, Position, RiskGate, StrategyPositionLink, TradeClass,
};
use crate::repository::{Repository, RobotAccountPair, TradeRecord};
use crate::strategy::{SignalAggregator, StrategyAliases, StrategyRegistry};

/// Outcome counters of one trading cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub accounts: usize,
    /// Signals that passed aggregation
    pub signals: usize,
    pub executed: usize,
    /// Signals refused by cooldown-free checks: hedging or risk gate
    pub rejected: usize,
    /// Broker, repository or data failures isolated to one item
    pub failures: usize,
    pub promotions: usize,
    /// Tracked positions the broker stopped reporting
    pub closed: usize,
    /// Robots skipped for invalid configuration
    pub skipped_robots: usize,
}

impl CycleReport {
    fn merge(&mut self, other: CycleReport) {
        self.accounts += other.accounts;
        self.signals += other.signals;
        self.executed += other.executed;
        self.rejected += other.rejected;
        self.failures += other.failures;
        self.promotions += other.promotions;
        self.closed += other.closed;
        self.skipped_robots += other.skipped_robots;
    }
}

/// External systems the scheduler drives
#[derive(Clone)]
pub struct Collaborators {
    pub repository: Arc<dyn Repository>,
    pub market_data: Arc<dyn MarketDataProvider>,
    pub connector: Arc<dyn BrokerConnector>,
    pub notifier: Arc<dyn NotificationSink>,
}

struct RunningLoops {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

pub struct Scheduler {
    inner: Arc<SchedulerInner>,
    running: Mutex<Option<RunningLoops>>,
}

struct SchedulerInner {
    config: SchedulerConfig,
    collaborators: Collaborators,
    aggregator: SignalAggregator,
    risk: RiskGate,
    lifecycle: PositionLifecycleManager,
    state: Arc<SchedulerState>,
    order_limiter: RateLimiter,
    /// Serializes trading cycles so a slow cycle never overlaps the next
    cycle_lock: tokio::sync::Mutex<()>,
}

impl Scheduler {
    /// Scheduler running the eight built-in strategies
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> Result<Self> {
        let aggregator = SignalAggregator::new(
            StrategyRegistry::default(),
            config.weights.clone(),
            StrategyAliases::default(),
            config.aggregator.clone(),
        );
        Self::with_aggregator(config, collaborators, aggregator)
    }

    pub fn with_aggregator(
        config: EngineConfig,
        collaborators: Collaborators,
        aggregator: SignalAggregator,
    ) -> Result<Self> {
        let state = Arc::new(SchedulerState::new(config.scheduler.cache_ttl()));
        Self::with_state(config, collaborators, aggregator, state)
    }

    /// Build around existing state, e.g. to share a warm candle cache
    pub fn with_state(
        config: EngineConfig,
        collaborators: Collaborators,
        aggregator: SignalAggregator,
        state: Arc<SchedulerState>,
    ) -> Result<Self> {
        let risk = RiskGate::new(config.risk)?;
        let inner = SchedulerInner {
            order_limiter: RateLimiter::new(config.scheduler.order_rate_per_sec, config.scheduler.order_burst),
            config: config.scheduler,
            collaborators,
            aggregator,
            risk,
            lifecycle: PositionLifecycleManager::new(config.lifecycle),
            state,
            cycle_lock: tokio::sync::Mutex::new(()),
        };
        Ok(Self {
            inner: Arc::new(inner),
            running: Mutex::new(None),
        })
    }

    pub fn state(&self) -> Arc<SchedulerState> {
        self.inner.state.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .map(|r| r.is_some())
            .unwrap_or_else(|poisoned| poisoned.into_inner().is_some())
    }

    /// Spawn both loops. Returns `false` (and does nothing) when already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut running = self.running.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if running.is_some() {
            debug!("scheduler already running");
            return false;
        }

        let cancel = CancellationToken::new();
        let handles = vec![
            tokio::spawn(trading_loop(self.inner.clone(), cancel.clone())),
            tokio::spawn(stream_loop(self.inner.clone(), cancel.clone())),
        ];
        *running = Some(RunningLoops { cancel, handles });
        info!(
            trading_interval = ?self.inner.config.trading_interval(),
            stream_interval = ?self.inner.config.stream_interval(),
            "🚀 scheduler started"
        );
        true
    }

    /// Stop both loops, letting an in-flight cycle finish. Safe when stopped.
    pub async fn stop(&self) {
        let loops = self
            .running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        let Some(loops) = loops else {
            debug!("scheduler not running");
            return;
        };
        loops.cancel.cancel();
        for handle in loops.handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "scheduler loop ended abnormally");
            }
        }
        info!("🛑 scheduler stopped");
    }

    /// Run one trading cycle now
    pub async fn run_cycle_once(&self) -> Result<CycleReport> {
        self.inner.run_cycle().await
    }

    /// Publish cached snapshots once; returns the number of accounts published
    pub async fn publish_snapshots(&self) -> usize {
        self.inner.publish_snapshots().await
    }
}

async fn trading_loop(inner: Arc<SchedulerInner>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(inner.config.trading_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                // the cycle runs to completion even if stop is requested meanwhile
                if let Err(e) = inner.run_cycle().await {
                    error!(error = %e, "❌ trading cycle aborted, retrying next tick");
                }
            }
        }
    }
    debug!("trading loop exited");
}

async fn stream_loop(inner: Arc<SchedulerInner>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(inner.config.stream_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                inner.publish_snapshots().await;
            }
        }
    }
    debug!("stream loop exited");
}

impl SchedulerInner {
    fn timeout(&self) -> Duration {
        self.config.broker_timeout()
    }

    async fn run_cycle(&self) -> Result<CycleReport> {
        let _cycle = self.cycle_lock.lock().await;
        let cycle_id = Uuid::new_v4();
        self.cycle(cycle_id)
            .instrument(info_span!("trading_cycle", %cycle_id))
            .await
    }

    async fn cycle(&self, cycle_id: Uuid) -> Result<CycleReport> {
        let pairs = with_timeout(
            self.timeout(),
            "get_enabled_robot_account_pairs",
            self.collaborators.repository.get_enabled_robot_account_pairs(),
        )
        .await?;

        let mut accounts: BTreeMap<String, Vec<RobotAccountPair>> = BTreeMap::new();
        for pair in pairs {
            accounts.entry(pair.account_id.clone()).or_default().push(pair);
        }
        let active: HashSet<String> = accounts.keys().cloned().collect();
        self.state.retain_snapshots(&active);

        let concurrency = match self.config.max_concurrent_accounts {
            0 => accounts
                .values()
                .filter_map(|robots| robots.first().map(|r| r.broker_handle.as_str()))
                .collect::<HashSet<_>>()
                .len()
                .max(1),
            n => n,
        };

        let report = tokio::sync::Mutex::new(CycleReport {
            cycle_id,
            ..Default::default()
        });
        futures::stream::iter(accounts)
            .for_each_concurrent(concurrency, |(account_id, robots)| {
                let report = &report;
                async move {
                    let account_report = self
                        .process_account(&account_id, &robots)
                        .instrument(info_span!("account", %account_id))
                        .await;
                    report.lock().await.merge(account_report);
                }
            })
            .await;

        let report = report.into_inner();
        info!(
            accounts = report.accounts,
            signals = report.signals,
            executed = report.executed,
            rejected = report.rejected,
            failures = report.failures,
            promotions = report.promotions,
            closed = report.closed,
            "✅ trading cycle complete"
        );
        Ok(report)
    }

    async fn process_account(&self, account_id: &str, robots: &[RobotAccountPair]) -> CycleReport {
        let mut report = CycleReport {
            accounts: 1,
            ..Default::default()
        };
        let Some(first) = robots.first() else {
            return report;
        };
        let timeout = self.timeout();

        let broker = match with_timeout(
            timeout,
            "connect",
            self.collaborators.connector.connect(&first.broker_handle),
        )
        .await
        {
            Ok(broker) => broker,
            Err(e) => {
                warn!(error = %e, "broker connection failed, skipping account");
                report.failures += 1;
                return report;
            }
        };

        let (info, mut positions) = match self.refresh_account(broker.as_ref()).await {
            Ok(refreshed) => refreshed,
            Err(e) => {
                warn!(error = %e, "account refresh failed, skipping account");
                report.failures += 1;
                return report;
            }
        };

        let daily = self
            .risk
            .observe(account_id, info.balance, info.floating_pl(), Utc::now())
            .await;
        if daily.breached {
            debug!(day_start_balance = daily.day_start_balance, "daily loss limit latched");
        }

        self.reconcile_closed(account_id, &positions, &mut report).await;

        // lifecycle completes before any new trade is considered
        let candles = self.candles_for_positions(&first.broker_handle, &positions).await;
        let lifecycle = self
            .lifecycle
            .manage(broker.as_ref(), &positions, |id| self.state.link(id), &candles, timeout)
            .await;
        for plan in &lifecycle.promoted {
            if let Some(p) = positions.iter_mut().find(|p| p.id == plan.position_id) {
                p.stop_loss = Some(plan.new_stop_loss);
            }
        }
        report.promotions += lifecycle.promoted.len();
        report.failures += lifecycle.failures;

        for robot in robots {
            let validated = match robot.bot_config.clone().into_validated(self.aggregator.aliases()) {
                Ok(validated) => validated,
                Err(e) => {
                    warn!(robot_id = %robot.robot_id, error = %e, "skipping robot with invalid configuration");
                    report.skipped_robots += 1;
                    continue;
                }
            };
            let symbols: Vec<String> = validated
                .config
                .allowed_pairs
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            for symbol in symbols {
                self.scan_symbol(broker.as_ref(), robot, &validated, &symbol, &info, &mut positions, &mut report)
                    .await;
            }
        }

        self.state.store_snapshot(AccountSnapshot {
            account_id: account_id.to_string(),
            owner_id: first.owner_id.clone(),
            info,
            positions,
            updated_at: Utc::now(),
        });
        report
    }

    async fn refresh_account(&self, broker: &dyn BrokerConnection) -> Result<(AccountInfo, Vec<Position>)> {
        let info = with_timeout(self.timeout(), "get_account_info", broker.get_account_info()).await?;
        let positions = with_timeout(self.timeout(), "get_open_positions", broker.get_open_positions()).await?;
        Ok((info, positions))
    }

    /// Report tracked positions that disappeared from the broker as closed
    async fn reconcile_closed(&self, account_id: &str, open: &[Position], report: &mut CycleReport) {
        for position_id in self.state.vanished_positions(account_id, open) {
            let closed = with_timeout(
                self.timeout(),
                "mark_trade_closed",
                self.collaborators
                    .repository
                    .mark_trade_closed(account_id, &position_id, Utc::now()),
            )
            .await;
            match closed {
                Ok(()) => {
                    self.state.untrack(&position_id);
                    info!(position_id = %position_id, "position closed by broker");
                    report.closed += 1;
                }
                Err(e) => {
                    // keep the link so the next cycle retries
                    warn!(position_id = %position_id, error = %e, "failed to mark trade closed");
                    report.failures += 1;
                }
            }
        }
    }

    async fn candles_for_positions(
        &self,
        broker_handle: &str,
        positions: &[Position],
    ) -> HashMap<String, Arc<Vec<Candle>>> {
        let symbols: HashSet<&str> = positions.iter().map(|p| p.symbol.as_str()).collect();
        let mut candles = HashMap::new();
        for symbol in symbols {
            match self.fetch_candles(broker_handle, symbol).await {
                Ok(series) => {
                    candles.insert(symbol.to_string(), series);
                }
                Err(e) => warn!(symbol, error = %e, "no candles for open position"),
            }
        }
        candles
    }

    async fn fetch_candles(&self, broker_handle: &str, symbol: &str) -> Result<Arc<Vec<Candle>>> {
        self.state
            .candles
            .fetch(
                self.collaborators.market_data.as_ref(),
                broker_handle,
                symbol,
                &self.config.candle_timeframe,
                self.config.candle_count,
                self.timeout(),
            )
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn scan_symbol(
        &self,
        broker: &dyn BrokerConnection,
        robot: &RobotAccountPair,
        bot: &ValidatedBot,
        symbol: &str,
        info: &AccountInfo,
        positions: &mut Vec<Position>,
        report: &mut CycleReport,
    ) {
        let account_id = robot.account_id.as_str();
        let cooldown = Duration::from_millis(bot.config.cooldown_ms);
        if self.state.in_cooldown(account_id, symbol, cooldown) {
            debug!(symbol, "symbol in cooldown");
            return;
        }

        let candles = match self.fetch_candles(&robot.broker_handle, symbol).await {
            Ok(candles) => candles,
            Err(e) => {
                debug!(symbol, error = %e, "no candles, abstaining");
                return;
            }
        };
        let Some(mut signal) = self
            .aggregator
            .aggregate_with_policy(&candles, symbol, &bot.config, &bot.policy)
        else {
            return;
        };
        report.signals += 1;
        if let Some(fixed) = bot.config.pip_override(symbol) {
            signal.proposal.apply_fixed_pips(fixed.sl_pips, fixed.tp_pips);
        }
        let direction = signal.direction();
        info!(
            symbol,
            %direction,
            strategy = %signal.proposal.strategy,
            confidence = signal.confidence(),
            confluence = signal.confluence_count,
            "📈 signal accepted"
        );

        if !self.risk.check_hedge(positions, symbol, direction) {
            info!(symbol, %direction, "signal rejected: opposing position open");
            report.rejected += 1;
            return;
        }

        // hold the account's risk state until the order settles
        let mut guard = self.risk.lock(account_id).await;
        let decision = guard.can_open(
            info.balance,
            info.equity,
            positions.len(),
            info.floating_pl(),
            signal.confidence(),
        );
        if !decision.allowed {
            info!(symbol, reason = %decision.reason, "signal rejected by risk gate");
            report.rejected += 1;
            return;
        }

        let volume = self.risk.size_position(
            info.balance,
            signal.proposal.sl_pips,
            symbol,
            signal.confidence(),
            &bot.config,
            signal.lot_multiplier,
        );
        let order = OrderRequest::from_signal(&signal, volume);
        self.order_limiter.acquire().await;
        let outcome = match with_timeout(self.timeout(), "execute_trade", broker.execute_trade(&order)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(symbol, error = %e, "trade execution failed");
                report.failures += 1;
                return;
            }
        };
        drop(guard);

        report.executed += 1;
        self.state.mark_traded(account_id, symbol);
        let proposal = &signal.proposal;
        let entry_price = outcome.open_price.unwrap_or(proposal.entry_price);
        let class = (proposal.sl_pips >= self.lifecycle.config().swing_sl_pips).then_some(TradeClass::Swing);
        self.state.track(
            outcome.position_id.clone(),
            TrackedPosition {
                account_id: account_id.to_string(),
                robot_id: robot.robot_id.clone(),
                link: StrategyPositionLink {
                    strategy: proposal.strategy,
                    entry_sl_pips: proposal.sl_pips,
                    entry_tp_pips: proposal.tp_pips,
                    class,
                },
            },
        );
        let mut opened = Position::new(outcome.position_id.clone(), symbol, direction, volume, entry_price);
        opened.stop_loss = Some(proposal.stop_loss);
        opened.take_profit = Some(proposal.take_profit);
        positions.push(opened);
        info!(
            symbol,
            position_id = %outcome.position_id,
            volume,
            stop_loss = proposal.stop_loss,
            take_profit = proposal.take_profit,
            "✅ trade executed"
        );

        let record = TradeRecord {
            robot_id: robot.robot_id.clone(),
            account_id: account_id.to_string(),
            position_id: outcome.position_id,
            symbol: symbol.to_string(),
            direction,
            volume,
            entry_price,
            stop_loss: proposal.stop_loss,
            take_profit: proposal.take_profit,
            strategy: proposal.strategy,
            agreeing: signal.agreeing.clone(),
            confidence: proposal.confidence,
            lot_multiplier: signal.lot_multiplier,
            rationale: proposal.rationale.clone(),
            opened_at: Utc::now(),
        };
        if let Err(e) = with_timeout(
            self.timeout(),
            "record_trade",
            self.collaborators.repository.record_trade(&record),
        )
        .await
        {
            warn!(position_id = %record.position_id, error = %e, "failed to record trade");
            report.failures += 1;
        }
        if let Err(e) = with_timeout(
            self.timeout(),
            "publish_trade_opened",
            self.collaborators.notifier.publish_trade_opened(&robot.owner_id, &record),
        )
        .await
        {
            debug!(error = %e, "trade notification failed");
        }
    }

    async fn publish_snapshots(&self) -> usize {
        let notifier = &self.collaborators.notifier;
        let timeout = self.timeout();
        let mut published = 0;
        for snapshot in self.state.snapshots() {
            let positions = with_timeout(
                timeout,
                "publish_position_update",
                notifier.publish_position_update(&snapshot.owner_id, &snapshot.positions),
            )
            .await;
            let balance = with_timeout(
                timeout,
                "publish_balance_update",
                notifier.publish_balance_update(&snapshot.owner_id, &snapshot.info),
            )
            .await;
            match positions.and(balance) {
                Ok(()) => published += 1,
                Err(e) => warn!(account_id = %snapshot.account_id, error = %e, "live update failed"),
            }
        }
        published
    }
}
