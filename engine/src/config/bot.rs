//! Per-robot trading policy

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::strategy::{StrategyAliases, StrategyId};

/// Proposals that must agree when a robot configures no alignment policy
pub const DEFAULT_MIN_AGREEING: usize = 2;

/// Smallest tradable lot
pub const MIN_LOT: f64 = 0.01;

/// Fixed stop/target distances replacing structure levels for one instrument
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipOverride {
    pub sl_pips: f64,
    pub tp_pips: f64,
}

/// Robot configuration, read-only to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BotConfig {
    /// Symbols the robot may trade
    pub allowed_pairs: Vec<String>,
    /// Display label of the robot's strategy package
    pub strategy: String,
    /// Minimum number of `align_with` strategies that must agree
    pub min_alignments: Option<usize>,
    /// Strategy names required among the agreeing set
    pub align_with: Vec<String>,
    /// No repeat trade on a symbol within this window
    pub cooldown_ms: u64,
    pub max_lot_size: f64,
    /// Carried for reporting; the risk gate enforces no position ceiling
    pub max_positions: Option<usize>,
    /// Symbol -> fixed stop/target distances
    pub pip_overrides: HashMap<String, PipOverride>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            allowed_pairs: Vec::new(),
            strategy: "confluence".to_string(),
            min_alignments: None,
            align_with: Vec::new(),
            cooldown_ms: 15 * 60 * 1000,
            max_lot_size: 1.0,
            max_positions: None,
            pip_overrides: HashMap::new(),
        }
    }
}

impl BotConfig {
    /// Check required fields and resolve the alignment policy
    pub fn validate(&self, aliases: &StrategyAliases) -> Result<AlignmentPolicy> {
        if self.allowed_pairs.iter().all(|p| p.trim().is_empty()) {
            return Err(EngineError::ConfigurationInvalid("allowedPairs is empty".to_string()));
        }
        if !self.max_lot_size.is_finite() || self.max_lot_size < MIN_LOT {
            return Err(EngineError::ConfigurationInvalid(format!(
                "maxLotSize {} below minimum lot {MIN_LOT}",
                self.max_lot_size
            )));
        }
        for (symbol, o) in &self.pip_overrides {
            if !(o.sl_pips > 0.0 && o.tp_pips > 0.0) {
                return Err(EngineError::ConfigurationInvalid(format!(
                    "pip override for {symbol} must be positive"
                )));
            }
        }
        AlignmentPolicy::from_config(self, aliases)
    }

    /// Validate into a [`ValidatedBot`] carrying the resolved policy
    pub fn into_validated(self, aliases: &StrategyAliases) -> Result<ValidatedBot> {
        let policy = self.validate(aliases)?;
        Ok(ValidatedBot { config: self, policy })
    }

    /// Whether the robot may trade `symbol`
    pub fn allows(&self, symbol: &str) -> bool {
        self.allowed_pairs.iter().any(|p| p.trim().eq_ignore_ascii_case(symbol))
    }

    /// Pip override for a symbol, matched case-insensitively
    pub fn pip_override(&self, symbol: &str) -> Option<PipOverride> {
        self.pip_overrides
            .iter()
            .find(|(s, _)| s.eq_ignore_ascii_case(symbol))
            .map(|(_, o)| *o)
    }
}

/// A robot configuration that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBot {
    pub config: BotConfig,
    pub policy: AlignmentPolicy,
}

/// How many proposals must agree before the aggregator emits a signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlignmentPolicy {
    /// Any `min` proposals in the same direction
    MinAgreeing(usize),
    /// At least `min` of the named strategies among the agreeing proposals
    Named { required: Vec<StrategyId>, min: usize },
}

impl AlignmentPolicy {
    pub fn from_config(config: &BotConfig, aliases: &StrategyAliases) -> Result<Self> {
        if config.min_alignments == Some(0) {
            return Err(EngineError::ConfigurationInvalid("minAlignments must be >= 1".to_string()));
        }
        if config.align_with.is_empty() {
            return Ok(Self::MinAgreeing(config.min_alignments.unwrap_or(DEFAULT_MIN_AGREEING)));
        }
        let required = aliases.resolve_all(&config.align_with)?;
        let min = config.min_alignments.unwrap_or(required.len());
        if min > required.len() {
            return Err(EngineError::ConfigurationInvalid(format!(
                "minAlignments {min} exceeds the {} strategies named in alignWith",
                required.len()
            )));
        }
        Ok(Self::Named { required, min })
    }

    /// Minimum count the policy asks for
    pub fn required_minimum(&self) -> usize {
        match self {
            Self::MinAgreeing(min) => *min,
            Self::Named { min, .. } => *min,
        }
    }

    /// Count that is compared against the minimum
    pub fn matched(&self, agreeing: &[StrategyId]) -> usize {
        match self {
            Self::MinAgreeing(_) => agreeing.len(),
            Self::Named { required, .. } => required.iter().filter(|id| agreeing.contains(id)).count(),
        }
    }

    pub fn passes(&self, agreeing: &[StrategyId]) -> bool {
        self.matched(agreeing) >= self.required_minimum()
    }
}

impl Default for AlignmentPolicy {
    fn default() -> Self {
        Self::MinAgreeing(DEFAULT_MIN_AGREEING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BotConfig {
        BotConfig {
            allowed_pairs: vec!["XAUUSD".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = config().validate(&StrategyAliases::new()).unwrap();
        assert_eq!(policy, AlignmentPolicy::MinAgreeing(2));
        assert!(!policy.passes(&[StrategyId::OrderBlock]));
        assert!(policy.passes(&[StrategyId::OrderBlock, StrategyId::EmaPullback]));
    }

    #[test]
    fn test_named_policy() {
        let mut cfg = config();
        cfg.align_with = vec!["ema".into(), "OB".into(), "sweep".into(), "fib".into()];
        cfg.min_alignments = Some(3);
        let policy = cfg.validate(&StrategyAliases::new()).unwrap();
        let two = [StrategyId::EmaPullback, StrategyId::OrderBlock, StrategyId::VwapReversion];
        assert_eq!(policy.matched(&two), 2);
        assert!(!policy.passes(&two));
        let three = [StrategyId::EmaPullback, StrategyId::OrderBlock, StrategyId::LiquiditySweep];
        assert!(policy.passes(&three));
    }

    #[test]
    fn test_invalid_configs() {
        let aliases = StrategyAliases::new();
        let mut cfg = config();
        cfg.allowed_pairs.clear();
        assert!(matches!(cfg.validate(&aliases), Err(EngineError::ConfigurationInvalid(_))));

        let mut cfg = config();
        cfg.max_lot_size = 0.0;
        assert!(cfg.validate(&aliases).is_err());

        let mut cfg = config();
        cfg.align_with = vec!["ema".into()];
        cfg.min_alignments = Some(2);
        assert!(cfg.validate(&aliases).is_err());

        let mut cfg = config();
        cfg.align_with = vec!["unknown thing".into()];
        assert!(cfg.validate(&aliases).is_err());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let cfg: BotConfig = serde_json::from_str(
            r#"{"allowedPairs":["EURUSD"],"maxLotSize":0.5,"minAlignments":2,
                "alignWith":["vwap","rsi"],"pipOverrides":{"EURUSD":{"slPips":20,"tpPips":40}}}"#,
        )
        .unwrap();
        assert_eq!(cfg.min_alignments, Some(2));
        assert_eq!(cfg.pip_override("eurusd").unwrap().tp_pips, 40.0);
        assert_eq!(cfg.cooldown_ms, 15 * 60 * 1000);
        assert_eq!(cfg.strategy, "confluence");
        assert!(cfg.allows("eurusd"));
        assert!(!cfg.allows("GBPUSD"));
    }
}
