//! Configured strategy names -> canonical identifiers

use std::collections::HashMap;

use crate::error::{EngineError, Result};
use crate::strategy::StrategyId;

const BUILTIN_ALIASES: &[(&str, StrategyId)] = &[
    ("ema200", StrategyId::EmaPullback),
    ("emapullback", StrategyId::EmaPullback),
    ("ema", StrategyId::EmaPullback),
    ("trendpullback", StrategyId::EmaPullback),
    ("breakretest", StrategyId::BreakRetest),
    ("breakoutretest", StrategyId::BreakRetest),
    ("bos", StrategyId::BreakRetest),
    ("bosretest", StrategyId::BreakRetest),
    ("retest", StrategyId::BreakRetest),
    ("sweep", StrategyId::LiquiditySweep),
    ("stophunt", StrategyId::LiquiditySweep),
    ("liquidity", StrategyId::LiquiditySweep),
    ("structureshift", StrategyId::LiquiditySweep),
    ("london", StrategyId::LondonBreakout),
    ("londonsessionbreakout", StrategyId::LondonBreakout),
    ("lsb", StrategyId::LondonBreakout),
    ("sessionbreakout", StrategyId::LondonBreakout),
    ("ob", StrategyId::OrderBlock),
    ("orderblockrejection", StrategyId::OrderBlock),
    ("vwap", StrategyId::VwapReversion),
    ("vwapreversion", StrategyId::VwapReversion),
    ("meanreversion", StrategyId::VwapReversion),
    ("fib", StrategyId::FibContinuation),
    ("fibonacci", StrategyId::FibContinuation),
    ("fibcontinuation", StrategyId::FibContinuation),
    ("fibretracement", StrategyId::FibContinuation),
    ("divergence", StrategyId::RsiDivergence),
    ("rsi", StrategyId::RsiDivergence),
];

/// Alias table resolved when a robot configuration is validated
#[derive(Debug, Clone)]
pub struct StrategyAliases {
    aliases: HashMap<String, StrategyId>,
}

impl StrategyAliases {
    /// Built-in aliases plus every canonical name
    pub fn new() -> Self {
        let mut aliases: HashMap<String, StrategyId> = BUILTIN_ALIASES
            .iter()
            .map(|(name, id)| (name.to_string(), *id))
            .collect();
        for id in StrategyId::ALL {
            aliases.insert(normalize(id.name()), id);
        }
        Self { aliases }
    }

    /// Register an extra alias
    pub fn insert(&mut self, alias: &str, id: StrategyId) {
        self.aliases.insert(normalize(alias), id);
    }

    /// Resolve a configured name; case, spaces, dashes and underscores are ignored
    pub fn resolve(&self, name: &str) -> Option<StrategyId> {
        self.aliases.get(&normalize(name)).copied()
    }

    /// Resolve every name, failing on the first unknown one
    pub fn resolve_all(&self, names: &[String]) -> Result<Vec<StrategyId>> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            let id = self.resolve(name).ok_or_else(|| {
                EngineError::ConfigurationInvalid(format!("unknown strategy name in alignWith: {name}"))
            })?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }
}

impl Default for StrategyAliases {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_variants() {
        let aliases = StrategyAliases::new();
        assert_eq!(aliases.resolve("EMA200 Pullback"), Some(StrategyId::EmaPullback));
        assert_eq!(aliases.resolve("ema200_pullback"), Some(StrategyId::EmaPullback));
        assert_eq!(aliases.resolve("Stop-Hunt"), Some(StrategyId::LiquiditySweep));
        assert_eq!(aliases.resolve("OB"), Some(StrategyId::OrderBlock));
        assert_eq!(aliases.resolve("Fibonacci Continuation"), Some(StrategyId::FibContinuation));
        assert_eq!(aliases.resolve("martingale"), None);
    }

    #[test]
    fn test_resolve_all_dedupes_and_fails_on_unknown() {
        let aliases = StrategyAliases::new();
        let ids = aliases
            .resolve_all(&["vwap".to_string(), "VWAP mean reversion".to_string()])
            .unwrap();
        assert_eq!(ids, vec![StrategyId::VwapReversion]);
        assert!(aliases.resolve_all(&["grid".to_string()]).is_err());
    }

    #[test]
    fn test_custom_alias() {
        let mut aliases = StrategyAliases::new();
        aliases.insert("Golden Zone", StrategyId::FibContinuation);
        assert_eq!(aliases.resolve("golden-zone"), Some(StrategyId::FibContinuation));
    }
}
