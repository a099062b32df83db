//! Per-instrument-class strategy weights

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::data::WeightClass;
use crate::strategy::StrategyId;

/// Weight multipliers for one instrument class
pub type WeightRow = HashMap<StrategyId, f64>;

/// Strategy weight table keyed by instrument class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyWeights {
    #[serde(default)]
    pub gold: WeightRow,
    #[serde(default)]
    pub silver: WeightRow,
    #[serde(default)]
    pub other: WeightRow,
}

const DEFAULT_WEIGHTS: [(StrategyId, f64, f64, f64); 8] = [
    (StrategyId::EmaPullback, 1.20, 1.10, 1.00),
    (StrategyId::BreakRetest, 1.10, 1.00, 1.05),
    (StrategyId::LiquiditySweep, 1.30, 1.20, 1.10),
    (StrategyId::LondonBreakout, 1.00, 0.90, 1.10),
    (StrategyId::OrderBlock, 1.25, 1.15, 1.05),
    (StrategyId::VwapReversion, 0.90, 1.00, 0.95),
    (StrategyId::FibContinuation, 1.15, 1.10, 1.00),
    (StrategyId::RsiDivergence, 1.00, 1.05, 0.90),
];

impl Default for StrategyWeights {
    fn default() -> Self {
        let mut weights = Self::uniform();
        for (id, gold, silver, other) in DEFAULT_WEIGHTS {
            weights.gold.insert(id, gold);
            weights.silver.insert(id, silver);
            weights.other.insert(id, other);
        }
        weights
    }
}

impl StrategyWeights {
    /// Empty table, every strategy weighs 1.0
    pub fn uniform() -> Self {
        Self { gold: HashMap::new(), silver: HashMap::new(), other: HashMap::new() }
    }

    pub fn weight(&self, class: WeightClass, strategy: StrategyId) -> f64 {
        let row = match class {
            WeightClass::Gold => &self.gold,
            WeightClass::Silver => &self.silver,
            WeightClass::Other => &self.other,
        };
        row.get(&strategy).copied().filter(|w| w.is_finite() && *w >= 0.0).unwrap_or(1.0)
    }

    /// Overlay entries from `other` onto this table
    pub fn merge(&mut self, other: StrategyWeights) {
        self.gold.extend(other.gold);
        self.silver.extend(other.silver);
        self.other.extend(other.other);
    }
}
