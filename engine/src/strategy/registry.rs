//! Set of strategies the aggregator runs

use crate::strategy::implementations::*;
use crate::strategy::{Strategy, StrategyId};

/// Ordered strategy set; order breaks ties between equal weighted scores
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn Strategy>>,
}

impl StrategyRegistry {
    /// Registry without strategies
    pub fn empty() -> Self {
        Self { strategies: Vec::new() }
    }

    /// All eight built-in strategies
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry
            .register(EmaPullbackStrategy)
            .register(BreakRetestStrategy)
            .register(LiquiditySweepStrategy)
            .register(LondonBreakoutStrategy)
            .register(OrderBlockStrategy)
            .register(VwapReversionStrategy)
            .register(FibContinuationStrategy)
            .register(RsiDivergenceStrategy);
        registry
    }

    pub fn register(&mut self, strategy: impl Strategy + 'static) -> &mut Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Strategy> {
        self.strategies.iter().map(|s| s.as_ref())
    }

    pub fn ids(&self) -> Vec<StrategyId> {
        self.iter().map(|s| s.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_strategy() {
        let registry = StrategyRegistry::default();
        assert_eq!(registry.ids(), StrategyId::ALL.to_vec());
        assert!(StrategyRegistry::empty().is_empty());
    }
}
