//! Instrument classification and pip arithmetic

use serde::{Deserialize, Serialize};

/// Broad instrument class derived from a broker symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentClass {
    Gold,
    Silver,
    JpyPair,
    Crypto,
    Forex,
}

/// Instrument group used by the strategy weight table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightClass {
    Gold,
    Silver,
    Other,
}

impl InstrumentClass {
    /// Classify a symbol such as "XAUUSD", "EURJPY.m" or "BTCUSD"
    pub fn of(symbol: &str) -> Self {
        let upper = symbol.to_uppercase();
        if upper.starts_with("XAU") || upper.contains("GOLD") {
            Self::Gold
        } else if upper.starts_with("XAG") || upper.contains("SILVER") {
            Self::Silver
        } else if upper.starts_with("BTC") || upper.starts_with("ETH") {
            Self::Crypto
        } else if upper.contains("JPY") {
            Self::JpyPair
        } else {
            Self::Forex
        }
    }

    /// Minimum meaningful price increment
    pub fn pip_size(&self) -> f64 {
        match self {
            Self::Gold => 0.1,
            Self::Silver => 0.01,
            Self::JpyPair => 0.01,
            Self::Crypto => 1.0,
            Self::Forex => 0.0001,
        }
    }

    /// Account-currency value of one pip for a 1.0 lot
    pub fn pip_value_per_lot(&self) -> f64 {
        match self {
            Self::Gold => 10.0,
            Self::Silver => 50.0,
            Self::JpyPair => 9.0,
            Self::Crypto => 1.0,
            Self::Forex => 10.0,
        }
    }

    pub fn weight_class(&self) -> WeightClass {
        match self {
            Self::Gold => WeightClass::Gold,
            Self::Silver => WeightClass::Silver,
            _ => WeightClass::Other,
        }
    }
}

/// Pip size for a symbol
pub fn pip_size(symbol: &str) -> f64 {
    InstrumentClass::of(symbol).pip_size()
}

/// Convert a price distance into pips for a symbol
pub fn price_to_pips(symbol: &str, distance: f64) -> f64 {
    distance.abs() / pip_size(symbol)
}

/// Convert pips into a price distance for a symbol
pub fn pips_to_price(symbol: &str, pips: f64) -> f64 {
    pips * pip_size(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(InstrumentClass::of("XAUUSD"), InstrumentClass::Gold);
        assert_eq!(InstrumentClass::of("xagusd.m"), InstrumentClass::Silver);
        assert_eq!(InstrumentClass::of("USDJPY"), InstrumentClass::JpyPair);
        assert_eq!(InstrumentClass::of("BTCUSD"), InstrumentClass::Crypto);
        assert_eq!(InstrumentClass::of("EURUSD"), InstrumentClass::Forex);
        assert_eq!(InstrumentClass::of("EURUSD").weight_class(), WeightClass::Other);
    }

    #[test]
    fn test_pip_conversion() {
        assert!((price_to_pips("EURUSD", 0.0025) - 25.0).abs() < 1e-9);
        assert!((price_to_pips("XAUUSD", 3.0) - 30.0).abs() < 1e-9);
        assert!((pips_to_price("USDJPY", 15.0) - 0.15).abs() < 1e-12);
    }
}
