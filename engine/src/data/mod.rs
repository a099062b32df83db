//! Market data module
//!
//! Candles, instrument metadata and the TTL candle cache.

pub mod cache;
pub mod candle;
pub mod instrument;

pub use cache::*;
pub use candle::*;
pub use instrument::*;
