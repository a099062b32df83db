//! Technical indicators module
//!
//! Pure, stateless functions over candle or price sequences. Every function
//! has a documented fallback for short input instead of an error.

pub mod adx;
pub mod atr;
pub mod ema;
pub mod rsi;
pub mod structure;
pub mod vwap;

pub use adx::*;
pub use atr::*;
pub use ema::*;
pub use rsi::*;
pub use structure::*;
pub use vwap::*;
