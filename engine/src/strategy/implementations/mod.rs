//! Strategy implementations

pub mod break_retest;
pub mod ema_pullback;
pub mod fib_continuation;
pub mod liquidity_sweep;
pub mod london_breakout;
pub mod order_block;
pub mod rsi_divergence;
pub mod vwap_reversion;

pub use break_retest::*;
pub use ema_pullback::*;
pub use fib_continuation::*;
pub use liquidity_sweep::*;
pub use london_breakout::*;
pub use order_block::*;
pub use rsi_divergence::*;
pub use vwap_reversion::*;
