//! Portfolio management module

pub mod lifecycle;
pub mod position;
pub mod risk;

pub use lifecycle::*;
pub use position::*;
pub use risk::*;
