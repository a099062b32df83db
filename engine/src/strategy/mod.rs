//! Strategy engine module
//!
//! Strategy definitions, proposal construction and confluence aggregation.

pub mod aggregator;
pub mod alias;
pub mod base;
pub mod implementations;
pub mod registry;
pub mod signal;

pub use aggregator::*;
pub use alias::*;
pub use base::*;
pub use implementations::*;
pub use registry::*;
pub use signal::*;
