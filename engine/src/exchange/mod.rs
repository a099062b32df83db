//! Broker and market data integration
//!
//! The engine talks to brokers only through these traits; concrete
//! integrations live in the host process.

pub mod broker;
pub mod order;

pub use broker::*;
pub use order::*;

use std::future::Future;
use std::time::Duration;

use crate::error::{EngineError, Result};

/// Run a broker call under a request timeout
pub async fn with_timeout<T>(
    timeout: Duration,
    operation: &str,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(EngineError::Timeout(format!("{operation} after {}s", timeout.as_secs()))),
    }
}
