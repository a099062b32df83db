//! Engine error taxonomy
//!
//! Risk-limit refusals are not errors; they are reported through
//! [`crate::portfolio::RiskDecision`].

use thiserror::Error;

/// Errors surfaced by the engine and its collaborators
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    /// Candles or account data missing, or not enough history
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// Upstream refused the request because of rate limiting
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Order rejected or stop modification failed
    #[error("broker execution failed: {0}")]
    BrokerExecution(String),

    /// Robot configuration missing required fields or referencing unknown names
    #[error("invalid configuration: {0}")]
    ConfigurationInvalid(String),

    /// Persistence collaborator failure
    #[error("repository error: {0}")]
    Repository(String),

    /// A broker/API call exceeded its request timeout
    #[error("timed out: {0}")]
    Timeout(String),

    /// Broker session could not be established
    #[error("broker not connected: {0}")]
    NotConnected(String),
}

impl EngineError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }

    /// Whether retrying on the next cycle can reasonably succeed
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::ConfigurationInvalid(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(EngineError::RateLimited("429".into()).is_rate_limited());
        assert!(!EngineError::DataUnavailable("x".into()).is_rate_limited());
        assert!(!EngineError::ConfigurationInvalid("x".into()).is_recoverable());
        assert!(EngineError::Timeout("x".into()).is_recoverable());
    }

    #[test]
    fn test_display() {
        let err = EngineError::BrokerExecution("requote".into());
        assert_eq!(err.to_string(), "broker execution failed: requote");
    }
}
