//! Gateway error types
//!
//! Only hard failures surface here. Provider-side trouble (open circuit,
//! timeouts, transport errors) is deliberately absent: the orchestrator
//! degrades those paths to fallback content instead of returning an error.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors returned to gateway callers
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Caller has exhausted its quota for the current period
    #[error("rate limit exceeded: {remaining} calls remaining, resets at {reset_at}")]
    RateLimitExceeded {
        /// Calls remaining in the current period (zero when denied)
        remaining: u64,
        /// Start of the next period, when the counter resets
        reset_at: DateTime<Utc>,
    },

    /// The request itself is invalid. This is a caller bug, never a
    /// transient condition; retrying the same request cannot succeed.
    #[error("malformed request: {message}")]
    MalformedRequest {
        /// What was wrong with the request
        message: String,
    },

    /// A cache or ledger backend failed
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration could not be loaded or validated
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_rate_limit_display_includes_reset() {
        let err = GatewayError::RateLimitExceeded {
            remaining: 0,
            reset_at: Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap(),
        };
        let message = err.to_string();
        assert!(message.starts_with("rate limit exceeded"));
        assert!(message.contains("2026-04-01"));
    }

    #[test]
    fn test_malformed_request_display() {
        let err = GatewayError::MalformedRequest {
            message: "fingerprint is empty".to_string(),
        };
        assert_eq!(err.to_string(), "malformed request: fingerprint is empty");
    }

    #[test]
    fn test_storage_display() {
        let err = GatewayError::Storage("Redis GET failed: connection refused".to_string());
        assert!(err.to_string().starts_with("storage error"));
    }
}
