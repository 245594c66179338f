//! Error types for provider communication

use thiserror::Error;

/// Errors returned by provider clients
#[derive(Debug, Error)]
pub enum Error {
    /// Provider is not configured (missing API key, etc.)
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// Provider returned a non-success status
    #[error("api error: {0}")]
    Api(String),

    /// Provider rejected the call for rate limiting
    #[error("rate limited by provider")]
    RateLimit,

    /// Provider response could not be parsed
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Network-level failure before a response arrived
    #[error("network error: {0}")]
    Network(String),

    /// Request exceeded the client timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),
}

/// Result type for provider operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Api("500 Internal Server Error".to_string());
        assert_eq!(err.to_string(), "api error: 500 Internal Server Error");

        let err = Error::Timeout(30000);
        assert_eq!(err.to_string(), "timeout after 30000ms");

        let err = Error::RateLimit;
        assert_eq!(err.to_string(), "rate limited by provider");
    }

    #[test]
    fn test_not_configured_display() {
        let err = Error::NotConfigured("OPENAI_API_KEY not set".to_string());
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }
}
