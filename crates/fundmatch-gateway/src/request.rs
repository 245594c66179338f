//! Request and response descriptors
//!
//! The shapes callers hand to [`crate::gateway::Gateway::invoke`] and get
//! back from it.

use crate::error::{GatewayError, Result};
use crate::ratelimit::Tier;
use fundmatch_llm::TokenUsage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Categories of provider work the platform performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    /// Ranked set of funding program matches for an organization
    MatchSet,
    /// Narrative explanation of why one program matches
    Explanation,
}

impl RequestType {
    /// Stable string form, used in storage and endpoint keys
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::MatchSet => "match_set",
            RequestType::Explanation => "explanation",
        }
    }

    /// Parse the stable string form
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "match_set" => Some(RequestType::MatchSet),
            "explanation" => Some(RequestType::Explanation),
            _ => None,
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A unit of work submitted to the gateway
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    /// Organization (tenant) making the call
    pub caller_id: String,
    /// Subscription tier, drives the quota limit
    pub tier: Tier,
    /// What kind of answer is being requested
    pub request_type: RequestType,
    /// Cache key derived from the business inputs, see
    /// [`crate::fingerprint::compute_fingerprint`]
    pub fingerprint: String,
    /// Fully rendered prompt for the provider
    pub prompt: String,
    /// Optional cap on generated tokens
    pub max_tokens: Option<u32>,
}

impl GatewayRequest {
    /// Create a request
    pub fn new(
        caller_id: impl Into<String>,
        tier: Tier,
        request_type: RequestType,
        fingerprint: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            caller_id: caller_id.into(),
            tier,
            request_type,
            fingerprint: fingerprint.into(),
            prompt: prompt.into(),
            max_tokens: None,
        }
    }

    /// Cap generated tokens
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Reject caller bugs before any quota is spent
    pub(crate) fn validate(&self) -> Result<()> {
        if self.caller_id.trim().is_empty() {
            return Err(GatewayError::MalformedRequest {
                message: "caller_id is empty".to_string(),
            });
        }
        if self.fingerprint.trim().is_empty() {
            return Err(GatewayError::MalformedRequest {
                message: "fingerprint is empty".to_string(),
            });
        }
        if self.prompt.trim().is_empty() {
            return Err(GatewayError::MalformedRequest {
                message: "prompt is empty".to_string(),
            });
        }
        Ok(())
    }
}

/// What the gateway hands back for a successful invoke.
///
/// "Successful" includes degraded outcomes: a cache hit and a fallback both
/// produce a response, distinguished only by the flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayResponse {
    /// Answer text: provider output, cached payload, or fallback copy
    pub content: String,
    /// Served from the response cache without contacting the provider
    pub served_from_cache: bool,
    /// Generic degraded content substituted for an unavailable provider
    pub served_as_fallback: bool,
    /// Token usage, present only for live provider calls
    pub usage: Option<TokenUsage>,
}

impl GatewayResponse {
    pub(crate) fn live(content: String, usage: Option<TokenUsage>) -> Self {
        Self {
            content,
            served_from_cache: false,
            served_as_fallback: false,
            usage,
        }
    }

    pub(crate) fn cached(content: String) -> Self {
        Self {
            content,
            served_from_cache: true,
            served_as_fallback: false,
            usage: None,
        }
    }

    pub(crate) fn fallback(content: String) -> Self {
        Self {
            content,
            served_from_cache: false,
            served_as_fallback: true,
            usage: None,
        }
    }
}
