//! Canned responses served when the provider is unavailable
//!
//! Fallback text is a product surface, not an error page: callers always
//! get a well-formed response body even during an outage. Fallbacks are
//! never cached, so the next request after recovery gets live content.

use crate::request::RequestType;

/// Degraded-mode response body for a request type
#[must_use]
pub fn fallback_text(request_type: RequestType) -> String {
    match request_type {
        RequestType::MatchSet => concat!(
            "AI-powered match summaries are temporarily unavailable. ",
            "Your saved program matches are still shown below, and fresh ",
            "AI summaries will return shortly."
        )
        .to_string(),
        RequestType::Explanation => concat!(
            "The AI explanation for this match is temporarily unavailable. ",
            "Please check back in a few minutes."
        )
        .to_string(),
    }
}
