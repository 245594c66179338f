//! Request fingerprinting
//!
//! A fingerprint identifies a provider request by the business inputs that
//! determine its answer. Any change to those inputs (profile edit, program
//! update, scoring release) yields a new key, so cached responses go stale
//! by construction and nothing ever has to hunt down entries to invalidate.

use crate::request::RequestType;
use sha2::{Digest, Sha256};

// ASCII unit separator. Cannot appear in identifiers or version strings,
// so adjacent fields can never collide across the boundary.
const FIELD_SEPARATOR: u8 = 0x1f;

/// Compute the cache fingerprint for a provider request.
///
/// The canonical encoding is the request type tag and the three business
/// inputs joined by a unit separator, hashed with SHA-256 and rendered as
/// lowercase hex. For match-set requests, `program_id` names the program
/// catalog snapshot rather than a single program.
#[must_use]
pub fn compute_fingerprint(
    request_type: RequestType,
    org_profile_version: &str,
    program_id: &str,
    scoring_version: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(request_type.as_str().as_bytes());
    hasher.update([FIELD_SEPARATOR]);
    hasher.update(org_profile_version.as_bytes());
    hasher.update([FIELD_SEPARATOR]);
    hasher.update(program_id.as_bytes());
    hasher.update([FIELD_SEPARATOR]);
    hasher.update(scoring_version.as_bytes());

    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
