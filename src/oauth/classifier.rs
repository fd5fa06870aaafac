//! Retry classification
//!
//! One pure function shared by the per-hop and pipeline-level retry
//! envelopes. An error is retryable when it looks like a transient transport
//! failure or carries a transient upstream status; everything else (protocol
//! violations, malformed responses, explicit denials) is terminal.

use crate::oauth::AuthError;

/// Message substrings that indicate a transient network-level failure.
/// Matched case-insensitively against the error's rendered message.
const NETWORK_FAILURE_PATTERNS: &[&str] = &[
    "timeout",
    "timed out",
    "etimedout",
    "abort",
    "connection refused",
    "connection reset",
    "econnrefused",
    "econnreset",
    "dns",
    "enotfound",
    "eai_again",
    "tls",
    "certificate",
    "ssl",
    "cors",
    "gateway timeout",
    "socket hang up",
    "network",
];

/// Upstream statuses worth retrying: request timeout, rate limiting, server
/// errors, and the Cloudflare 52x family.
const RETRYABLE_STATUS_CODES: &[u16] = &[408, 429, 500, 502, 503, 504, 520, 521, 522, 523, 524];

/// Decide whether an error is worth retrying.
///
/// Protocol-level outcomes (denied consent, state mismatch, missing code) are
/// never retryable regardless of message content; re-running the pipeline
/// cannot fix them. Provider-specific transient failures fold into the same
/// bucket through their status or message, not a separate category.
#[must_use]
pub fn is_retryable(err: &AuthError) -> bool {
    match err {
        AuthError::AccessDenied { .. }
        | AuthError::ProviderError { .. }
        | AuthError::InvalidState(_)
        | AuthError::MissingCode
        | AuthError::Session(_)
        | AuthError::Configuration(_) => false,
        AuthError::TokenExchange { .. }
        | AuthError::UserInfo { .. }
        | AuthError::Identity(_)
        | AuthError::Network(_) => {
            has_retryable_status(err) || is_network_failure_message(&err.to_string())
        }
    }
}

fn has_retryable_status(err: &AuthError) -> bool {
    err.status()
        .is_some_and(|status| RETRYABLE_STATUS_CODES.contains(&status))
}

/// Check a rendered error message against the transient-failure substrings
#[must_use]
pub fn is_network_failure_message(message: &str) -> bool {
    let lowered = message.to_lowercase();
    NETWORK_FAILURE_PATTERNS
        .iter()
        .any(|pattern| lowered.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange_err(status: Option<u16>, message: &str) -> AuthError {
        AuthError::TokenExchange {
            status,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(&exchange_err(Some(503), "status 503")));
        assert!(is_retryable(&exchange_err(Some(429), "status 429")));
        assert!(is_retryable(&exchange_err(Some(522), "status 522")));
        assert!(!is_retryable(&exchange_err(Some(400), "invalid_grant")));
        assert!(!is_retryable(&exchange_err(Some(401), "unauthorized_client")));
    }

    #[test]
    fn test_retryable_network_messages() {
        assert!(is_retryable(&exchange_err(None, "ETIMEDOUT")));
        assert!(is_retryable(&exchange_err(None, "connection refused by peer")));
        assert!(is_retryable(&exchange_err(None, "dns lookup failed")));
        assert!(is_retryable(&AuthError::Identity(
            "connection reset by peer".to_string()
        )));
        assert!(is_retryable(&AuthError::UserInfo {
            status: None,
            message: "request timed out after 10s".to_string()
        }));
    }

    #[test]
    fn test_terminal_errors_never_retry() {
        assert!(!is_retryable(&AuthError::AccessDenied { description: None }));
        assert!(!is_retryable(&AuthError::InvalidState(
            "state mismatch after timeout".to_string() // message content is irrelevant
        )));
        assert!(!is_retryable(&AuthError::MissingCode));
        assert!(!is_retryable(&exchange_err(None, "missing access_token field")));
        assert!(!is_retryable(&AuthError::Identity(
            "duplicate key violates unique constraint".to_string()
        )));
    }

    #[test]
    fn test_provider_transient_failures_fold_into_same_bucket() {
        // A provider-domain message still classifies through the shared
        // substring set rather than a third category
        assert!(is_retryable(&exchange_err(
            None,
            "request to https://oauth2.googleapis.com/token timed out"
        )));
        assert!(!is_retryable(&exchange_err(
            Some(400),
            "https://oauth2.googleapis.com/token rejected the grant"
        )));
    }
}
