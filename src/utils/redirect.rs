//! Post-login redirect target validation
//!
//! The callback's `redirect_to` parameter is attacker-influenced; only safe
//! same-origin relative paths are honored, anything else falls back to the
//! configured default.

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

// Core path traversal pattern - the most common and critical attack
static PATH_TRAVERSAL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.\.").unwrap());

// Protocol injection for absolute URLs that could bypass URL parsing
static PROTOCOL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:[a-z][a-z0-9+.-]*:)|(?:/{2,})").unwrap());

// Critical control characters and suspicious path starters
static SUSPICIOUS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[\x00-\x1F\x7F-\x9F]|%(?:00|0[aAdD]|09|5c|26%23)|^[.@〱〵ゝーｰ]|\\|[\u{200E}\u{200F}\u{2060}-\u{2064}\u{2000}-\u{200A}]").unwrap()
});

const MAX_REDIRECT_LENGTH: usize = 2048;

/// Resolve the post-login redirect target, falling back to `default` when the
/// requested target is absent or unsafe
#[must_use]
pub fn sanitize_redirect_target(requested: Option<&str>, default: &str) -> String {
    match requested {
        Some(target) if is_safe_relative_path(target) => target.to_string(),
        Some(target) => {
            warn!("Rejecting unsafe redirect target: {target}");
            default.to_string()
        }
        None => default.to_string(),
    }
}

/// Check that a redirect target is a plain same-origin relative path
#[must_use]
pub fn is_safe_relative_path(target: &str) -> bool {
    if target.is_empty() || target.len() > MAX_REDIRECT_LENGTH {
        return false;
    }

    // Must be rooted and must not be protocol-relative
    if !target.starts_with('/') || target.starts_with("//") {
        return false;
    }

    if PATH_TRAVERSAL_PATTERN.is_match(target)
        || PROTOCOL_PATTERN.is_match(target)
        || SUSPICIOUS_PATTERN.is_match(target)
    {
        return false;
    }

    // Check decoded variants for encoded traversal
    if let Ok(decoded) = urlencoding::decode(target) {
        if PATH_TRAVERSAL_PATTERN.is_match(&decoded) || decoded.contains('\\') {
            return false;
        }
    }

    true
}
