//! Login pipeline error taxonomy
//!
//! Every failure the callback can hit collapses into [`AuthError`]. The
//! variants carry the optional upstream HTTP status the retry classifier
//! needs, and each maps onto a stable machine-readable code surfaced in the
//! login redirect.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The user declined consent at the provider. A normal outcome, not a
    /// failure to retry.
    #[error("authorization denied by user")]
    AccessDenied { description: Option<String> },

    /// The provider redirected back with an error other than `access_denied`
    #[error("provider returned error '{error}': {description}")]
    ProviderError { error: String, description: String },

    /// Missing or mismatched CSRF state. Never retried; re-running cannot fix
    /// a state mismatch.
    #[error("invalid OAuth state: {0}")]
    InvalidState(String),

    /// The redirect carried no authorization code
    #[error("missing authorization code in callback")]
    MissingCode,

    /// Code-for-token exchange failed (transport error, non-2xx status, or
    /// malformed body)
    #[error("token exchange failed: {message}")]
    TokenExchange {
        status: Option<u16>,
        message: String,
    },

    /// Userinfo fetch failed
    #[error("user info request failed: {message}")]
    UserInfo {
        status: Option<u16>,
        message: String,
    },

    /// Identity store lookup or upsert failed
    #[error("identity store failure: {0}")]
    Identity(String),

    /// Outbound request could not even be constructed or dispatched
    #[error("network failure: {0}")]
    Network(String),

    /// Session cookie construction failed
    #[error("session issuance failed: {0}")]
    Session(String),

    /// Provider credentials or endpoints are not resolvable
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AuthError {
    /// The upstream HTTP status attached to this error, when one exists
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::TokenExchange { status, .. } | Self::UserInfo { status, .. } => *status,
            _ => None,
        }
    }

    /// Stable machine-readable code for the login redirect
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AccessDenied { .. } => "access_denied",
            Self::InvalidState(_) => "invalid_state",
            Self::TokenExchange { .. } => "token_exchange_failed",
            Self::UserInfo { .. } => "user_info_failed",
            Self::Identity(_) => "database_error",
            Self::Network(_) => "network_error",
            Self::ProviderError { .. }
            | Self::MissingCode
            | Self::Session(_)
            | Self::Configuration(_) => "auth_failed",
        }
    }

    /// Human-readable message for the login redirect
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::AccessDenied { description } => description
                .clone()
                .unwrap_or_else(|| "Sign-in was cancelled".to_string()),
            Self::ProviderError { description, .. } => description.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(
            AuthError::AccessDenied { description: None }.code(),
            "access_denied"
        );
        assert_eq!(
            AuthError::InvalidState("missing".to_string()).code(),
            "invalid_state"
        );
        assert_eq!(
            AuthError::TokenExchange {
                status: Some(503),
                message: "status 503".to_string()
            }
            .code(),
            "token_exchange_failed"
        );
        assert_eq!(
            AuthError::UserInfo {
                status: None,
                message: "timed out".to_string()
            }
            .code(),
            "user_info_failed"
        );
        assert_eq!(
            AuthError::Identity("connection refused".to_string()).code(),
            "database_error"
        );
        assert_eq!(
            AuthError::Network("socket hang up".to_string()).code(),
            "network_error"
        );
        assert_eq!(AuthError::MissingCode.code(), "auth_failed");
    }

    #[test]
    fn test_status_only_present_on_upstream_errors() {
        let err = AuthError::TokenExchange {
            status: Some(400),
            message: "invalid_grant".to_string(),
        };
        assert_eq!(err.status(), Some(400));
        assert_eq!(AuthError::MissingCode.status(), None);
    }
}
