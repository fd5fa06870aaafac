//! Session cookie management
//!
//! Stateless sessions: the entire session lives in an encrypted cookie, so
//! there is no server-side session table. [`cookie`] owns issuance and
//! deletion of the cookie set and the shared domain derivation rule.

pub mod cookie;

// Re-export commonly used items for convenience
pub use cookie::{
    cookie_domain, CookieFactory, OAUTH_STATE_COOKIE, PROFILE_COOKIE_NAME, ROLE_COOKIE_NAME,
    SESSION_COOKIE_NAME,
};
