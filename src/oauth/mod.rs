//! OAuth authorization-code login flow
//!
//! Everything between the provider redirect and a logged-in identity: the
//! error taxonomy, the retry classifier, the bounded retry envelopes, the
//! provider network client, and the login service that strings them
//! together. The HTTP-facing half of the flow lives in `handlers`.

pub mod classifier;
pub mod client;
pub mod error;
pub mod retry;
pub mod service;

pub use classifier::is_retryable;
pub use client::{
    authorization_url, HttpProviderClient, ProviderClient, TOKEN_EXCHANGE_TIMEOUT,
    USERINFO_TIMEOUT,
};
pub use error::AuthError;
pub use retry::{Backoff, RetryPolicy, HOP_MAX_ATTEMPTS, PIPELINE_MAX_ATTEMPTS};
pub use service::LoginService;
