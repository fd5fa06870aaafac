//! Mock objects and fake implementations for testing
//!
//! Mock implementations of the login pipeline's collaborator seams: the
//! provider network client, the identity store, and the quota seeder. The
//! provider mock counts calls so retry-bound properties can be asserted
//! exactly.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use anyhow::anyhow;
use async_trait::async_trait;
use uuid::Uuid;

use crate::identity::{Identity, IdentityStore, InMemoryIdentityStore, QuotaSeeder};
use crate::models::{ExternalProfile, TokenSet};
use crate::oauth::{AuthError, ProviderClient};

/// Scripted behavior of the mock token endpoint
#[derive(Clone)]
pub enum TokenResponse {
    Success { access_token: String },
    Timeout,
    Status { status: u16, message: String },
}

impl TokenResponse {
    /// Successful exchange returning the given access token
    #[must_use]
    pub fn ok(access_token: &str) -> Self {
        Self::Success {
            access_token: access_token.to_string(),
        }
    }

    /// Every attempt times out
    #[must_use]
    pub fn always_timeout() -> Self {
        Self::Timeout
    }

    /// Every attempt returns the given upstream status
    #[must_use]
    pub fn status(status: u16, message: &str) -> Self {
        Self::Status {
            status,
            message: message.to_string(),
        }
    }
}

/// Scripted behavior of the mock userinfo endpoint
#[derive(Clone)]
pub enum ProfileResponse {
    Success(ExternalProfile),
    Timeout,
    Status { status: u16, message: String },
}

impl ProfileResponse {
    /// Successful fetch returning a minimal profile
    #[must_use]
    pub fn ok(provider_id: &str, email: &str, name: Option<&str>) -> Self {
        Self::Success(ExternalProfile {
            provider_id: provider_id.to_string(),
            email: email.to_string(),
            display_name: name.map(ToString::to_string),
            avatar_url: None,
            email_verified: Some(true),
        })
    }

    /// Every attempt times out
    #[must_use]
    pub fn always_timeout() -> Self {
        Self::Timeout
    }

    /// Every attempt returns the given upstream status
    #[must_use]
    pub fn status(status: u16, message: &str) -> Self {
        Self::Status {
            status,
            message: message.to_string(),
        }
    }
}

/// Scripted [`ProviderClient`] with per-hop call counters
pub struct MockProviderClient {
    token: TokenResponse,
    profile: ProfileResponse,
    exchange_calls: AtomicUsize,
    profile_calls: AtomicUsize,
}

impl MockProviderClient {
    #[must_use]
    pub fn new(token: TokenResponse, profile: ProfileResponse) -> Self {
        Self {
            token,
            profile,
            exchange_calls: AtomicUsize::new(0),
            profile_calls: AtomicUsize::new(0),
        }
    }

    /// Number of token exchange attempts observed
    #[must_use]
    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    /// Number of profile fetch attempts observed
    #[must_use]
    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderClient for MockProviderClient {
    async fn exchange_code(&self, _code: &str, _redirect_uri: &str) -> Result<TokenSet, AuthError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);

        match &self.token {
            TokenResponse::Success { access_token } => Ok(TokenSet {
                access_token: access_token.clone(),
                token_type: Some("Bearer".to_string()),
                expires_in: Some(3600),
            }),
            TokenResponse::Timeout => Err(AuthError::TokenExchange {
                status: None,
                message: "request timed out after 12s".to_string(),
            }),
            TokenResponse::Status { status, message } => Err(AuthError::TokenExchange {
                status: Some(*status),
                message: format!("token endpoint returned status {status}: {message}"),
            }),
        }
    }

    async fn fetch_profile(&self, _access_token: &str) -> Result<ExternalProfile, AuthError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);

        match &self.profile {
            ProfileResponse::Success(profile) => Ok(profile.clone()),
            ProfileResponse::Timeout => Err(AuthError::UserInfo {
                status: None,
                message: "request timed out after 10s".to_string(),
            }),
            ProfileResponse::Status { status, message } => Err(AuthError::UserInfo {
                status: Some(*status),
                message: format!("userinfo endpoint returned status {status}: {message}"),
            }),
        }
    }
}

/// Identity store whose writes fail a fixed number of times before
/// delegating to an in-memory store
pub struct FlakyIdentityStore {
    inner: InMemoryIdentityStore,
    remaining_failures: AtomicU32,
    message: String,
}

impl FlakyIdentityStore {
    /// Fail the first `failures` upserts with the given error message
    #[must_use]
    pub fn failing_times(failures: u32, message: &str) -> Self {
        Self {
            inner: InMemoryIdentityStore::new(),
            remaining_failures: AtomicU32::new(failures),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl IdentityStore for FlakyIdentityStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Identity>> {
        self.inner.find_by_email(email).await
    }

    async fn upsert(&self, identity: Identity) -> anyhow::Result<Identity> {
        let remaining = self.remaining_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.remaining_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(anyhow!("{}", self.message));
        }
        self.inner.upsert(identity).await
    }
}

/// Quota seeder that counts seed requests and can be scripted to fail
#[derive(Default)]
pub struct CountingQuotaSeeder {
    seeded: AtomicUsize,
    fail: bool,
}

impl CountingQuotaSeeder {
    /// Seeder that rejects every request, for best-effort semantics tests
    #[must_use]
    pub fn failing() -> Self {
        Self {
            seeded: AtomicUsize::new(0),
            fail: true,
        }
    }

    /// Number of seed requests observed
    #[must_use]
    pub fn seeded(&self) -> usize {
        self.seeded.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuotaSeeder for CountingQuotaSeeder {
    async fn seed_default_quota(&self, _identity_id: Uuid, _plan: &str) -> anyhow::Result<()> {
        self.seeded.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("quota subsystem unavailable"));
        }
        Ok(())
    }
}
