//! Identity collaborators
//!
//! The login pipeline only ever touches the user store through these narrow
//! traits: an upsert-by-email store and a best-effort quota seeder consulted
//! on first login. The persistent implementations live outside this crate;
//! [`memory`] provides the in-process reference store used by the binary
//! default and the test suite.

pub mod memory;

pub use memory::{InMemoryIdentityStore, LoggingQuotaSeeder};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ExternalProfile;

/// Role assigned to identities created on first login
pub const DEFAULT_ROLE: &str = "user";

/// Plan seeded for identities created on first login
pub const DEFAULT_PLAN: &str = "free";

/// An account record, keyed by unique email. Created on first login, display
/// fields refreshed on every subsequent login, never deleted by this crate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub provider_id: String,
    pub role: String,
    pub plan: String,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

impl Identity {
    /// Build a fresh identity from an external profile, with default role and
    /// plan
    #[must_use]
    pub fn from_profile(profile: &ExternalProfile, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: profile.email.clone(),
            display_name: profile.display_name.clone(),
            avatar_url: profile.avatar_url.clone(),
            provider_id: profile.provider_id.clone(),
            role: DEFAULT_ROLE.to_string(),
            plan: DEFAULT_PLAN.to_string(),
            created_at: now,
            last_login_at: now,
        }
    }

    /// Refresh the mutable display fields from a new login
    pub fn apply_login(&mut self, profile: &ExternalProfile, now: DateTime<Utc>) {
        self.display_name = profile.display_name.clone();
        self.avatar_url = profile.avatar_url.clone();
        self.provider_id = profile.provider_id.clone();
        self.last_login_at = now;
    }
}

/// Upsert-by-email store for identities
#[async_trait]
pub trait IdentityStore {
    /// Look up an identity by its unique email
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store is unreachable.
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Identity>>;

    /// Insert-or-update keyed by email. Repeated execution with the same
    /// email must never create a duplicate.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store rejects the write.
    async fn upsert(&self, identity: Identity) -> anyhow::Result<Identity>;
}

/// Seeds the default quota for a newly created identity. Best-effort: the
/// caller logs failures and never fails the login over them.
#[async_trait]
pub trait QuotaSeeder {
    /// # Errors
    ///
    /// Returns an error if the quota subsystem rejects the seed; callers
    /// treat this as non-fatal.
    async fn seed_default_quota(&self, identity_id: Uuid, plan: &str) -> anyhow::Result<()>;
}
