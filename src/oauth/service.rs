//! Login service
//!
//! Drives steps 3–5 of the callback pipeline — token exchange, profile
//! fetch, identity upsert — under the pipeline-level retry envelope, with
//! each network hop additionally wrapped in its own per-hop envelope. The
//! service knows nothing about HTTP responses or cookies; the callback
//! handler owns those.

use std::sync::Arc;

use log::{info, warn};

use crate::identity::{Identity, IdentityStore, QuotaSeeder, DEFAULT_PLAN};
use crate::models::ExternalProfile;
use crate::oauth::client::{HttpProviderClient, ProviderClient};
use crate::oauth::retry::RetryPolicy;
use crate::oauth::AuthError;
use crate::settings::AuthgateSettings;

/// Orchestrates the exchange half of the login pipeline
#[derive(Clone)]
pub struct LoginService {
    provider: Arc<dyn ProviderClient + Send + Sync>,
    identities: Arc<dyn IdentityStore + Send + Sync>,
    quotas: Arc<dyn QuotaSeeder + Send + Sync>,
    redirect_uri: String,
}

impl LoginService {
    /// Assemble a service from its collaborator seams
    #[must_use]
    pub fn new(
        provider: Arc<dyn ProviderClient + Send + Sync>,
        identities: Arc<dyn IdentityStore + Send + Sync>,
        quotas: Arc<dyn QuotaSeeder + Send + Sync>,
        redirect_uri: String,
    ) -> Self {
        Self {
            provider,
            identities,
            quotas,
            redirect_uri,
        }
    }

    /// Build the production service against the configured provider
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the provider credentials cannot be
    /// resolved.
    pub fn from_settings(
        settings: &AuthgateSettings,
        identities: Arc<dyn IdentityStore + Send + Sync>,
        quotas: Arc<dyn QuotaSeeder + Send + Sync>,
    ) -> Result<Self, AuthError> {
        let client = HttpProviderClient::from_settings(&settings.provider)?;
        Ok(Self::new(
            Arc::new(client),
            identities,
            quotas,
            settings.callback_url(),
        ))
    }

    /// Exchange an authorization code for a logged-in identity.
    ///
    /// CSRF state has already been validated and consumed by the caller, so a
    /// pipeline-level retry restarts from the token exchange rather than
    /// re-validating state. The authorization code is single-use at the
    /// provider; once it has been spent, a repeated exchange comes back
    /// non-2xx and classifies terminal.
    ///
    /// # Errors
    ///
    /// Returns the classified error once both retry envelopes are exhausted
    /// or a terminal failure occurs.
    pub async fn complete_login(&self, code: &str) -> Result<Identity, AuthError> {
        RetryPolicy::pipeline()
            .run("login pipeline", || self.run_exchange(code))
            .await
    }

    /// One pipeline attempt: exchange, fetch, upsert
    async fn run_exchange(&self, code: &str) -> Result<Identity, AuthError> {
        let tokens = RetryPolicy::per_hop()
            .run("token exchange", || {
                self.provider.exchange_code(code, &self.redirect_uri)
            })
            .await?;

        let profile = RetryPolicy::per_hop()
            .run("profile fetch", || {
                self.provider.fetch_profile(&tokens.access_token)
            })
            .await?;

        self.upsert_identity(&profile).await
    }

    /// Insert-or-update the identity for this profile, keyed on email
    async fn upsert_identity(&self, profile: &ExternalProfile) -> Result<Identity, AuthError> {
        let now = chrono::Utc::now();

        let existing = self
            .identities
            .find_by_email(&profile.email)
            .await
            .map_err(|e| AuthError::Identity(e.to_string()))?;

        match existing {
            Some(mut identity) => {
                identity.apply_login(profile, now);
                let identity = self
                    .identities
                    .upsert(identity)
                    .await
                    .map_err(|e| AuthError::Identity(e.to_string()))?;
                info!("Returning user logged in: {}", identity.email);
                Ok(identity)
            }
            None => {
                let identity = self
                    .identities
                    .upsert(Identity::from_profile(profile, now))
                    .await
                    .map_err(|e| AuthError::Identity(e.to_string()))?;
                info!("First login, identity created: {}", identity.email);

                // Best-effort: a quota seeding failure must not fail the login
                if let Err(e) = self
                    .quotas
                    .seed_default_quota(identity.id, DEFAULT_PLAN)
                    .await
                {
                    warn!("Failed to seed default quota for {}: {e}", identity.email);
                }

                Ok(identity)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::InMemoryIdentityStore;
    use crate::testing::mock::{
        CountingQuotaSeeder, FlakyIdentityStore, MockProviderClient, ProfileResponse,
        TokenResponse,
    };

    fn service_with(
        provider: MockProviderClient,
        identities: Arc<dyn IdentityStore + Send + Sync>,
        quotas: Arc<CountingQuotaSeeder>,
    ) -> (Arc<MockProviderClient>, LoginService) {
        let provider = Arc::new(provider);
        let service = LoginService::new(
            Arc::clone(&provider) as Arc<dyn ProviderClient + Send + Sync>,
            identities,
            quotas,
            "https://example.com/auth/callback".to_string(),
        );
        (provider, service)
    }

    #[tokio::test]
    async fn test_first_login_creates_identity_and_seeds_quota() {
        let store = Arc::new(InMemoryIdentityStore::new());
        let quotas = Arc::new(CountingQuotaSeeder::default());
        let (provider, service) = service_with(
            MockProviderClient::new(
                TokenResponse::ok("t1"),
                ProfileResponse::ok("g1", "a@b.com", Some("A")),
            ),
            Arc::clone(&store) as Arc<dyn IdentityStore + Send + Sync>,
            Arc::clone(&quotas),
        );

        let identity = service.complete_login("abc").await.unwrap();

        assert_eq!(identity.email, "a@b.com");
        assert_eq!(identity.role, "user");
        assert_eq!(identity.plan, "free");
        assert_eq!(store.len().await, 1);
        assert_eq!(quotas.seeded(), 1);
        assert_eq!(provider.exchange_calls(), 1);
        assert_eq!(provider.profile_calls(), 1);
    }

    #[tokio::test]
    async fn test_second_login_updates_without_duplicating() {
        let store = Arc::new(InMemoryIdentityStore::new());
        let quotas = Arc::new(CountingQuotaSeeder::default());
        let (_, service) = service_with(
            MockProviderClient::new(
                TokenResponse::ok("t1"),
                ProfileResponse::ok("g1", "a@b.com", Some("A")),
            ),
            Arc::clone(&store) as Arc<dyn IdentityStore + Send + Sync>,
            Arc::clone(&quotas),
        );

        let first = service.complete_login("abc").await.unwrap();
        let second = service.complete_login("def").await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(first.id, second.id);
        assert!(second.last_login_at >= first.last_login_at);
        // Quota is seeded once, on first login only
        assert_eq!(quotas.seeded(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_exhausts_inner_and_outer_envelopes() {
        let store = Arc::new(InMemoryIdentityStore::new());
        let quotas = Arc::new(CountingQuotaSeeder::default());
        let (provider, service) = service_with(
            MockProviderClient::new(
                TokenResponse::always_timeout(),
                ProfileResponse::ok("g1", "a@b.com", Some("A")),
            ),
            Arc::clone(&store) as Arc<dyn IdentityStore + Send + Sync>,
            quotas,
        );

        let err = service.complete_login("abc").await.unwrap_err();

        assert_eq!(err.code(), "token_exchange_failed");
        // 3 inner attempts per pipeline attempt, 3 pipeline attempts
        assert_eq!(provider.exchange_calls(), 9);
        assert_eq!(provider.profile_calls(), 0);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_terminal_exchange_error_is_not_retried() {
        let store = Arc::new(InMemoryIdentityStore::new());
        let quotas = Arc::new(CountingQuotaSeeder::default());
        let (provider, service) = service_with(
            MockProviderClient::new(
                TokenResponse::status(400, "invalid_grant"),
                ProfileResponse::ok("g1", "a@b.com", Some("A")),
            ),
            Arc::clone(&store) as Arc<dyn IdentityStore + Send + Sync>,
            quotas,
        );

        let err = service.complete_login("abc").await.unwrap_err();

        assert_eq!(err.code(), "token_exchange_failed");
        assert_eq!(provider.exchange_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_store_failure_restarts_pipeline() {
        // The store write fails once with a connection error after the hops
        // succeeded; the pipeline envelope re-runs from the token exchange.
        let store = Arc::new(FlakyIdentityStore::failing_times(1, "connection refused"));
        let quotas = Arc::new(CountingQuotaSeeder::default());
        let (provider, service) = service_with(
            MockProviderClient::new(
                TokenResponse::ok("t1"),
                ProfileResponse::ok("g1", "a@b.com", Some("A")),
            ),
            Arc::clone(&store) as Arc<dyn IdentityStore + Send + Sync>,
            quotas,
        );

        let identity = service.complete_login("abc").await.unwrap();

        assert_eq!(identity.email, "a@b.com");
        assert_eq!(provider.exchange_calls(), 2);
        assert_eq!(provider.profile_calls(), 2);
    }
}
