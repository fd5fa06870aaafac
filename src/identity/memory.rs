//! In-memory identity store
//!
//! Reference implementation of the identity collaborators, used by the binary
//! when no external store is wired up and by the test suite.

use std::collections::HashMap;

use async_trait::async_trait;
use log::info;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Identity, IdentityStore, QuotaSeeder};

/// Identity store backed by a process-local map keyed on email
#[derive(Default)]
pub struct InMemoryIdentityStore {
    identities: RwLock<HashMap<String, Identity>>,
}

impl InMemoryIdentityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored identities
    pub async fn len(&self) -> usize {
        self.identities.read().await.len()
    }

    /// Whether the store holds no identities
    pub async fn is_empty(&self) -> bool {
        self.identities.read().await.is_empty()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Identity>> {
        Ok(self.identities.read().await.get(email).cloned())
    }

    async fn upsert(&self, identity: Identity) -> anyhow::Result<Identity> {
        let mut identities = self.identities.write().await;
        identities.insert(identity.email.clone(), identity.clone());
        Ok(identity)
    }
}

/// Quota seeder that only records the seed request in the log
#[derive(Default, Clone, Copy)]
pub struct LoggingQuotaSeeder;

#[async_trait]
impl QuotaSeeder for LoggingQuotaSeeder {
    async fn seed_default_quota(&self, identity_id: Uuid, plan: &str) -> anyhow::Result<()> {
        info!("Seeding default quota for identity {identity_id} on plan '{plan}'");
        Ok(())
    }
}
