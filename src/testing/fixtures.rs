//! Test fixtures providing pre-built test objects
//!
//! This module provides commonly used test data and configurations as static
//! fixtures, eliminating the need to recreate the same test objects in
//! multiple test files.

use crate::models::{ExternalProfile, SessionUser};
use crate::session::CookieFactory;
use crate::settings::AuthgateSettings;
use uuid::Uuid;

use super::constants::{TEST_EMAIL, TEST_PROVIDER_ID, TEST_SESSION_KEY, TEST_USER_NAME};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Development-mode settings with fixed secrets and direct provider
    /// credentials (no environment lookups)
    #[must_use]
    pub fn settings() -> AuthgateSettings {
        let mut settings = AuthgateSettings::default();
        settings.application.site_url = "http://localhost:8080".to_string();
        settings.session.session_secret =
            String::from_utf8_lossy(TEST_SESSION_KEY).into_owned();
        settings.cookies.secure = false;
        settings.provider.client_id = Some("test-client-id".to_string());
        settings.provider.client_secret = Some("test-client-secret".to_string());
        settings.provider.client_id_env = None;
        settings.provider.client_secret_env = None;
        settings
    }

    /// Production-mode settings for a `www.` site, for domain derivation
    /// scenarios
    #[must_use]
    pub fn production_settings() -> AuthgateSettings {
        let mut settings = Self::settings();
        settings.application.site_url = "https://www.example.com".to_string();
        settings.application.environment = "production".to_string();
        settings.cookies.secure = true;
        settings
    }

    /// Cookie factory derived from the standard test settings
    #[must_use]
    pub fn cookie_factory() -> CookieFactory {
        CookieFactory::from_settings(&Self::settings())
    }

    /// A logged-in session payload
    #[must_use]
    pub fn session_user() -> SessionUser {
        SessionUser {
            user_id: Uuid::new_v4(),
            email: TEST_EMAIL.to_string(),
            display_name: Some(TEST_USER_NAME.to_string()),
            role: "user".to_string(),
            avatar_url: Some("https://cdn.example.com/avatar.png".to_string()),
        }
    }

    /// A profile as returned by the provider's userinfo endpoint
    #[must_use]
    pub fn external_profile() -> ExternalProfile {
        ExternalProfile {
            provider_id: TEST_PROVIDER_ID.to_string(),
            email: TEST_EMAIL.to_string(),
            display_name: Some(TEST_USER_NAME.to_string()),
            avatar_url: Some("https://cdn.example.com/avatar.png".to_string()),
            email_verified: Some(true),
        }
    }
}
