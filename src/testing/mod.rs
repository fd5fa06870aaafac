//! Unified testing utilities for Authgate
//!
//! This module consolidates test helpers, fixtures, and mock collaborators
//! into a single location so unit tests and the integration suite share the
//! same building blocks.
//!
//! ## Organization
//!
//! - [`fixtures`] - Pre-built test data (settings, session users, profiles)
//! - [`requests`] - HTTP request builders for testing handlers
//! - [`mock`] - Mock provider client and identity collaborators

pub mod fixtures;
pub mod mock;
pub mod requests;

// Re-export commonly used items for convenience
pub use fixtures::TestFixtures;
pub use requests::RequestBuilder;

/// Common test constants
pub mod constants {
    /// Default test email address
    pub const TEST_EMAIL: &str = "test@example.com";

    /// Default test user name
    pub const TEST_USER_NAME: &str = "Test User";

    /// Default test provider ID
    pub const TEST_PROVIDER_ID: &str = "123456789";

    /// Session encryption key material (256 bits)
    pub const TEST_SESSION_KEY: &[u8] = b"test_key_32_bytes_long_for_test_";
}
