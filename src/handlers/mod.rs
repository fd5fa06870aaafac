// HTTP request handlers for the login gateway
pub mod auth;
pub mod callback;
pub mod health;

// Re-export the main handler functions
pub use auth::{oauth_sign_in, oauth_sign_out};
pub use callback::oauth_callback;
pub use health::health;
