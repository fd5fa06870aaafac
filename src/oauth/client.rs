//! Provider network client
//!
//! The two external hops of the login pipeline behind a trait seam. The
//! production implementation drives reqwest with a per-attempt timeout on
//! each request, so a hung connection is cancelled rather than outliving its
//! deadline and overlapping with a retry.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use crate::models::{ExternalProfile, TokenSet};
use crate::oauth::AuthError;
use crate::settings::ProviderSettings;

/// Per-attempt deadline for the code-for-token exchange
pub const TOKEN_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(12);

/// Per-attempt deadline for the userinfo fetch
pub const USERINFO_TIMEOUT: Duration = Duration::from_secs(10);

/// The two network hops against the OAuth provider
#[async_trait]
pub trait ProviderClient {
    /// POST the authorization code to the token endpoint
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status, or a response
    /// body without an `access_token`.
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenSet, AuthError>;

    /// GET the userinfo endpoint with the access token as bearer credential
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status, or a malformed
    /// profile body.
    async fn fetch_profile(&self, access_token: &str) -> Result<ExternalProfile, AuthError>;
}

/// reqwest-backed [`ProviderClient`]
#[derive(Debug)]
pub struct HttpProviderClient {
    http: reqwest::Client,
    token_endpoint: String,
    userinfo_endpoint: String,
    client_id: String,
    client_secret: String,
}

impl HttpProviderClient {
    /// Build a client from resolved provider settings
    ///
    /// # Errors
    ///
    /// Returns a configuration error if either client credential cannot be
    /// resolved.
    pub fn from_settings(provider: &ProviderSettings) -> Result<Self, AuthError> {
        let client_id = provider.get_client_id().ok_or_else(|| {
            AuthError::Configuration(format!(
                "client_id not configured for provider {}",
                provider.name
            ))
        })?;
        let client_secret = provider.get_client_secret().ok_or_else(|| {
            AuthError::Configuration(format!(
                "client_secret not configured for provider {}",
                provider.name
            ))
        })?;

        Ok(Self {
            http: reqwest::Client::new(),
            token_endpoint: provider.token_endpoint.clone(),
            userinfo_endpoint: provider.userinfo_endpoint.clone(),
            client_id,
            client_secret,
        })
    }
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenSet, AuthError> {
        let mut params = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("redirect_uri", redirect_uri);
        params.insert("client_id", self.client_id.as_str());
        params.insert("client_secret", self.client_secret.as_str());

        debug!("Exchanging authorization code at {}", self.token_endpoint);
        let response = self
            .http
            .post(&self.token_endpoint)
            .timeout(TOKEN_EXCHANGE_TIMEOUT)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::TokenExchange {
                status: None,
                message: describe_transport_error(&e, TOKEN_EXCHANGE_TIMEOUT),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(AuthError::TokenExchange {
                status: Some(status.as_u16()),
                message: format!("token endpoint returned status {status}: {body}"),
            });
        }

        let tokens: TokenSet = response.json().await.map_err(|e| AuthError::TokenExchange {
            status: None,
            message: format!("failed to parse token response: {e}"),
        })?;

        if tokens.access_token.is_empty() {
            return Err(AuthError::TokenExchange {
                status: None,
                message: "token response is missing access_token".to_string(),
            });
        }

        Ok(tokens)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ExternalProfile, AuthError> {
        debug!("Fetching user profile from {}", self.userinfo_endpoint);
        let response = self
            .http
            .get(&self.userinfo_endpoint)
            .timeout(USERINFO_TIMEOUT)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::UserInfo {
                status: None,
                message: describe_transport_error(&e, USERINFO_TIMEOUT),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(AuthError::UserInfo {
                status: Some(status.as_u16()),
                message: format!("userinfo endpoint returned status {status}: {body}"),
            });
        }

        response.json().await.map_err(|e| AuthError::UserInfo {
            status: None,
            message: format!("failed to parse userinfo response: {e}"),
        })
    }
}

/// Render a reqwest transport error so the retry classifier can recognize it
fn describe_transport_error(err: &reqwest::Error, deadline: Duration) -> String {
    if err.is_timeout() {
        format!("request timed out after {}s", deadline.as_secs())
    } else if err.is_connect() {
        format!("network connection failed: {err}")
    } else {
        format!("network error: {err}")
    }
}

/// Build the provider authorization URL for the sign-in redirect
///
/// # Errors
///
/// Returns a configuration error if the authorization endpoint is not a valid
/// URL or the client id cannot be resolved.
pub fn authorization_url(
    provider: &ProviderSettings,
    redirect_uri: &str,
    state: &str,
) -> Result<String, AuthError> {
    let client_id = provider.get_client_id().ok_or_else(|| {
        AuthError::Configuration(format!(
            "client_id not configured for provider {}",
            provider.name
        ))
    })?;

    let mut auth_url = url::Url::parse(&provider.authorization_endpoint)
        .map_err(|e| AuthError::Configuration(format!("invalid authorization endpoint: {e}")))?;

    let scopes = provider.scopes.join(" ");
    auth_url
        .query_pairs_mut()
        .append_pair("client_id", &client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", &scopes)
        .append_pair("state", state);

    Ok(auth_url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_with_direct_credentials() -> ProviderSettings {
        ProviderSettings {
            client_id: Some("client-1".to_string()),
            client_secret: Some("secret-1".to_string()),
            client_id_env: None,
            client_secret_env: None,
            ..Default::default()
        }
    }

    #[test]
    fn test_from_settings_requires_credentials() {
        let mut provider = provider_with_direct_credentials();
        provider.client_secret = None;

        let err = HttpProviderClient::from_settings(&provider).unwrap_err();
        assert_eq!(err.code(), "auth_failed");
        assert!(err.to_string().contains("client_secret"));
    }

    #[test]
    fn test_authorization_url_carries_state_and_redirect() {
        let provider = provider_with_direct_credentials();
        let url = authorization_url(
            &provider,
            "https://example.com/auth/callback",
            "state-xyz",
        )
        .unwrap();

        assert!(url.starts_with(&provider.authorization_endpoint));
        assert!(url.contains("client_id=client-1"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fexample.com%2Fauth%2Fcallback"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("state=state-xyz"));
        assert!(url.contains("scope=openid+email+profile"));
    }

    #[test]
    fn test_authorization_url_rejects_bad_endpoint() {
        let mut provider = provider_with_direct_credentials();
        provider.authorization_endpoint = "not a url".to_string();

        assert!(authorization_url(&provider, "https://example.com/auth/callback", "s").is_err());
    }
}
