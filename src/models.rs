use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Query parameters delivered by the provider's redirect to `/auth/callback`.
/// Deserialized once per request and never mutated.
#[derive(Deserialize, Debug)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
    pub redirect_to: Option<String>,
}

/// CSRF state round-tripped through the provider, stored encrypted in a
/// short-lived cookie between sign-in and callback
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OAuthState {
    pub state: String,
    pub redirect_to: Option<String>,
}

/// Result of the code-for-token exchange. Lives only for the duration of the
/// callback invocation.
#[derive(Deserialize, Debug, Clone)]
pub struct TokenSet {
    pub access_token: String,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
}

/// Profile returned by the provider's userinfo endpoint
#[derive(Deserialize, Debug, Clone)]
pub struct ExternalProfile {
    #[serde(rename = "id")]
    pub provider_id: String,
    pub email: String,
    #[serde(rename = "name")]
    pub display_name: Option<String>,
    #[serde(rename = "picture")]
    pub avatar_url: Option<String>,
    #[serde(rename = "verified_email")]
    pub email_verified: Option<bool>,
}

/// Payload of the `authgate_session` cookie. Encrypted and authenticated with
/// AES-256-GCM before it leaves the server; the browser only ever sees an
/// opaque string.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub role: String,
    pub avatar_url: Option<String>,
}

/// Display subset of the session exposed to client-side scripts through the
/// non-httpOnly `authgate_profile` cookie
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DisplayProfile {
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<&SessionUser> for DisplayProfile {
    fn from(user: &SessionUser) -> Self {
        Self {
            email: user.email.clone(),
            name: user.display_name.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_profile_deserializes_provider_field_names() {
        let json = r#"{
            "id": "g-123",
            "email": "a@b.com",
            "name": "A B",
            "picture": "https://lh3.example/p.png",
            "verified_email": true
        }"#;

        let profile: ExternalProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.provider_id, "g-123");
        assert_eq!(profile.email, "a@b.com");
        assert_eq!(profile.display_name.as_deref(), Some("A B"));
        assert_eq!(profile.email_verified, Some(true));
    }

    #[test]
    fn test_external_profile_tolerates_missing_optionals() {
        let json = r#"{"id": "g-123", "email": "a@b.com"}"#;
        let profile: ExternalProfile = serde_json::from_str(json).unwrap();
        assert!(profile.display_name.is_none());
        assert!(profile.avatar_url.is_none());
        assert!(profile.email_verified.is_none());
    }

    #[test]
    fn test_token_set_requires_access_token() {
        let json = r#"{"token_type": "Bearer"}"#;
        assert!(serde_json::from_str::<TokenSet>(json).is_err());

        let json = r#"{"access_token": "t1"}"#;
        let tokens: TokenSet = serde_json::from_str(json).unwrap();
        assert_eq!(tokens.access_token, "t1");
        assert!(tokens.expires_in.is_none());
    }

    #[test]
    fn test_display_profile_from_session_user() {
        let user = SessionUser {
            user_id: Uuid::new_v4(),
            email: "a@b.com".to_string(),
            display_name: Some("A".to_string()),
            role: "user".to_string(),
            avatar_url: None,
        };

        let profile = DisplayProfile::from(&user);
        assert_eq!(profile.email, "a@b.com");
        assert_eq!(profile.name.as_deref(), Some("A"));
        assert!(profile.avatar_url.is_none());
    }
}
