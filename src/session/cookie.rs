use actix_web::{cookie::Cookie, cookie::SameSite, HttpRequest};
use anyhow::Result;
use log::warn;

use crate::models::{DisplayProfile, OAuthState, SessionUser};
use crate::settings::AuthgateSettings;
use crate::utils::crypto::{decrypt_data, derive_encryption_key, encrypt_data};

/// Common cookie names used across the application
pub const SESSION_COOKIE_NAME: &str = "authgate_session";
pub const ROLE_COOKIE_NAME: &str = "authgate_role";
pub const PROFILE_COOKIE_NAME: &str = "authgate_profile";
pub const OAUTH_STATE_COOKIE: &str = "authgate_oauth_state";

/// Lifetime of the CSRF state cookie bridging sign-in and callback
const STATE_COOKIE_MINUTES: i64 = 10;

/// Derive the cookie `Domain` attribute from the configured site URL.
///
/// In production the cookie is scoped to the site hostname with a leading
/// `www.` stripped, so it is shared between the apex and the `www` host. In
/// development, and for `localhost`, the attribute is omitted and the browser
/// defaults to the exact host. Issuance and deletion must both go through
/// this helper: a deletion with a mismatched domain silently no-ops.
#[must_use]
pub fn cookie_domain(site_url: &str, production: bool) -> Option<String> {
    let parsed = url::Url::parse(site_url).ok()?;
    let hostname = parsed.host_str()?;

    if !production || hostname == "localhost" {
        return None;
    }

    Some(
        hostname
            .strip_prefix("www.")
            .unwrap_or(hostname)
            .to_string(),
    )
}

/// Cookie factory for creating the session cookie set and the temporary
/// OAuth state cookie with consistent attributes
#[derive(Clone)]
pub struct CookieFactory {
    encryption_key: [u8; 32],
    secure: bool,
    domain: Option<String>,
    session_duration_hours: u64,
}

impl CookieFactory {
    /// Create a new cookie factory with the specified configuration
    #[must_use]
    pub fn new(
        key: &[u8],
        secure: bool,
        domain: Option<String>,
        session_duration_hours: u64,
    ) -> Self {
        Self {
            encryption_key: derive_encryption_key(key),
            secure,
            domain,
            session_duration_hours,
        }
    }

    /// Build the factory from loaded settings
    #[must_use]
    pub fn from_settings(settings: &AuthgateSettings) -> Self {
        Self::new(
            settings.session.session_secret.as_bytes(),
            settings.cookies.secure,
            cookie_domain(&settings.application.site_url, settings.is_production()),
            settings.session.session_duration_hours,
        )
    }

    /// Apply the shared attributes: path, secure, `SameSite` and domain
    fn apply_common<'c>(
        &self,
        builder: actix_web::cookie::CookieBuilder<'c>,
        http_only: bool,
        max_age: actix_web::cookie::time::Duration,
    ) -> Cookie<'c> {
        let mut builder = builder
            .http_only(http_only)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(max_age);

        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }

        builder.finish()
    }

    fn session_max_age(&self) -> actix_web::cookie::time::Duration {
        actix_web::cookie::time::Duration::hours(
            i64::try_from(self.session_duration_hours).unwrap_or(168),
        )
    }

    /// Create the full session cookie set for a logged-in user: the
    /// encrypted `httpOnly` session payload, plus the non-`httpOnly` role
    /// and display-profile cookies. All three share domain, secure,
    /// `SameSite` and max-age so they expire and scope identically.
    ///
    /// # Errors
    ///
    /// Returns an error if payload encryption or serialization fails
    pub fn session_cookies(&self, user: &SessionUser) -> Result<Vec<Cookie<'static>>> {
        let max_age = self.session_max_age();

        let payload = encrypt_data(user, &self.encryption_key)?;
        let session = self.apply_common(
            Cookie::build(SESSION_COOKIE_NAME, payload),
            true,
            max_age,
        );

        let role = self.apply_common(
            Cookie::build(ROLE_COOKIE_NAME, user.role.clone()),
            false,
            max_age,
        );

        let profile_json = serde_json::to_string(&DisplayProfile::from(user))?;
        let profile = self.apply_common(
            Cookie::build(
                PROFILE_COOKIE_NAME,
                urlencoding::encode(&profile_json).into_owned(),
            ),
            false,
            max_age,
        );

        Ok(vec![session, role, profile])
    }

    /// Create the temporary cookie holding the encrypted OAuth state during
    /// the flow
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn state_cookie(&self, state: &OAuthState) -> Result<Cookie<'static>> {
        let payload = encrypt_data(state, &self.encryption_key)?;
        Ok(self.apply_common(
            Cookie::build(OAUTH_STATE_COOKIE, payload),
            true,
            actix_web::cookie::time::Duration::minutes(STATE_COOKIE_MINUTES),
        ))
    }

    /// Read and decrypt the stored OAuth state from the request, if present.
    /// An undecryptable cookie is treated as absent.
    #[must_use]
    pub fn state_from_request(&self, req: &HttpRequest) -> Option<OAuthState> {
        let cookie = req.cookie(OAUTH_STATE_COOKIE)?;
        match decrypt_data::<OAuthState>(cookie.value(), &self.encryption_key) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!("Failed to decrypt OAuth state cookie: {e}");
                None
            }
        }
    }

    /// Read and decrypt the session payload from the request, if present
    #[must_use]
    pub fn session_from_request(&self, req: &HttpRequest) -> Option<SessionUser> {
        let cookie = req.cookie(SESSION_COOKIE_NAME)?;
        decrypt_data::<SessionUser>(cookie.value(), &self.encryption_key).ok()
    }

    /// Expired state cookie. Uses the same domain derivation as issuance so
    /// the deletion actually clears it in production.
    #[must_use]
    pub fn expired_state_cookie(&self) -> Cookie<'static> {
        self.expired(OAUTH_STATE_COOKIE, true)
    }

    /// Expired versions of the full session cookie set, for sign-out
    #[must_use]
    pub fn expired_session_cookies(&self) -> Vec<Cookie<'static>> {
        vec![
            self.expired(SESSION_COOKIE_NAME, true),
            self.expired(ROLE_COOKIE_NAME, false),
            self.expired(PROFILE_COOKIE_NAME, false),
        ]
    }

    fn expired(&self, name: &'static str, http_only: bool) -> Cookie<'static> {
        self.apply_common(
            Cookie::build(name, ""),
            http_only,
            actix_web::cookie::time::Duration::seconds(-1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{constants::TEST_SESSION_KEY, RequestBuilder, TestFixtures};

    fn factory_with_domain(domain: Option<&str>) -> CookieFactory {
        CookieFactory::new(TEST_SESSION_KEY, false, domain.map(String::from), 168)
    }

    #[test]
    fn test_cookie_domain_production_strips_www() {
        assert_eq!(
            cookie_domain("https://www.example.com", true),
            Some("example.com".to_string())
        );
        assert_eq!(
            cookie_domain("https://app.example.com", true),
            Some("app.example.com".to_string())
        );
    }

    #[test]
    fn test_cookie_domain_omitted_in_development_and_localhost() {
        assert_eq!(cookie_domain("https://www.example.com", false), None);
        assert_eq!(cookie_domain("http://localhost:8080", true), None);
        assert_eq!(cookie_domain("not a url", true), None);
    }

    #[test]
    fn test_session_cookie_set_shares_attributes() {
        let factory = factory_with_domain(Some("example.com"));
        let cookies = factory
            .session_cookies(&TestFixtures::session_user())
            .unwrap();

        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies[0].name(), SESSION_COOKIE_NAME);
        assert_eq!(cookies[1].name(), ROLE_COOKIE_NAME);
        assert_eq!(cookies[2].name(), PROFILE_COOKIE_NAME);

        for cookie in &cookies {
            assert_eq!(cookie.domain(), Some("example.com"));
            assert_eq!(cookie.path(), Some("/"));
            assert_eq!(cookie.same_site(), Some(SameSite::Lax));
            assert_eq!(
                cookie.max_age(),
                Some(actix_web::cookie::time::Duration::hours(168))
            );
        }

        // Only the session payload is hidden from scripts
        assert_eq!(cookies[0].http_only(), Some(true));
        assert_eq!(cookies[1].http_only(), Some(false));
        assert_eq!(cookies[2].http_only(), Some(false));

        // Role rides in clear text, session payload does not
        assert_eq!(cookies[1].value(), "user");
        assert_ne!(cookies[0].value(), "");
    }

    #[test]
    fn test_factory_from_production_settings_derives_domain() {
        let factory = CookieFactory::from_settings(&TestFixtures::production_settings());
        let cookie = factory.expired_state_cookie();
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.secure(), Some(true));
    }

    #[test]
    fn test_session_payload_roundtrip() {
        let factory = TestFixtures::cookie_factory();
        let user = TestFixtures::session_user();
        let cookies = factory.session_cookies(&user).unwrap();

        let req = RequestBuilder::new()
            .with_cookie(cookies[0].clone())
            .build();
        let restored = factory.session_from_request(&req).unwrap();
        assert_eq!(restored, user);
    }

    #[test]
    fn test_state_cookie_roundtrip_and_expiry() {
        let factory = factory_with_domain(None);
        let state = OAuthState {
            state: "state-xyz".to_string(),
            redirect_to: Some("/reports".to_string()),
        };

        let cookie = factory.state_cookie(&state).unwrap();
        assert_eq!(cookie.name(), OAUTH_STATE_COOKIE);
        assert_eq!(
            cookie.max_age(),
            Some(actix_web::cookie::time::Duration::minutes(10))
        );

        let req = RequestBuilder::new().with_cookie(cookie).build();
        let restored = factory.state_from_request(&req).unwrap();
        assert_eq!(restored.state, "state-xyz");
        assert_eq!(restored.redirect_to.as_deref(), Some("/reports"));
    }

    #[test]
    fn test_state_from_request_rejects_garbage() {
        let factory = factory_with_domain(None);
        let req = RequestBuilder::new()
            .with_cookie(Cookie::build(OAUTH_STATE_COOKIE, "not-encrypted").finish())
            .build();
        assert!(factory.state_from_request(&req).is_none());
    }

    #[test]
    fn test_expired_cookies_share_domain_with_issuance() {
        let factory = factory_with_domain(Some("example.com"));

        let expired_state = factory.expired_state_cookie();
        assert_eq!(expired_state.domain(), Some("example.com"));
        assert!(expired_state.max_age().unwrap().whole_seconds() < 0);

        let expired = factory.expired_session_cookies();
        assert_eq!(expired.len(), 3);
        for cookie in &expired {
            assert_eq!(cookie.domain(), Some("example.com"));
            assert_eq!(cookie.value(), "");
            assert!(cookie.max_age().unwrap().whole_seconds() < 0);
        }
    }
}
