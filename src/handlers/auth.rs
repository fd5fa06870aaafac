// Authentication handlers: sign-in and sign-out
use crate::models::OAuthState;
use crate::oauth::authorization_url;
use crate::session::CookieFactory;
use crate::settings::AuthgateSettings;
use crate::utils::crypto::generate_state_token;
use crate::utils::responses::{login_error_redirect, redirect_with_cookies};
use actix_web::{web, HttpResponse, Result};
use log::{debug, error, info};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct SignInQuery {
    pub redirect_to: Option<String>,
}

/// OAuth sign in handler
///
/// Generates the CSRF state token, stores it encrypted in the short-lived
/// state cookie and redirects the browser to the provider's authorization
/// endpoint.
///
/// # Errors
///
/// Never returns an error response through actix; failures redirect to the
/// login page with an error code.
pub async fn oauth_sign_in(
    query: web::Query<SignInQuery>,
    settings: web::Data<AuthgateSettings>,
    cookies: web::Data<CookieFactory>,
) -> Result<HttpResponse> {
    // Generate state for CSRF protection using high-entropy crypto-secure token
    let state = generate_state_token();

    let oauth_state = OAuthState {
        state: state.clone(),
        redirect_to: query.redirect_to.clone(),
    };

    let state_cookie = match cookies.state_cookie(&oauth_state) {
        Ok(cookie) => cookie,
        Err(e) => {
            error!("Failed to create OAuth state cookie: {e}");
            return Ok(login_error_redirect(
                &settings.application.login_path,
                "auth_failed",
                "Could not start sign-in",
                vec![],
            ));
        }
    };

    match authorization_url(&settings.provider, &settings.callback_url(), &state) {
        Ok(auth_url) => {
            info!(
                "Redirecting to {} authorization endpoint",
                settings.provider.name
            );
            debug!("Authorization URL: {auth_url}");
            Ok(redirect_with_cookies(&auth_url, vec![state_cookie]))
        }
        Err(e) => {
            error!("Failed to build authorization URL: {e}");
            Ok(login_error_redirect(
                &settings.application.login_path,
                e.code(),
                &e.message(),
                vec![],
            ))
        }
    }
}

/// OAuth sign out handler
///
/// Clears the full session cookie set and redirects to the login page.
///
/// # Errors
///
/// Never fails; the signature matches the other handlers
pub async fn oauth_sign_out(
    settings: web::Data<AuthgateSettings>,
    cookies: web::Data<CookieFactory>,
) -> Result<HttpResponse> {
    info!("User signed out, session cookies cleared");
    Ok(redirect_with_cookies(
        &settings.application.login_path,
        cookies.expired_session_cookies(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{OAUTH_STATE_COOKIE, SESSION_COOKIE_NAME};
    use crate::testing::TestFixtures;
    use actix_web::{test, web, App};

    fn test_app_data() -> (web::Data<AuthgateSettings>, web::Data<CookieFactory>) {
        let settings = TestFixtures::settings();
        let cookies = CookieFactory::from_settings(&settings);
        (web::Data::new(settings), web::Data::new(cookies))
    }

    #[actix_web::test]
    async fn test_sign_in_sets_state_cookie_and_redirects_to_provider() {
        let (settings, cookies) = test_app_data();
        let app = test::init_service(
            App::new()
                .app_data(settings)
                .app_data(cookies)
                .route("/auth/sign_in", web::get().to(oauth_sign_in)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/auth/sign_in?redirect_to=/reports")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::FOUND);

        let location = resp.headers().get("Location").unwrap().to_str().unwrap();
        assert!(location.starts_with("https://accounts.google.com/"));
        assert!(location.contains("response_type=code"));
        assert!(location.contains("state="));

        let set_cookie = resp
            .headers()
            .get_all("set-cookie")
            .map(|v| v.to_str().unwrap().to_string())
            .collect::<Vec<_>>();
        assert!(set_cookie
            .iter()
            .any(|c| c.starts_with(OAUTH_STATE_COOKIE)));
    }

    #[actix_web::test]
    async fn test_sign_out_expires_session_cookie_set() {
        let (settings, cookies) = test_app_data();
        let app = test::init_service(
            App::new()
                .app_data(settings)
                .app_data(cookies)
                .route("/auth/sign_out", web::get().to(oauth_sign_out)),
        )
        .await;

        let req = test::TestRequest::get().uri("/auth/sign_out").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::FOUND);
        let location = resp.headers().get("Location").unwrap();
        assert_eq!(location, "/login");

        let set_cookie = resp
            .headers()
            .get_all("set-cookie")
            .map(|v| v.to_str().unwrap().to_string())
            .collect::<Vec<_>>();
        assert_eq!(set_cookie.len(), 3);
        assert!(set_cookie
            .iter()
            .any(|c| c.starts_with(&format!("{SESSION_COOKIE_NAME}=;"))));
        // Every cookie in the set is emptied
        assert!(set_cookie.iter().all(|c| c.contains("=;")));
    }
}
