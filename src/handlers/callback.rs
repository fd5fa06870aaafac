// OAuth callback handler
use crate::identity::Identity;
use crate::models::{CallbackQuery, OAuthState, SessionUser};
use crate::oauth::{AuthError, LoginService};
use crate::session::CookieFactory;
use crate::settings::AuthgateSettings;
use crate::utils::redirect::sanitize_redirect_target;
use crate::utils::responses::{login_error_redirect, redirect_with_cookies};
use actix_web::{web, HttpRequest, HttpResponse, Result};
use log::{debug, error, info};

/// OAuth callback handler
///
/// The linear pipeline of the login flow: parse the inbound redirect,
/// validate and consume the CSRF state, drive the exchange through the login
/// service, issue the session cookie set, redirect. Every terminal failure
/// redirects to the login page with a machine-readable error code; nothing
/// escapes this handler as an unhandled error.
///
/// # Errors
///
/// Never returns an actix error; all outcomes are redirects
pub async fn oauth_callback(
    query: web::Query<CallbackQuery>,
    req: HttpRequest,
    settings: web::Data<AuthgateSettings>,
    cookies: web::Data<CookieFactory>,
    login: web::Data<LoginService>,
) -> Result<HttpResponse> {
    let callback = query.into_inner();
    debug!(
        "OAuth callback received: code={}, state={}, error={:?}",
        callback.code.is_some(),
        callback.state.is_some(),
        callback.error
    );

    // Step 1: ParseInbound - a provider-reported error short-circuits the flow
    if let Err(e) = check_provider_error(&callback) {
        return Ok(failure_response(&settings, &cookies, &e));
    }

    // Step 2: ValidateState - validate then consume the CSRF state cookie
    let oauth_state = match validate_state(&callback, &cookies, &req) {
        Ok(state) => state,
        Err(e) => return Ok(failure_response(&settings, &cookies, &e)),
    };

    let code = match &callback.code {
        Some(code) => code.clone(),
        None => {
            error!("No authorization code received");
            return Ok(failure_response(&settings, &cookies, &AuthError::MissingCode));
        }
    };

    // Steps 3-5: ExchangeToken, FetchProfile, UpsertIdentity - retried inside
    // the login service; the state cookie is already consumed, so a pipeline
    // retry does not re-validate CSRF
    let identity = match login.complete_login(&code).await {
        Ok(identity) => identity,
        Err(e) => {
            error!("Login pipeline failed: {e}");
            return Ok(failure_response(&settings, &cookies, &e));
        }
    };

    // Step 6: IssueSession - only reached when every prior step succeeded
    let session_cookies = match cookies.session_cookies(&session_user(&identity)) {
        Ok(session_cookies) => session_cookies,
        Err(e) => {
            error!("Failed to create session cookies: {e}");
            let session_err = AuthError::Session(e.to_string());
            return Ok(failure_response(&settings, &cookies, &session_err));
        }
    };

    // Step 7: Redirect to the validated target, deleting the state cookie
    let target = sanitize_redirect_target(
        callback
            .redirect_to
            .as_deref()
            .or(oauth_state.redirect_to.as_deref()),
        &settings.application.default_redirect,
    );

    info!("Login complete for {}", identity.email);
    let mut all_cookies = session_cookies;
    all_cookies.push(cookies.expired_state_cookie());
    Ok(redirect_with_cookies(&target, all_cookies))
}

/// Map a provider-reported callback error to an outcome. `access_denied` is
/// the user-cancelled outcome, anything else a provider error carrying the
/// description.
fn check_provider_error(callback: &CallbackQuery) -> std::result::Result<(), AuthError> {
    let Some(error) = &callback.error else {
        return Ok(());
    };

    if error == "access_denied" {
        info!("User cancelled sign-in at provider");
        return Err(AuthError::AccessDenied {
            description: callback.error_description.clone(),
        });
    }

    Err(AuthError::ProviderError {
        error: error.clone(),
        description: callback
            .error_description
            .clone()
            .unwrap_or_else(|| "Provider reported an error".to_string()),
    })
}

/// Compare the inbound `state` parameter against the stored cookie. All
/// failure modes are terminal; retrying cannot fix a CSRF mismatch.
fn validate_state(
    callback: &CallbackQuery,
    cookies: &CookieFactory,
    req: &HttpRequest,
) -> std::result::Result<OAuthState, AuthError> {
    let Some(received) = &callback.state else {
        return Err(AuthError::InvalidState(
            "no state parameter received".to_string(),
        ));
    };

    let Some(stored) = cookies.state_from_request(req) else {
        return Err(AuthError::InvalidState(
            "no stored state found".to_string(),
        ));
    };

    if stored.state != *received {
        return Err(AuthError::InvalidState(
            "received state does not match stored token".to_string(),
        ));
    }

    debug!("OAuth state verified");
    Ok(stored)
}

/// Session payload for a logged-in identity
fn session_user(identity: &Identity) -> SessionUser {
    SessionUser {
        user_id: identity.id,
        email: identity.email.clone(),
        display_name: identity.display_name.clone(),
        role: identity.role.clone(),
        avatar_url: identity.avatar_url.clone(),
    }
}

/// Terminal outcome: redirect to the login page with the error's stable code,
/// clearing the state cookie on every path
fn failure_response(
    settings: &AuthgateSettings,
    cookies: &CookieFactory,
    err: &AuthError,
) -> HttpResponse {
    login_error_redirect(
        &settings.application.login_path,
        err.code(),
        &err.message(),
        vec![cookies.expired_state_cookie()],
    )
}
