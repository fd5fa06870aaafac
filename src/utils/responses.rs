//! HTTP response helpers
//!
//! Redirect construction shared by the auth handlers. Every terminal login
//! failure funnels through [`login_error_redirect`] so the error code and
//! urlencoded message format stay uniform.

use actix_web::{cookie::Cookie, HttpResponse};

/// Create a 302 redirect carrying any number of `Set-Cookie` headers
#[must_use]
pub fn redirect_with_cookies(location: &str, cookies: Vec<Cookie<'static>>) -> HttpResponse {
    let mut builder = HttpResponse::Found();

    for cookie in cookies {
        builder.cookie(cookie);
    }

    builder
        .append_header(("Location", location.to_string()))
        .finish()
}

/// Create a redirect to the login page with a machine-readable error code and
/// a human-readable message
#[must_use]
pub fn login_error_redirect(
    login_path: &str,
    code: &str,
    message: &str,
    cookies: Vec<Cookie<'static>>,
) -> HttpResponse {
    let location = format!(
        "{login_path}?error={code}&message={}",
        urlencoding::encode(message)
    );
    redirect_with_cookies(&location, cookies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_redirect_sets_location_and_cookies() {
        let cookie = Cookie::build("c", "v").finish();
        let response = redirect_with_cookies("/dashboard", vec![cookie]);

        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response.headers().get("Location").unwrap();
        assert_eq!(location, "/dashboard");
        assert!(response.headers().contains_key("set-cookie"));
    }

    #[test]
    fn test_login_error_redirect_encodes_message() {
        let response = login_error_redirect(
            "/login",
            "token_exchange_failed",
            "token exchange failed: status 503",
            vec![],
        );

        let location = response.headers().get("Location").unwrap().to_str().unwrap();
        assert!(location.starts_with("/login?error=token_exchange_failed&message="));
        assert!(location.contains("token%20exchange%20failed"));
    }
}
