//! HTTP request builders for testing handlers
//!
//! This module provides a fluent builder for creating HTTP requests with
//! common patterns used in testing.

use actix_web::cookie::Cookie;
use actix_web::http::Method;
use actix_web::{test, HttpRequest};

/// Builder for creating HTTP requests for testing
pub struct RequestBuilder {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    cookies: Vec<Cookie<'static>>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    /// Create a new request builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            method: Method::GET,
            uri: "/".to_string(),
            headers: Vec::new(),
            cookies: Vec::new(),
        }
    }

    /// Set the HTTP method
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the request URI
    #[must_use]
    pub fn uri(mut self, uri: &str) -> Self {
        self.uri = uri.to_string();
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Add a cookie to the request
    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Build the final `HttpRequest`
    #[must_use]
    pub fn build(self) -> HttpRequest {
        let mut req = test::TestRequest::default()
            .method(self.method)
            .uri(&self.uri);

        // Add headers
        for (name, value) in self.headers {
            req = req.insert_header((name, value));
        }

        // Add cookies
        for cookie in self.cookies {
            req = req.cookie(cookie);
        }

        req.to_http_request()
    }
}
