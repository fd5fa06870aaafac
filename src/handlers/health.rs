use crate::models::HealthResponse;
use actix_web::{HttpResponse, Result};

/// Health check endpoint
///
/// # Errors
///
/// Never fails; the signature matches the other handlers
pub async fn health() -> Result<HttpResponse> {
    let response = HealthResponse {
        status: "ok".to_string(),
        message: "Authgate login gateway is running".to_string(),
    };
    Ok(HttpResponse::Ok().json(response))
}
