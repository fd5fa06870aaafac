#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use authgate::{
    handlers::{health, oauth_callback, oauth_sign_in, oauth_sign_out},
    identity::{IdentityStore, InMemoryIdentityStore, LoggingQuotaSeeder, QuotaSeeder},
    oauth::LoginService,
    session::CookieFactory,
    settings::AuthgateSettings,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = AuthgateSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    if !settings.provider.is_configured() {
        return Err(std::io::Error::other(format!(
            "Provider '{}' is not configured. Set the client credentials in \
             Settings.toml or the configured environment variables.",
            settings.provider.name
        )));
    }

    // The in-memory store is the reference implementation; a deployment wires
    // its persistent store behind the same traits
    let identities: Arc<dyn IdentityStore + Send + Sync> = Arc::new(InMemoryIdentityStore::new());
    let quotas: Arc<dyn QuotaSeeder + Send + Sync> = Arc::new(LoggingQuotaSeeder);

    let login_service = LoginService::from_settings(&settings, identities, quotas)
        .map_err(|e| std::io::Error::other(format!("Failed to initialize login service: {e}")))?;
    let cookie_factory = CookieFactory::from_settings(&settings);

    start_server(settings, cookie_factory, login_service).await
}

/// Start the server
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(
    settings: AuthgateSettings,
    cookie_factory: CookieFactory,
    login_service: LoginService,
) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    // Configure CORS for SPAs
    let cors_origins = settings.get_cors_origins();

    HttpServer::new(move || {
        let cors_origins = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                cors_origins
                    .iter()
                    .any(|allowed| allowed == origin.to_str().unwrap_or(""))
            })
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec!["Authorization", "Content-Type", "Accept"])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(settings.clone()))
            .app_data(web::Data::new(cookie_factory.clone()))
            .app_data(web::Data::new(login_service.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg
        // OAuth2 endpoints
        .route("/auth/sign_in", web::get().to(oauth_sign_in))
        .route("/auth/sign_out", web::get().to(oauth_sign_out))
        .route("/auth/sign_out", web::post().to(oauth_sign_out))
        .route("/auth/callback", web::get().to(oauth_callback))
        // Health endpoint
        .route("/ping", web::get().to(health));
}

fn print_startup_info(bind_address: &str, settings: &AuthgateSettings) {
    println!("Starting Authgate login gateway on http://{bind_address}");
    println!();
    println!("OAuth2 endpoints:");
    println!("  GET  /auth/sign_in  - Start sign-in with {}", settings.provider.name);
    println!("  GET|POST /auth/sign_out - Clear session");
    println!("  GET  /auth/callback - OAuth callback");
    println!();
    println!("OAuth callback URL for the identity provider:");
    println!("  {}", settings.callback_url());
    println!();
    println!("System endpoints:");
    println!("  GET  /ping            - Health check");
}
