pub mod auth;
pub mod config;
pub mod db;
pub mod error;

use std::sync::Arc;
use std::time::Duration;
use actix_web::{web, HttpResponse};
use tracing::info;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use crate::config::Settings;

pub use auth::{AuthGate, AuthService, AuthenticatedUser, PasswordHasher, TokenService};
pub use db::{MemoryUserDirectory, PgUserDirectory, User, UserDirectory};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all workers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    /// Connects to Postgres, applies migrations and wires the auth core to it.
    pub async fn new(config: Settings) -> Result<Self> {
        let directory =
            PgUserDirectory::connect(&config.database, Duration::from_secs(10)).await?;
        directory.migrate().await?;
        info!(
            "Connected to database {} at {}:{}",
            config.database.name, config.database.host, config.database.port
        );

        Ok(Self::with_directory(config, Arc::new(directory)))
    }

    pub fn with_directory(config: Settings, directory: Arc<dyn UserDirectory>) -> Self {
        let tokens = Arc::new(TokenService::from_config(&config.auth));
        let hasher = PasswordHasher::new(config.auth.bcrypt_cost);
        let auth_service = AuthService::new(directory, hasher, tokens);

        Self {
            config: Arc::new(config),
            auth_service: Arc::new(auth_service),
        }
    }

    pub fn auth_gate(&self) -> AuthGate {
        AuthGate::new(self.auth_service.tokens().clone(), &self.config.auth.cookie_name)
    }
}

/// Mounts every route; pages behind `gate` need a valid session cookie.
pub fn configure_routes(cfg: &mut web::ServiceConfig, gate: AuthGate) {
    use auth::handlers::{dashboard, login, logout, register, update_username};

    cfg.route("/health", web::get().to(health_check))
        .route("/register", web::post().to(register))
        .route("/login", web::post().to(login))
        .route("/logout", web::get().to(logout))
        .service(
            web::resource("/dashboard")
                .wrap(gate.clone())
                .route(web::get().to(dashboard)),
        )
        .service(
            web::resource("/update-username")
                .wrap(gate)
                .route(web::post().to(update_username)),
        );
}
