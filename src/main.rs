use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use gatehouse_server::{configure_routes, AppError, AppState, Settings};
use std::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEVELOPMENT_SECRET: &str = "development_secret";

#[actix_web::main]
async fn main() -> gatehouse_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();

    // Load configuration
    let config = Settings::new()?;
    info!("Configuration loaded successfully ({})", config.environment);

    if config.auth.jwt_secret == DEVELOPMENT_SECRET {
        warn!("Using the built-in development signing secret; set APP_AUTH__JWT_SECRET");
    }
    if !config.auth.cookie_secure {
        warn!("Session cookies are sent without the Secure attribute");
    }

    let state = AppState::new(config.clone()).await?;
    let gate = state.auth_gate();
    let state = web::Data::new(state);

    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;
    info!("Starting server at {}:{}", config.server.host, config.server.port);

    HttpServer::new(move || {
        let gate = gate.clone();
        App::new()
            .app_data(state.clone())
            .configure(move |cfg| configure_routes(cfg, gate))
    })
    .listen(listener)?
    .workers(config.server.workers as usize)
    .run()
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    Ok(())
}
