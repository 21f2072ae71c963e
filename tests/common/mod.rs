use gatehouse_server::auth::password::MIN_BCRYPT_COST;
use gatehouse_server::config::{AuthConfig, DatabaseConfig, ServerConfig};
use gatehouse_server::{AppState, MemoryUserDirectory, Settings};
use std::sync::Arc;

pub fn test_settings() -> Settings {
    Settings {
        environment: "test".to_string(),
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: 1,
        },
        database: DatabaseConfig {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            name: "gatehouse_test".to_string(),
            max_connections: 1,
        },
        auth: AuthConfig {
            jwt_secret: "test_secret".to_string(),
            token_expiry_hours: 24,
            bcrypt_cost: MIN_BCRYPT_COST,
            cookie_name: "token".to_string(),
            cookie_secure: false,
        },
    }
}

pub fn test_state() -> (AppState, Arc<MemoryUserDirectory>) {
    let directory = Arc::new(MemoryUserDirectory::new());
    let state = AppState::with_directory(test_settings(), directory.clone());
    (state, directory)
}
