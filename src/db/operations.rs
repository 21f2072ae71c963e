use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::DatabaseConfig;
use crate::db::models::User;
use crate::error::DatabaseError;

/// Persistence contract for user records.
///
/// `create` is the authoritative uniqueness guard: callers may pre-check with
/// `find_by_username`, but a concurrent registration can still make `create`
/// return [`DatabaseError::Duplicate`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Live (not soft-deleted) user with this username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;

    async fn create(&self, username: &str, password_hash: &str) -> Result<User, DatabaseError>;

    /// Persists username, hash and `updated_at` of an existing record.
    async fn save(&self, user: &User) -> Result<(), DatabaseError>;
}

const USER_COLUMNS: &str = "id, username, password_hash, created_at, updated_at, deleted_at";

pub struct PgUserDirectory {
    pool: Arc<PgPool>,
}

impl PgUserDirectory {
    pub async fn connect(config: &DatabaseConfig, acquire_timeout: Duration) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_with(config.connect_options())
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        Ok(Self { pool: Arc::new(pool) })
    }

    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(self.pool.as_ref())
            .await
            .map_err(|e| DatabaseError::MigrationError(e.to_string()))
    }

    pub fn pool(&self) -> &Arc<PgPool> {
        &self.pool
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 AND deleted_at IS NULL"
        ))
        .bind(username)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    async fn create(&self, username: &str, password_hash: &str) -> Result<User, DatabaseError> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(password_hash)
        .bind(now)
        .fetch_one(self.pool.as_ref())
        .await?;

        debug!("Inserted user row {}", user.id);
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $2, password_hash = $3, updated_at = $4
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.updated_at)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database_config() -> Option<DatabaseConfig> {
        let name = std::env::var("TEST_DB_NAME").ok()?;
        Some(DatabaseConfig {
            host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".into()),
            port: 5432,
            user: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "postgres".into()),
            password: std::env::var("TEST_DB_PASSWORD").unwrap_or_else(|_| "postgres".into()),
            name,
            max_connections: 2,
        })
    }

    #[tokio::test]
    #[ignore = "requires a Postgres database named by TEST_DB_NAME"]
    async fn test_postgres_uniqueness_and_save() {
        let config = database_config().expect("TEST_DB_NAME must be set");
        let directory = PgUserDirectory::connect(&config, Duration::from_secs(5))
            .await
            .expect("Failed to connect to test database");
        directory.migrate().await.expect("Failed to run migrations");

        let username = format!("pg{}", Utc::now().timestamp_micros() % 100_000_000);
        let created = directory.create(&username, "$2b$04$hash").await.unwrap();
        assert_eq!(created.username, username);

        let duplicate = directory.create(&username, "$2b$04$other").await;
        assert!(matches!(duplicate, Err(DatabaseError::Duplicate)));

        let mut found = directory.find_by_username(&username).await.unwrap().unwrap();
        assert_eq!(found.id, created.id);

        let renamed = format!("{username}x");
        found.rename(&renamed);
        directory.save(&found).await.unwrap();
        assert!(directory.find_by_username(&username).await.unwrap().is_none());
        assert!(directory.find_by_username(&renamed).await.unwrap().is_some());

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(created.id)
            .execute(directory.pool().as_ref())
            .await
            .unwrap();
    }
}
