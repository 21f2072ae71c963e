use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::password::PasswordHasher;
use crate::auth::token::TokenService;
use crate::auth::validation::{check_password, check_username, valid_password, valid_username};
use crate::db::models::User;
use crate::db::operations::UserDirectory;
use crate::error::{AppError, AuthError, DatabaseError};

/// Account use cases, independent of the HTTP layer.
pub struct AuthService {
    directory: Arc<dyn UserDirectory>,
    hasher: PasswordHasher,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        hasher: PasswordHasher,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            directory,
            hasher,
            tokens,
        }
    }

    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<User, AppError> {
        check_username(username)?;
        check_password(password)?;

        if self.directory.find_by_username(username).await?.is_some() {
            return Err(AppError::username_taken());
        }

        let password_hash = self.hasher.hash_blocking(password).await?;

        // The pre-check above can race with another registration; the
        // store's unique constraint decides.
        let user = self
            .directory
            .create(username, &password_hash)
            .await
            .map_err(conflict_on_duplicate)?;

        info!("Registered user {} (id {})", user.username, user.id);
        Ok(user)
    }

    /// Returns a fresh session token. Unknown user, wrong password and
    /// malformed input all produce the same [`AuthError::InvalidCredentials`].
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String, AppError> {
        if !valid_username(username) || !valid_password(password) {
            return Err(AuthError::InvalidCredentials.into());
        }

        let user = self
            .directory
            .find_by_username(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.hasher.verify_blocking(password, &user.password_hash).await {
            return Err(AuthError::InvalidCredentials.into());
        }

        self.tokens.issue(&user.username)
    }

    /// Renames the account behind `current`. Outstanding tokens keep the old
    /// name until they expire.
    pub async fn update_username(&self, current: &str, new_username: &str) -> Result<User, AppError> {
        check_username(new_username)?;
        if new_username == current {
            return Err(AppError::ValidationError(
                "New username must differ from the current one".to_string(),
            ));
        }

        if self.directory.find_by_username(new_username).await?.is_some() {
            return Err(AppError::username_taken());
        }

        let mut user = self
            .directory
            .find_by_username(current)
            .await?
            .ok_or_else(|| {
                warn!("Session refers to missing account {}", current);
                AuthError::InvalidToken
            })?;

        user.rename(new_username);
        self.directory.save(&user).await.map_err(|e| match e {
            DatabaseError::NotFound => AuthError::InvalidToken.into(),
            other => conflict_on_duplicate(other),
        })?;

        info!("Renamed user {} to {}", current, user.username);
        Ok(user)
    }
}

fn conflict_on_duplicate(err: DatabaseError) -> AppError {
    match err {
        DatabaseError::Duplicate => AppError::username_taken(),
        other => AppError::DatabaseError(other),
    }
}
