use crate::error::AppError;

/// bcrypt work factor used when nothing else is configured.
pub const DEFAULT_COST: u32 = 14;
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

/// bcrypt only reads this many bytes of input; anything past it would be
/// silently ignored.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Salted bcrypt hashing at a fixed work factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(AppError::HashingError(format!(
                "password exceeds {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }
        Ok(bcrypt::hash(password, self.cost)?)
    }

    /// False for a wrong password, for a password too long to have been
    /// hashed, and for anything that isn't a bcrypt hash.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        if password.len() > MAX_PASSWORD_BYTES {
            return false;
        }
        bcrypt::verify(password, hash).unwrap_or(false)
    }

    /// [`hash`](Self::hash) on the blocking pool; bcrypt at a real cost
    /// would otherwise stall the async worker.
    pub async fn hash_blocking(&self, password: &str) -> Result<String, AppError> {
        let hasher = *self;
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::HashingError(e.to_string()))?
    }

    pub async fn verify_blocking(&self, password: &str, hash: &str) -> bool {
        let hasher = *self;
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(MIN_BCRYPT_COST)
    }

    #[test]
    fn test_hash_then_verify() {
        let hasher = hasher();
        let hash = hasher.hash("Secret1!").unwrap();
        assert_ne!(hash, "Secret1!");
        assert!(hasher.verify("Secret1!", &hash));
        assert!(!hasher.verify("Secret2!", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = hasher();
        let first = hasher.hash("Secret1!").unwrap();
        let second = hasher.hash("Secret1!").unwrap();
        assert_ne!(first, second);
        assert!(hasher.verify("Secret1!", &second));
    }

    #[test]
    fn test_malformed_hash_is_a_mismatch() {
        let hasher = hasher();
        assert!(!hasher.verify("Secret1!", "not-a-bcrypt-hash"));
        assert!(!hasher.verify("Secret1!", ""));
    }

    #[test]
    fn test_invalid_cost_is_a_hashing_error() {
        let err = PasswordHasher::new(2).hash("Secret1!").unwrap_err();
        assert!(matches!(err, AppError::HashingError(_)));
    }

    #[test]
    fn test_overlong_passwords_do_not_collide() {
        let hasher = hasher();
        let shared = "A".repeat(MAX_PASSWORD_BYTES);
        let first = format!("{shared}x");
        let second = format!("{shared}y");

        // Hashing past the bcrypt input limit is refused outright
        let err = hasher.hash(&second).unwrap_err();
        assert!(matches!(err, AppError::HashingError(_)));

        // A hash of the 72-byte prefix must not admit longer inputs
        let prefix_hash = hasher.hash(&shared).unwrap();
        assert!(hasher.verify(&shared, &prefix_hash));
        assert!(!hasher.verify(&first, &prefix_hash));
        assert!(!hasher.verify(&second, &prefix_hash));
    }

    #[test]
    fn test_default_cost() {
        assert_eq!(PasswordHasher::default().cost(), 14);
    }

    #[tokio::test]
    async fn test_blocking_variants() {
        let hasher = hasher();
        let hash = hasher.hash_blocking("abc12!").await.unwrap();
        assert!(hasher.verify_blocking("abc12!", &hash).await);
        assert!(!hasher.verify_blocking("abc12?", &hash).await);
    }
}
