use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::db::models::User;
use crate::db::operations::UserDirectory;
use crate::error::DatabaseError;

/// In-process user store with the same uniqueness rules as the `users`
/// table: usernames are unique across every row, soft-deleted included.
#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeMap<i64, User>,
    next_id: i64,
}

impl MemoryState {
    fn username_owner(&self, username: &str) -> Option<i64> {
        self.users
            .values()
            .find(|u| u.username == username)
            .map(|u| u.id)
    }
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.username == username && !u.is_deleted())
            .cloned())
    }

    async fn create(&self, username: &str, password_hash: &str) -> Result<User, DatabaseError> {
        let mut state = self.state.write().await;
        if state.username_owner(username).is_some() {
            return Err(DatabaseError::Duplicate);
        }

        state.next_id += 1;
        let user = User::new(state.next_id, username.to_string(), password_hash.to_string());
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<(), DatabaseError> {
        let mut state = self.state.write().await;
        if let Some(owner) = state.username_owner(&user.username) {
            if owner != user.id {
                return Err(DatabaseError::Duplicate);
            }
        }

        match state.users.get_mut(&user.id) {
            Some(stored) if !stored.is_deleted() => {
                stored.username = user.username.clone();
                stored.password_hash = user.password_hash.clone();
                stored.updated_at = user.updated_at;
                Ok(())
            }
            _ => Err(DatabaseError::NotFound),
        }
    }
}
