//! Durable user records

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth::models::User;
use crate::error::{Error, Result};

/// User persistence, keyed by id and by username
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Insert a new user; `Conflict` if the username is taken
    async fn create(&self, user: &User) -> Result<String>;

    async fn get_by_username(&self, username: &str) -> Result<User>;

    async fn get_by_id(&self, id: &str) -> Result<User>;
}

#[derive(Default)]
struct Users {
    by_id: HashMap<String, User>,
    /// username -> id
    by_username: HashMap<String, String>,
}

/// In-process identity store
#[derive(Clone, Default)]
pub struct MemoryIdentityStore {
    users: Arc<RwLock<Users>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.by_id.len()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn create(&self, user: &User) -> Result<String> {
        let mut users = self.users.write().await;
        if users.by_username.contains_key(&user.username) {
            return Err(Error::Conflict(user.username.clone()));
        }

        users
            .by_username
            .insert(user.username.clone(), user.id.clone());
        users.by_id.insert(user.id.clone(), user.clone());
        Ok(user.id.clone())
    }

    async fn get_by_username(&self, username: &str) -> Result<User> {
        let users = self.users.read().await;
        users
            .by_username
            .get(username)
            .and_then(|id| users.by_id.get(id))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("User '{}'", username)))
    }

    async fn get_by_id(&self, id: &str) -> Result<User> {
        self.users
            .read()
            .await
            .by_id
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("User {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::UserRole;

    fn user(username: &str) -> User {
        User::new(
            username.to_string(),
            "Test".to_string(),
            UserRole::User,
            25,
            "hash".to_string(),
        )
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let store = MemoryIdentityStore::new();
        let alice = user("alice");
        let id = store.create(&alice).await.unwrap();

        assert_eq!(id, alice.id);
        assert_eq!(store.get_by_id(&id).await.unwrap().username, "alice");
        assert_eq!(store.get_by_username("alice").await.unwrap().id, id);
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = MemoryIdentityStore::new();
        store.create(&user("alice")).await.unwrap();

        let result = store.create(&user("alice")).await;
        assert!(matches!(result, Err(Error::Conflict(name)) if name == "alice"));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_missing_user_not_found() {
        let store = MemoryIdentityStore::new();
        assert!(matches!(store.get_by_id("nope").await, Err(Error::NotFound(_))));
        assert!(matches!(
            store.get_by_username("nobody").await,
            Err(Error::NotFound(_))
        ));
    }
}
