//! Session storage: one live session per user, evicted after a TTL

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::auth::models::Session;
use crate::error::{Error, Result};

/// Key-value session persistence keyed by user id
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Replace whatever session the user had and evict the new one after `ttl`
    async fn put(&self, session: &Session, ttl: Duration) -> Result<()>;

    /// The user's live session; `NotFound` once deleted or evicted
    async fn get(&self, user_id: &str) -> Result<Session>;

    /// Remove the user's session. Deleting nothing is not an error.
    async fn delete(&self, user_id: &str) -> Result<()>;
}

pub(crate) fn deadline_after(ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn session_not_found(user_id: &str) -> Error {
    Error::NotFound(format!("Session for user {}", user_id))
}

#[derive(Debug, Clone)]
struct Entry {
    /// Serialized [`Session`]
    payload: String,
    evict_at: DateTime<Utc>,
}

impl Entry {
    fn is_evicted(&self) -> bool {
        self.evict_at <= Utc::now()
    }
}

/// In-memory session store
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every evicted entry, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_evicted());
        before - sessions.len()
    }

    /// Number of stored entries, evicted ones included until purged
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, session: &Session, ttl: Duration) -> Result<()> {
        let entry = Entry {
            payload: session.to_json()?,
            evict_at: deadline_after(ttl),
        };
        // Single insert under the write lock: the old entry is overwritten,
        // never observed as absent in between.
        self.sessions
            .write()
            .await
            .insert(session.user_id.clone(), entry);
        Ok(())
    }

    async fn get(&self, user_id: &str) -> Result<Session> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(user_id) {
                Some(entry) if !entry.is_evicted() => return Session::from_json(&entry.payload),
                Some(_) => {}
                None => return Err(session_not_found(user_id)),
            }
        }

        let mut sessions = self.sessions.write().await;
        if sessions.get(user_id).is_some_and(Entry::is_evicted) {
            sessions.remove(user_id);
        }
        Err(session_not_found(user_id))
    }

    async fn delete(&self, user_id: &str) -> Result<()> {
        self.sessions.write().await.remove(user_id);
        Ok(())
    }
}
