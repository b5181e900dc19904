//! Sessions table with TTL semantics

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_postgres::Client;

use crate::auth::models::Session;
use crate::auth::session::{deadline_after, SessionStore};
use crate::error::{Error, Result};

/// One row per user; rows past `evict_at` are treated as absent
#[derive(Clone)]
pub struct PostgresSessionStore {
    client: Arc<Client>,
}

impl PostgresSessionStore {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// Delete evicted rows, returning how many went
    pub async fn purge_expired(&self) -> Result<u64> {
        Ok(self
            .client
            .execute("DELETE FROM sessions WHERE evict_at <= now()", &[])
            .await?)
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn put(&self, session: &Session, ttl: Duration) -> Result<()> {
        let payload = session.to_json()?;
        let evict_at = deadline_after(ttl);

        self.client
            .execute(
                "INSERT INTO sessions (user_id, payload, evict_at) VALUES ($1, $2, $3)
                 ON CONFLICT (user_id) DO UPDATE
                 SET payload = EXCLUDED.payload, evict_at = EXCLUDED.evict_at",
                &[&session.user_id, &payload, &evict_at],
            )
            .await?;
        Ok(())
    }

    async fn get(&self, user_id: &str) -> Result<Session> {
        let row = self
            .client
            .query_opt(
                "SELECT payload FROM sessions WHERE user_id = $1 AND evict_at > now()",
                &[&user_id],
            )
            .await?
            .ok_or_else(|| Error::NotFound(format!("Session for user {}", user_id)))?;

        let payload: String = row.try_get(0)?;
        Session::from_json(&payload)
    }

    async fn delete(&self, user_id: &str) -> Result<()> {
        self.client
            .execute("DELETE FROM sessions WHERE user_id = $1", &[&user_id])
            .await?;
        Ok(())
    }
}

/// Periodically purge evicted sessions until the task is aborted
pub fn spawn_purge_task(store: PostgresSessionStore, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::debug!("Purged {} evicted sessions", n),
                Err(e) => tracing::warn!("Session purge failed: {}", e),
            }
        }
    })
}
