//! PostgreSQL connection, schema and user records

use async_trait::async_trait;
use std::sync::Arc;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, NoTls, Row};

use crate::auth::identity::IdentityStore;
use crate::auth::models::User;
use crate::error::{Error, Result};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    name          TEXT NOT NULL,
    role          TEXT NOT NULL,
    age           SMALLINT NOT NULL CHECK (age >= 0 AND age <= 111),
    password_hash TEXT NOT NULL,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS sessions (
    user_id  TEXT PRIMARY KEY,
    payload  TEXT NOT NULL,
    evict_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS sessions_evict_at_idx ON sessions (evict_at);
"#;

/// Open a connection and drive it on a background task
pub async fn connect(conn_string: &str) -> Result<Arc<Client>> {
    let (client, connection) = tokio_postgres::connect(conn_string, NoTls).await?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("PostgreSQL connection error: {}", e);
        }
    });

    Ok(Arc::new(client))
}

/// Create tables and indexes if they are missing
pub async fn migrate(client: &Client) -> Result<()> {
    client.batch_execute(SCHEMA).await?;
    tracing::info!("Database schema is up to date");
    Ok(())
}

/// Users table
#[derive(Clone)]
pub struct PostgresIdentityStore {
    client: Arc<Client>,
}

impl PostgresIdentityStore {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }
}

fn user_from_row(row: &Row) -> Result<User> {
    let role: String = row.try_get("role")?;
    let age: i16 = row.try_get("age")?;

    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        name: row.try_get("name")?,
        role: role.parse()?,
        age: u8::try_from(age)
            .map_err(|_| Error::Other(format!("stored age {} is out of range", age)))?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl IdentityStore for PostgresIdentityStore {
    async fn create(&self, user: &User) -> Result<String> {
        let role = user.role.to_string();
        let age = i16::from(user.age);

        let inserted = self
            .client
            .execute(
                "INSERT INTO users (id, username, name, role, age, password_hash, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
                &[
                    &user.id,
                    &user.username,
                    &user.name,
                    &role,
                    &age,
                    &user.password_hash,
                    &user.created_at,
                ],
            )
            .await;

        match inserted {
            Ok(_) => Ok(user.id.clone()),
            Err(e) if e.code() == Some(&SqlState::UNIQUE_VIOLATION) => {
                Err(Error::Conflict(user.username.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<User> {
        let row = self
            .client
            .query_opt("SELECT * FROM users WHERE username = $1", &[&username])
            .await?
            .ok_or_else(|| Error::NotFound(format!("User '{}'", username)))?;
        user_from_row(&row)
    }

    async fn get_by_id(&self, id: &str) -> Result<User> {
        let row = self
            .client
            .query_opt("SELECT * FROM users WHERE id = $1", &[&id])
            .await?
            .ok_or_else(|| Error::NotFound(format!("User {}", id)))?;
        user_from_row(&row)
    }
}
