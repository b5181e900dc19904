//! PostgreSQL-backed stores

pub mod postgres;
pub mod sessions;

pub use postgres::{connect, migrate, PostgresIdentityStore};
pub use sessions::{spawn_purge_task, PostgresSessionStore};
