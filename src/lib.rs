//! authkeep - access/refresh token sessions for a small HTTP service
//!
//! Users sign in for a short-lived JWT access token and a long-lived opaque
//! refresh token. Each user has at most one server-side session holding the
//! hash of the current refresh token; refreshing rotates both tokens and
//! logging out deletes the session.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod storage;

pub use auth::AuthService;
pub use config::Config;
pub use error::{Error, Result};
