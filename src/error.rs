//! Error types for authkeep

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Storage call timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Username '{0}' is already taken")]
    Conflict(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Refresh token expired")]
    RefreshTokenExpired,

    #[error("Token signature or algorithm mismatch")]
    BadSignature,

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Access token expired")]
    Expired,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// HTTP status the request layer answers with for this error.
    ///
    /// Every lookup miss on the auth surface is a session or credential miss,
    /// so `NotFound` is reported as 401 rather than 404.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound(_)
            | Error::InvalidCredentials
            | Error::InvalidRefreshToken
            | Error::RefreshTokenExpired
            | Error::BadSignature
            | Error::Malformed(_)
            | Error::Expired
            | Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self);
        }

        // Storage and internal details stay in the logs.
        let message = if status.is_server_error() {
            "internal error".to_string()
        } else {
            self.to_string()
        };

        let body = crate::api::routes::ApiResponse::<()>::err(message);
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
