//! JWT access tokens and opaque refresh tokens

use base64::{engine::general_purpose::STANDARD, Engine as _};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::auth::models::{ContentView, UserRole};
use crate::config::TokensConfig;
use crate::error::{Error, Result};

const ALGORITHM: Algorithm = Algorithm::HS512;

/// Claims carried inside an access token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,
    pub role: UserRole,
    pub age: u8,
    /// Issued at, unix seconds
    pub iat: i64,
    /// Expiration time, unix seconds
    pub exp: i64,
}

impl AccessClaims {
    pub fn user_id(&self) -> &str {
        &self.sub
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn view(&self) -> ContentView {
        ContentView::for_age(self.age)
    }

    /// A token is unusable from its `exp` second onward
    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp() >= self.exp
    }
}

/// Issues and verifies tokens with a secret fixed at construction
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
    refresh_bytes: usize,
}

impl TokenCodec {
    pub fn new(
        secret_key: &[u8],
        access_ttl: Duration,
        refresh_ttl: Duration,
        refresh_bytes: usize,
    ) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked against the claims after decoding so the refresh
        // flow can still read an expired token.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret_key),
            decoding_key: DecodingKey::from_secret(secret_key),
            validation,
            access_ttl,
            refresh_ttl,
            refresh_bytes,
        }
    }

    pub fn from_config(config: &TokensConfig) -> Self {
        Self::new(
            config.secret_key.as_bytes(),
            config.access_ttl(),
            config.refresh_ttl(),
            config.refresh_token_bytes,
        )
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Sign a new access token for the given identity
    pub fn issue_access(&self, user_id: &str, role: UserRole, age: u8) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let exp = i64::try_from(self.access_ttl.as_secs())
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or_else(|| {
                Error::Other(format!("access token TTL {:?} is out of range", self.access_ttl))
            })?;
        let claims = AccessClaims {
            sub: user_id.to_string(),
            role,
            age,
            iat: now,
            exp,
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| Error::Other(format!("Failed to create token: {}", e)))
    }

    /// Verify signature and expiry
    pub fn parse_access(&self, token: &str) -> Result<AccessClaims> {
        let claims = self.decode_claims(token)?;
        if claims.is_expired() {
            return Err(Error::Expired);
        }
        Ok(claims)
    }

    /// Verify the signature only; an expired token still yields its claims
    pub fn parse_access_ignoring_expiry(&self, token: &str) -> Result<AccessClaims> {
        self.decode_claims(token)
    }

    /// Fresh random refresh token, base64 encoded
    pub fn issue_refresh(&self) -> Result<String> {
        let bytes: Vec<u8> = (0..self.refresh_bytes).map(|_| rand::random::<u8>()).collect();
        Ok(STANDARD.encode(bytes))
    }

    fn decode_claims(&self, token: &str) -> Result<AccessClaims> {
        decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName => Error::BadSignature,
                _ => Error::Malformed(e.to_string()),
            })
    }
}
