//! Sign-up, sign-in, refresh, access checks and logout.
//!
//! `AuthService` holds no mutable state of its own: users and sessions live
//! behind the [`IdentityStore`] and [`SessionStore`] traits, so a single
//! instance can be cloned into every request handler. Each session write
//! replaces the user's previous one, which is what makes refresh tokens
//! single-use and logout immediate.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::hash::CredentialHasher;
use crate::auth::identity::IdentityStore;
use crate::auth::jwt::{AccessClaims, TokenCodec};
use crate::auth::models::{Session, TokenPair, User, UserRole};
use crate::auth::session::{deadline_after, SessionStore};
use crate::config::Config;
use crate::error::{Error, Result};

const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct AuthService {
    tokens: TokenCodec,
    hasher: CredentialHasher,
    users: Arc<dyn IdentityStore>,
    sessions: Arc<dyn SessionStore>,
    storage_timeout: Duration,
}

impl AuthService {
    pub fn new(
        tokens: TokenCodec,
        hasher: CredentialHasher,
        users: Arc<dyn IdentityStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            tokens,
            hasher,
            users,
            sessions,
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
        }
    }

    pub fn from_config(
        config: &Config,
        users: Arc<dyn IdentityStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self::new(
            TokenCodec::from_config(&config.tokens),
            CredentialHasher::new(config.hash.cost),
            users,
            sessions,
        )
        .with_storage_timeout(config.storage.timeout())
    }

    /// Bound every identity/session store call by `timeout`
    pub fn with_storage_timeout(mut self, timeout: Duration) -> Self {
        self.storage_timeout = timeout;
        self
    }

    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }

    /// Register a regular user
    pub async fn sign_up(
        &self,
        username: &str,
        name: &str,
        age: u8,
        password: &str,
    ) -> Result<String> {
        self.register(username, name, age, password, UserRole::User).await
    }

    /// Register a user with an explicit role
    pub async fn register(
        &self,
        username: &str,
        name: &str,
        age: u8,
        password: &str,
        role: UserRole,
    ) -> Result<String> {
        let password_hash = self.hasher.hash_blocking(password.to_string()).await?;
        let user = User::new(
            username.to_string(),
            name.to_string(),
            role,
            age,
            password_hash,
        );

        self.bounded(self.users.create(&user)).await
    }

    /// Check the password and open a fresh session.
    ///
    /// An unknown username and a wrong password both fail with
    /// `InvalidCredentials`.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<TokenPair> {
        let user = match self.bounded(self.users.get_by_username(username)).await {
            Ok(user) => user,
            Err(Error::NotFound(_)) => return Err(Error::InvalidCredentials),
            Err(e) => return Err(e),
        };

        let matches = self
            .hasher
            .verify_blocking(user.password_hash.clone(), password.to_string())
            .await?;
        if !matches {
            return Err(Error::InvalidCredentials);
        }

        self.create_session(&user.id, user.role, user.age).await
    }

    /// Issue a new token pair and store its session, replacing any prior one
    pub async fn create_session(&self, user_id: &str, role: UserRole, age: u8) -> Result<TokenPair> {
        let access_token = self.tokens.issue_access(user_id, role, age)?;
        let refresh_token = self.tokens.issue_refresh()?;
        let refresh_token_hash = self.hasher.hash_blocking(refresh_token.clone()).await?;

        let ttl = self.tokens.refresh_ttl();
        let session = Session::new(user_id.to_string(), refresh_token_hash, deadline_after(ttl));
        self.bounded(self.sessions.put(&session, ttl)).await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Trade a (possibly expired) access token and the current refresh token
    /// for a new pair. The presented refresh token is dead afterwards.
    pub async fn refresh(&self, access_token: &str, refresh_token: &str) -> Result<TokenPair> {
        let claims = self.tokens.parse_access_ignoring_expiry(access_token)?;
        let session = self.bounded(self.sessions.get(&claims.sub)).await?;

        let matches = self
            .hasher
            .verify_blocking(session.refresh_token_hash.clone(), refresh_token.to_string())
            .await?;
        if !matches {
            return Err(Error::InvalidRefreshToken);
        }

        if session.is_expired() {
            return Err(Error::RefreshTokenExpired);
        }

        // Role and age come from the stored user, not the presented claims
        let user = self.bounded(self.users.get_by_id(&session.user_id)).await?;
        self.create_session(&user.id, user.role, user.age).await
    }

    /// Verify signature and expiry without touching storage
    pub fn parse_access_token(&self, access_token: &str) -> Result<AccessClaims> {
        self.tokens.parse_access(access_token)
    }

    /// Succeeds while the user has a live session
    pub async fn check(&self, user_id: &str) -> Result<()> {
        self.bounded(self.sessions.get(user_id)).await.map(|_| ())
    }

    /// Full request identification: a valid access token whose owner is
    /// still signed in
    pub async fn authenticate(&self, access_token: &str) -> Result<AccessClaims> {
        let claims = self.tokens.parse_access(access_token)?;
        self.check(&claims.sub).await?;
        Ok(claims)
    }

    pub async fn log_out(&self, user_id: &str) -> Result<()> {
        self.bounded(self.sessions.delete(user_id)).await
    }

    pub async fn user(&self, user_id: &str) -> Result<User> {
        self.bounded(self.users.get_by_id(user_id)).await
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.storage_timeout, call)
            .await
            .map_err(|_| Error::Timeout(self.storage_timeout))?
    }
}
