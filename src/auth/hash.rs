//! One-way hashing for passwords and refresh tokens

use crate::error::{Error, Result};

/// Salted bcrypt hashing with a fixed work factor.
///
/// Each call to [`CredentialHasher::hash`] draws a fresh salt, so the same
/// secret never hashes to the same string twice; verification reads the salt
/// and cost back out of the stored hash.
#[derive(Debug, Clone, Copy)]
pub struct CredentialHasher {
    cost: u32,
}

impl CredentialHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, secret: &str) -> Result<String> {
        Ok(bcrypt::hash(secret, self.cost)?)
    }

    /// True iff `secret` matches `hashed`. A malformed hash is a mismatch.
    pub fn verify(&self, hashed: &str, secret: &str) -> bool {
        bcrypt::verify(secret, hashed).unwrap_or(false)
    }

    /// [`hash`](Self::hash) on the blocking pool
    pub async fn hash_blocking(&self, secret: String) -> Result<String> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .map_err(|e| Error::Other(format!("hashing task failed: {}", e)))?
    }

    /// [`verify`](Self::verify) on the blocking pool
    pub async fn verify_blocking(&self, hashed: String, secret: String) -> Result<bool> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.verify(&hashed, &secret))
            .await
            .map_err(|e| Error::Other(format!("verification task failed: {}", e)))
    }
}
