//! Authentication models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Age at which the full view opens up
pub const ADULT_AGE: u8 = 18;

/// Oldest age a user can register with
pub const MAX_AGE: u8 = 111;

/// User roles for authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular account
    User,
    /// Administrator
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::User => write!(f, "user"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for UserRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            other => Err(Error::Other(format!("unknown role '{}'", other))),
        }
    }
}

/// A registered account. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    /// Display name
    pub name: String,
    pub role: UserRole,
    pub age: u8,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a new user with a fresh id
    pub fn new(
        username: String,
        name: String,
        role: UserRole,
        age: u8,
        password_hash: String,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            name,
            role,
            age,
            password_hash,
            created_at: Utc::now(),
        }
    }
}

/// The single active session of a user.
///
/// Stored as JSON under the owning user's id; only the refresh token's hash
/// is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub refresh_token_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: String, refresh_token_hash: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            refresh_token_hash,
            expires_at,
        }
    }

    /// Past its absolute expiry, whether or not the store has evicted it yet
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Plaintext tokens handed back to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// What an identified caller is allowed to see, decided by age alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentView {
    Restricted,
    Full,
}

impl ContentView {
    pub fn for_age(age: u8) -> Self {
        if age < ADULT_AGE {
            return ContentView::Restricted;
        }
        ContentView::Full
    }
}

/// User information in responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub name: String,
    pub role: UserRole,
    pub age: u8,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            role: user.role,
            age: user.age,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_text() {
        for role in [UserRole::User, UserRole::Admin] {
            assert_eq!(role.to_string().parse::<UserRole>().unwrap(), role);
        }
        assert!("viewer".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_minor_gets_restricted_view() {
        assert_eq!(ContentView::for_age(0), ContentView::Restricted);
        assert_eq!(ContentView::for_age(ADULT_AGE - 1), ContentView::Restricted);
    }

    #[test]
    fn test_adult_gets_full_view() {
        assert_eq!(ContentView::for_age(ADULT_AGE), ContentView::Full);
        assert_eq!(ContentView::for_age(MAX_AGE), ContentView::Full);
    }

    #[test]
    fn test_session_json_shape() {
        let session = Session::new(
            "user-1".to_string(),
            "$2b$04$hash".to_string(),
            Utc::now(),
        );
        let raw = session.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(value["user_id"], "user-1");
        assert_eq!(value["refresh_token_hash"], "$2b$04$hash");
        assert!(value.get("id").is_some());
        assert!(value.get("expires_at").is_some());
        assert_eq!(Session::from_json(&raw).unwrap(), session);
    }

    #[test]
    fn test_user_info_drops_hash() {
        let user = User::new(
            "alice".to_string(),
            "Alice".to_string(),
            UserRole::User,
            30,
            "hash".to_string(),
        );
        let info = serde_json::to_value(UserInfo::from(user)).unwrap();
        assert!(info.get("password_hash").is_none());
        assert_eq!(info["role"], "user");
    }
}
