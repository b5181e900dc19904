//! Authentication and session management

pub mod hash;
pub mod identity;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod service;
pub mod session;

pub use hash::CredentialHasher;
pub use identity::{IdentityStore, MemoryIdentityStore};
pub use jwt::{AccessClaims, TokenCodec};
pub use middleware::{age_gate, bearer_token, identify, require_admin};
pub use models::{ContentView, Session, TokenPair, User, UserInfo, UserRole};
pub use service::AuthService;
pub use session::{MemorySessionStore, SessionStore};
