//! Sign-up, sign-in, refresh and logout scenarios against in-memory stores

use std::sync::Arc;
use std::time::Duration;

use authkeep::auth::{
    AuthService, CredentialHasher, MemoryIdentityStore, MemorySessionStore, SessionStore,
    TokenCodec, UserRole,
};
use authkeep::Error;

const SECRET: &[u8] = b"integration-secret";

struct Harness {
    auth: AuthService,
    sessions: MemorySessionStore,
}

fn harness(access_ttl: Duration) -> Harness {
    let sessions = MemorySessionStore::new();
    let auth = AuthService::new(
        TokenCodec::new(SECRET, access_ttl, Duration::from_secs(3600), 32),
        CredentialHasher::new(4),
        Arc::new(MemoryIdentityStore::new()),
        Arc::new(sessions.clone()),
    );
    Harness { auth, sessions }
}

fn default_harness() -> Harness {
    harness(Duration::from_secs(900))
}

#[tokio::test]
async fn test_sign_up_then_sign_in() {
    let h = default_harness();
    let id = h.auth.sign_up("alice", "Alice", 30, "password1").await.unwrap();
    let tokens = h.auth.sign_in("alice", "password1").await.unwrap();

    assert!(!tokens.access_token.is_empty());
    assert!(!tokens.refresh_token.is_empty());

    let claims = h.auth.parse_access_token(&tokens.access_token).unwrap();
    assert_eq!(claims.sub, id);
    assert_eq!(claims.role, UserRole::User);
    assert_eq!(claims.age, 30);
    assert_eq!(claims.exp - claims.iat, 900);
}

#[tokio::test]
async fn test_duplicate_sign_up_conflicts() {
    let h = default_harness();
    h.auth.sign_up("alice", "Alice", 30, "password1").await.unwrap();

    let result = h.auth.sign_up("alice", "Other", 40, "password2").await;
    assert!(matches!(result, Err(Error::Conflict(_))));
}

#[tokio::test]
async fn test_wrong_password_is_invalid_credentials() {
    let h = default_harness();
    h.auth.sign_up("alice", "Alice", 30, "password1").await.unwrap();

    for (username, password) in [("alice", "password2"), ("alice", ""), ("nobody", "password1")] {
        let result = h.auth.sign_in(username, password).await;
        assert!(
            matches!(result, Err(Error::InvalidCredentials)),
            "{}/{} gave {:?}",
            username,
            password,
            result
        );
    }
    assert_eq!(h.sessions.session_count().await, 0);
}

#[tokio::test]
async fn test_check_follows_session_lifecycle() {
    let h = default_harness();
    let id = h.auth.sign_up("alice", "Alice", 30, "password1").await.unwrap();

    assert!(matches!(h.auth.check(&id).await, Err(Error::NotFound(_))));

    h.auth.create_session(&id, UserRole::User, 30).await.unwrap();
    h.auth.check(&id).await.unwrap();

    h.auth.log_out(&id).await.unwrap();
    assert!(matches!(h.auth.check(&id).await, Err(Error::NotFound(_))));

    // Logging out twice is fine
    h.auth.log_out(&id).await.unwrap();
}

#[tokio::test]
async fn test_logout_revokes_unexpired_access_token() {
    let h = default_harness();
    let id = h.auth.sign_up("alice", "Alice", 30, "password1").await.unwrap();
    let tokens = h.auth.sign_in("alice", "password1").await.unwrap();

    assert_eq!(h.auth.authenticate(&tokens.access_token).await.unwrap().sub, id);

    h.auth.log_out(&id).await.unwrap();

    // Still cryptographically valid, but no longer accepted
    assert!(h.auth.parse_access_token(&tokens.access_token).is_ok());
    assert!(matches!(
        h.auth.authenticate(&tokens.access_token).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_refresh_rotates_tokens() {
    let h = default_harness();
    h.auth.sign_up("alice", "Alice", 30, "password1").await.unwrap();
    let first = h.auth.sign_in("alice", "password1").await.unwrap();

    let second = h
        .auth
        .refresh(&first.access_token, &first.refresh_token)
        .await
        .unwrap();
    assert_ne!(second.refresh_token, first.refresh_token);

    // The old refresh token died with the rotation
    let reused = h
        .auth
        .refresh(&second.access_token, &first.refresh_token)
        .await;
    assert!(matches!(reused, Err(Error::InvalidRefreshToken)));

    let reused_with_old_access = h
        .auth
        .refresh(&first.access_token, &first.refresh_token)
        .await;
    assert!(matches!(reused_with_old_access, Err(Error::InvalidRefreshToken)));

    // The new one still works
    h.auth
        .refresh(&second.access_token, &second.refresh_token)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_refresh_accepts_expired_access_token() {
    let h = harness(Duration::ZERO);
    let id = h.auth.sign_up("alice", "Alice", 30, "password1").await.unwrap();
    let tokens = h.auth.sign_in("alice", "password1").await.unwrap();

    assert!(matches!(
        h.auth.parse_access_token(&tokens.access_token),
        Err(Error::Expired)
    ));
    assert!(matches!(
        h.auth.authenticate(&tokens.access_token).await,
        Err(Error::Expired)
    ));

    let renewed = h
        .auth
        .refresh(&tokens.access_token, &tokens.refresh_token)
        .await
        .unwrap();
    let claims = h
        .auth
        .tokens()
        .parse_access_ignoring_expiry(&renewed.access_token)
        .unwrap();
    assert_eq!(claims.sub, id);
}

#[tokio::test]
async fn test_refresh_after_session_expiry() {
    let h = default_harness();
    let id = h.auth.sign_up("alice", "Alice", 30, "password1").await.unwrap();
    let tokens = h.auth.sign_in("alice", "password1").await.unwrap();

    // Keep the record in the store but move its absolute expiry into the past
    let mut session = h.sessions.get(&id).await.unwrap();
    session.expires_at = chrono::Utc::now() - chrono::Duration::seconds(1);
    h.sessions
        .put(&session, Duration::from_secs(3600))
        .await
        .unwrap();

    let result = h
        .auth
        .refresh(&tokens.access_token, &tokens.refresh_token)
        .await;
    assert!(matches!(result, Err(Error::RefreshTokenExpired)));
}

#[tokio::test]
async fn test_refresh_checks_hash_before_expiry() {
    let h = default_harness();
    let id = h.auth.sign_up("alice", "Alice", 30, "password1").await.unwrap();
    let tokens = h.auth.sign_in("alice", "password1").await.unwrap();

    let mut session = h.sessions.get(&id).await.unwrap();
    session.expires_at = chrono::Utc::now() - chrono::Duration::seconds(1);
    h.sessions
        .put(&session, Duration::from_secs(3600))
        .await
        .unwrap();

    let result = h.auth.refresh(&tokens.access_token, "not-the-token").await;
    assert!(matches!(result, Err(Error::InvalidRefreshToken)));
}

#[tokio::test]
async fn test_refresh_without_session() {
    let h = default_harness();
    let id = h.auth.sign_up("alice", "Alice", 30, "password1").await.unwrap();
    let tokens = h.auth.sign_in("alice", "password1").await.unwrap();
    h.auth.log_out(&id).await.unwrap();

    let result = h
        .auth
        .refresh(&tokens.access_token, &tokens.refresh_token)
        .await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_refresh_rejects_foreign_or_garbled_access_token() {
    let h = default_harness();
    h.auth.sign_up("alice", "Alice", 30, "password1").await.unwrap();
    let tokens = h.auth.sign_in("alice", "password1").await.unwrap();

    let foreign = TokenCodec::new(b"someone-else", Duration::from_secs(60), Duration::ZERO, 32)
        .issue_access("alice-id", UserRole::Admin, 30)
        .unwrap();

    assert!(matches!(
        h.auth.refresh(&foreign, &tokens.refresh_token).await,
        Err(Error::BadSignature)
    ));
    assert!(matches!(
        h.auth.refresh("garbage", &tokens.refresh_token).await,
        Err(Error::Malformed(_))
    ));
}

#[tokio::test]
async fn test_sign_in_replaces_previous_session() {
    let h = default_harness();
    h.auth.sign_up("alice", "Alice", 30, "password1").await.unwrap();
    let first = h.auth.sign_in("alice", "password1").await.unwrap();
    let second = h.auth.sign_in("alice", "password1").await.unwrap();

    assert_eq!(h.sessions.session_count().await, 1);
    assert!(matches!(
        h.auth
            .refresh(&first.access_token, &first.refresh_token)
            .await,
        Err(Error::InvalidRefreshToken)
    ));
    h.auth
        .refresh(&second.access_token, &second.refresh_token)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_refresh_token_never_stored_in_plaintext() {
    let h = default_harness();
    let id = h.auth.sign_up("alice", "Alice", 30, "password1").await.unwrap();
    let tokens = h.auth.sign_in("alice", "password1").await.unwrap();

    let session = h.sessions.get(&id).await.unwrap();
    assert_eq!(session.user_id, id);
    assert_ne!(session.refresh_token_hash, tokens.refresh_token);
    assert!(CredentialHasher::new(4).verify(&session.refresh_token_hash, &tokens.refresh_token));
}

#[tokio::test]
async fn test_admin_role_carried_in_claims() {
    let h = default_harness();
    h.auth
        .register("root", "Root", 40, "password1", UserRole::Admin)
        .await
        .unwrap();
    let tokens = h.auth.sign_in("root", "password1").await.unwrap();

    let claims = h.auth.authenticate(&tokens.access_token).await.unwrap();
    assert!(claims.is_admin());
}
