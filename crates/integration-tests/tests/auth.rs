//! Sign-in, sign-up, sign-out and session restore against the mock backend.

use std::sync::Arc;
use std::time::Duration;

use cartwheel_client::{
    ClientError, FileTokenStore, MemoryTokenStore, PersistedSession, Session, TokenStore,
};
use cartwheel_core::{Credentials, Price, SignUpForm, UserId, UserRole};
use cartwheel_integration_tests::{MockBackend, PASSWORD};
use secrecy::{ExposeSecret, SecretString};

fn credentials(email: &str, password: &str) -> Credentials {
    Credentials::new(email, SecretString::from(password.to_owned())).expect("valid credentials")
}

// ============================================================================
// Sign In
// ============================================================================

#[tokio::test]
async fn test_sign_in_sets_session_and_persists_token() {
    let backend = MockBackend::spawn().await;
    let user_id = backend.add_user("Ada", "ada@example.com", UserRole::User);
    let (store, tokens) = backend.store();

    let user = store
        .sign_in(&credentials("ada@example.com", PASSWORD))
        .await
        .expect("sign in");
    assert_eq!(user.id, user_id);

    let session = store.session().await;
    assert!(session.is_authenticated);
    assert_eq!(session.user_id, Some(user_id.clone()));
    assert_eq!(session.user_role, Some(UserRole::User));
    assert_eq!(session.user.map(|u| u.name), Some("Ada".to_owned()));

    let persisted = tokens.load().expect("load").expect("persisted session");
    assert!(persisted.token.expose_secret().starts_with("token-"));
    assert_eq!(persisted.user_role, Some(UserRole::User));
    assert_eq!(persisted.user_id, Some(user_id));
}

#[tokio::test]
async fn test_invalid_credentials_never_authenticate() {
    let backend = MockBackend::spawn().await;
    backend.add_user("Ada", "ada@example.com", UserRole::User);
    let (store, tokens) = backend.store();

    let err = store
        .sign_in(&credentials("ada@example.com", "wrong password"))
        .await
        .expect_err("sign in should fail");
    assert!(matches!(err, ClientError::SignInFailed { status: 401 }));

    let err = store
        .sign_in(&credentials("nobody@example.com", PASSWORD))
        .await
        .expect_err("unknown account should fail");
    assert_eq!(err.status(), Some(401));

    assert_eq!(store.session().await, Session::default());
    assert!(tokens.load().expect("load").is_none());
}

#[tokio::test]
async fn test_sign_in_without_token_in_answer_fails() {
    let backend = MockBackend::spawn().await;
    backend.add_user("Ada", "ada@example.com", UserRole::User);
    backend.set_issue_tokens(false);
    let (store, tokens) = backend.store();

    let err = store
        .sign_in(&credentials("ada@example.com", PASSWORD))
        .await
        .expect_err("no token issued");
    assert!(matches!(err, ClientError::MissingToken));
    assert!(!store.is_authenticated().await);
    assert!(tokens.load().expect("load").is_none());
}

// ============================================================================
// Sign Up
// ============================================================================

#[tokio::test]
async fn test_sign_up_creates_account_and_signs_in() {
    let backend = MockBackend::spawn().await;
    let (store, _tokens) = backend.store();

    let form = SignUpForm::new(
        "Grace",
        "grace@example.com",
        SecretString::from("hunter22".to_owned()),
    )
    .expect("valid form");
    let user = store.sign_up(&form).await.expect("sign up");
    assert_eq!(user.name, "Grace");
    assert_eq!(user.role, UserRole::User);
    assert!(store.is_authenticated().await);

    // The new account can sign in from a fresh store
    let (other, _) = backend.store();
    other
        .sign_in(&credentials("grace@example.com", "hunter22"))
        .await
        .expect("sign in with new account");
}

#[tokio::test]
async fn test_sign_up_with_taken_email_fails() {
    let backend = MockBackend::spawn().await;
    backend.add_user("Ada", "ada@example.com", UserRole::User);
    let (store, _tokens) = backend.store();

    let form = SignUpForm::new(
        "Imposter",
        "ada@example.com",
        SecretString::from("whatever".to_owned()),
    )
    .expect("valid form");
    let err = store.sign_up(&form).await.expect_err("duplicate email");
    assert!(matches!(err, ClientError::SignInFailed { status: 400 }));
    assert!(!store.is_authenticated().await);
}

// ============================================================================
// Sign Out
// ============================================================================

#[tokio::test]
async fn test_sign_out_clears_everything() {
    let backend = MockBackend::spawn().await;
    backend.add_user("Ada", "ada@example.com", UserRole::Admin);
    let product = backend.add_product("Pineapple", Price::from_cents(1000));
    let (store, tokens) = backend.store();

    let user = store
        .sign_in(&credentials("ada@example.com", PASSWORD))
        .await
        .expect("sign in");
    store.add_item(&user.id, &product, 1).await.expect("add");
    let requests = backend.requests();

    store.sign_out().await;

    assert_eq!(store.session().await, Session::default());
    assert!(tokens.load().expect("load").is_none());
    // Local only
    assert_eq!(backend.requests(), requests);
    // Server keeps the cart
    assert_eq!(backend.cart_items(&user.id).len(), 1);
}

#[tokio::test]
async fn test_sign_out_when_signed_out() {
    let backend = MockBackend::spawn().await;
    let (store, tokens) = backend.store();

    store.sign_out().await;
    store.sign_out().await;

    assert_eq!(store.session().await, Session::default());
    assert!(tokens.load().expect("load").is_none());
}

#[tokio::test]
async fn test_sign_out_discards_profile_answer_in_flight() {
    let backend = MockBackend::spawn().await;
    let user_id = backend.add_user("Root", "root@example.com", UserRole::Admin);
    let (store, _tokens) = backend.store();
    store
        .sign_in(&credentials("root@example.com", PASSWORD))
        .await
        .expect("sign in");
    backend.set_user_delay(Duration::from_millis(200));

    let slow = store.fetch_user_profile(&user_id);
    let sign_out = async {
        backend.user_received().await;
        store.sign_out().await;
    };
    let (fetched, ()) = tokio::join!(slow, sign_out);

    // The caller still gets the answer, the session does not
    assert_eq!(fetched.map(|u| u.id), Some(user_id));
    let session = store.session().await;
    assert_eq!(session, Session::default());
    assert!(!session.is_admin());
}

#[tokio::test]
async fn test_sign_out_discards_current_user_in_flight() {
    let backend = MockBackend::spawn().await;
    backend.add_user("Root", "root@example.com", UserRole::Admin);
    let (store, _tokens) = backend.store();
    store
        .sign_in(&credentials("root@example.com", PASSWORD))
        .await
        .expect("sign in");
    backend.set_user_delay(Duration::from_millis(200));

    let slow = store.fetch_current_user();
    let sign_out = async {
        backend.user_received().await;
        store.sign_out().await;
    };
    let (fetched, ()) = tokio::join!(slow, sign_out);

    assert_eq!(fetched.expect("profile").name, "Root");
    assert_eq!(store.session().await, Session::default());
}

#[tokio::test]
async fn test_sign_out_during_sign_in_wins() {
    let backend = MockBackend::spawn().await;
    backend.add_user("Ada", "ada@example.com", UserRole::User);
    let (store, tokens) = backend.store();
    backend.set_user_delay(Duration::from_millis(200));

    let creds = credentials("ada@example.com", PASSWORD);
    let slow = store.sign_in(&creds);
    let sign_out = async {
        backend.user_received().await;
        store.sign_out().await;
    };
    let (result, ()) = tokio::join!(slow, sign_out);

    assert!(matches!(result, Err(ClientError::SignedOut)));
    assert_eq!(store.session().await, Session::default());
    assert!(tokens.load().expect("load").is_none());
}

// ============================================================================
// Restore
// ============================================================================

#[tokio::test]
async fn test_restore_loads_user_and_cart() {
    let backend = MockBackend::spawn().await;
    backend.add_user("Ada", "ada@example.com", UserRole::User);
    let product = backend.add_product("Pineapple", Price::from_cents(1000));

    let tokens = Arc::new(MemoryTokenStore::new());
    let first = backend.store_with(Arc::clone(&tokens));
    let user = first
        .sign_in(&credentials("ada@example.com", PASSWORD))
        .await
        .expect("sign in");
    let cart = first.add_item(&user.id, &product, 3).await.expect("add");

    // A new process sharing the same session storage
    let second = backend.store_with(Arc::clone(&tokens));
    let restored = second.restore().await.expect("restored user");

    assert_eq!(restored.id, user.id);
    let session = second.session().await;
    assert!(session.is_authenticated);
    assert_eq!(session.user.map(|u| u.email), Some("ada@example.com".to_owned()));
    assert_eq!(session.cart.items, cart.items);
}

#[tokio::test]
async fn test_restore_from_session_file() {
    let backend = MockBackend::spawn().await;
    backend.add_user("Ada", "ada@example.com", UserRole::Admin);
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("session.json");

    let first = backend.store_with(FileTokenStore::new(&path));
    first
        .sign_in(&credentials("ada@example.com", PASSWORD))
        .await
        .expect("sign in");
    assert!(path.exists());

    let second = backend.store_with(FileTokenStore::new(&path));
    let restored = second.restore().await.expect("restored user");
    assert_eq!(restored.name, "Ada");
    assert!(second.session().await.is_admin());
}

#[tokio::test]
async fn test_restore_without_session_stays_signed_out() {
    let backend = MockBackend::spawn().await;
    let (store, _tokens) = backend.store();

    assert!(store.restore().await.is_none());
    assert_eq!(store.session().await, Session::default());
    assert_eq!(backend.requests(), 0);
}

#[tokio::test]
async fn test_restore_with_rejected_token() {
    let backend = MockBackend::spawn().await;
    let tokens = MemoryTokenStore::with_session(&PersistedSession {
        token: SecretString::from("revoked".to_owned()),
        user_role: Some(UserRole::User),
        user_id: Some(UserId::new("u0001")),
    });
    let store = backend.store_with(tokens);

    assert!(store.restore().await.is_none());
    let session = store.session().await;
    assert!(session.user.is_none());
    assert!(session.cart.is_empty());
}

#[tokio::test]
async fn test_initialize_recovers_missing_role_from_profile() {
    let backend = MockBackend::spawn().await;
    let user_id = backend.add_user("Ada", "ada@example.com", UserRole::Admin);
    let token = backend.issue_token(&user_id);
    let tokens = MemoryTokenStore::with_session(&PersistedSession {
        token: SecretString::from(token),
        user_role: None,
        user_id: Some(user_id.clone()),
    });
    let store = backend.store_with(tokens);

    store.initialize().await;

    let session = store.session().await;
    assert!(session.is_authenticated);
    assert_eq!(session.user_role, Some(UserRole::Admin));
    assert_eq!(session.user.map(|u| u.id), Some(user_id));
    assert!(!session.loading_user);
}

#[tokio::test]
async fn test_fetch_user_profile_fails_open() {
    let backend = MockBackend::spawn().await;
    let (store, _tokens) = backend.store();

    // No token: the backend answers 401
    assert!(
        store
            .fetch_user_profile(&UserId::new("u0001"))
            .await
            .is_none()
    );
    assert!(!store.session().await.loading_user);
}
