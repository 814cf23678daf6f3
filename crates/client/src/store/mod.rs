//! Session/cart store.
//!
//! [`Store`] is the explicit session object handed to every caller: a cheap
//! `Clone` handle over shared state. Every action is one backend request
//! whose answer replaces local state. There is no optimistic update, no
//! rollback and no retry.
//!
//! # Cart ordering
//!
//! Cart requests are numbered when issued. A response is applied only if no
//! later-issued cart request has been applied already, so a slow
//! `increase_qty` answer cannot overwrite the result of a `decrease_qty`
//! issued after it. Stale answers are still returned to their caller.
//!
//! Sign-out starts a new session generation. Cart, profile and sign-in
//! answers requested under an earlier generation never reach the session.
//!
//! # Submodules
//!
//! - `cart` - cart reads and mutations, checkout
//! - `catalog` - products and reviews
//! - `admin` - order management, product and review moderation
//! - `branding` - logo and banner uploads

mod admin;
mod branding;
mod cart;
mod catalog;

pub use branding::{Logo, Upload};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use cartwheel_core::{Cart, Credentials, SignUpForm, User, UserId, UserRole};
use reqwest::Method;
use secrecy::SecretString;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::api::{ApiClient, SignInResponse};
use crate::cache::ProductCache;
use crate::config::ClientConfig;
use crate::error::{ClientError, action};
use crate::session::Session;
use crate::token_store::{FileTokenStore, PersistedSession, TokenStore};

// =============================================================================
// Store
// =============================================================================

/// Handle to the storefront session.
///
/// Clones share the same session, token and product cache.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    api: ApiClient,
    tokens: Box<dyn TokenStore>,
    /// Bearer token, loaded from `tokens` or set by sign-in
    token: RwLock<Option<SecretString>>,
    state: RwLock<State>,
    /// Sequence number of the most recently issued cart request
    cart_issued: AtomicU64,
    products: ProductCache,
}

#[derive(Default)]
struct State {
    session: Session,
    /// Sequence number of the cart request whose answer is in `session.cart`
    cart_applied: u64,
    /// Bumped by every sign-out
    generation: u64,
}

impl Store {
    /// Create a store persisting its session through `tokens`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, tokens: impl TokenStore + 'static) -> Result<Self, ClientError> {
        Ok(Self {
            inner: Arc::new(StoreInner {
                api: ApiClient::new(config)?,
                tokens: Box::new(tokens),
                token: RwLock::new(None),
                state: RwLock::new(State::default()),
                cart_issued: AtomicU64::new(0),
                products: ProductCache::new(config.product_cache_ttl),
            }),
        })
    }

    /// Create a store persisting its session to `config.session_file`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(config, FileTokenStore::new(config.session_file.clone()))
    }

    // =========================================================================
    // State Access
    // =========================================================================

    /// Snapshot of the current session.
    pub async fn session(&self) -> Session {
        self.inner.state.read().await.session.clone()
    }

    /// Whether a token is held.
    pub async fn is_authenticated(&self) -> bool {
        self.inner.state.read().await.session.is_authenticated
    }

    /// Profile of the signed-in user, once fetched.
    pub async fn user(&self) -> Option<User> {
        self.inner.state.read().await.session.user.clone()
    }

    /// Role of the signed-in user.
    pub async fn user_role(&self) -> Option<UserRole> {
        self.inner.state.read().await.session.user_role.clone()
    }

    /// Cart as the backend last answered it.
    pub async fn cart(&self) -> Cart {
        self.inner.state.read().await.session.cart.clone()
    }

    /// Replace the cached user profile without a request.
    pub async fn set_user(&self, user: User) {
        self.inner.state.write().await.session.apply_user(user);
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Sign in with email and password.
    ///
    /// On success the token, role and user id are persisted and the session
    /// becomes authenticated. A failed sign-in leaves the session untouched.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::SignInFailed` if the backend rejects the
    /// credentials, `ClientError::MissingToken` if it accepts them without
    /// issuing a token, and `ClientError::Storage` if the session cannot be
    /// persisted.
    #[instrument(skip(self, credentials), fields(email = %credentials.email()))]
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<User, ClientError> {
        let generation = self.generation().await;
        let request = self
            .inner
            .api
            .request(Method::POST, &["users", "signin"], None)?
            .json(credentials);

        let response: SignInResponse = self
            .inner
            .api
            .send_json(request, action::SIGN_IN)
            .await
            .map_err(into_sign_in_failure)?;

        let user = self.establish(generation, response).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "Signed in");
        Ok(user)
    }

    /// Create an account and sign in as it.
    ///
    /// # Errors
    ///
    /// Same as [`Self::sign_in`].
    #[instrument(skip(self, form), fields(email = %form.email()))]
    pub async fn sign_up(&self, form: &SignUpForm) -> Result<User, ClientError> {
        let generation = self.generation().await;
        let request = self
            .inner
            .api
            .request(Method::POST, &["users", "signup"], None)?
            .json(form);

        let response: SignInResponse = self
            .inner
            .api
            .send_json(request, action::SIGN_UP)
            .await
            .map_err(into_sign_in_failure)?;

        let user = self.establish(generation, response).await?;
        tracing::info!(user_id = %user.id, "Signed up");
        Ok(user)
    }

    /// Persist a sign-in answer and make the session authenticated.
    ///
    /// The state lock is held throughout so a concurrent sign-out either
    /// precedes this entirely or clears what it wrote.
    async fn establish(
        &self,
        generation: u64,
        response: SignInResponse,
    ) -> Result<User, ClientError> {
        let token = response
            .token
            .filter(|token| !token.is_empty())
            .map(SecretString::from)
            .ok_or(ClientError::MissingToken)?;
        let user = response.user;

        let mut state = self.inner.state.write().await;
        if state.generation != generation {
            tracing::debug!(user_id = %user.id, "Discarding sign-in answer after sign-out");
            return Err(ClientError::SignedOut);
        }

        self.inner.tokens.save(&PersistedSession {
            token: token.clone(),
            user_role: Some(user.role.clone()),
            user_id: Some(user.id.clone()),
        })?;
        *self.inner.token.write().await = Some(token);

        state.session.is_authenticated = true;
        state.session.apply_user(user.clone());
        Ok(user)
    }

    /// Sign out: clear the session and the persisted token.
    ///
    /// Unconditional and local; no request is made. Cart, profile and
    /// sign-in answers still in flight are discarded when they arrive.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        let mut state = self.inner.state.write().await;
        state.generation += 1;

        if let Err(e) = self.inner.tokens.clear() {
            tracing::error!(error = %e, "Failed to remove persisted session");
        }
        *self.inner.token.write().await = None;

        state.session = Session::default();
        state.cart_applied = self.inner.cart_issued.load(Ordering::SeqCst);
        tracing::info!("Signed out");
    }

    /// Resume a persisted session.
    ///
    /// With a stored token the session becomes authenticated and the role is
    /// restored. When the role was never stored but the user id was, the
    /// profile is fetched to recover it. Nothing here fails: problems are
    /// logged and leave the session signed out or partially restored.
    #[instrument(skip(self))]
    pub async fn initialize(&self) {
        let generation = self.generation().await;
        let persisted = match self.inner.tokens.load() {
            Ok(Some(persisted)) => persisted,
            Ok(None) => return,
            Err(e) => {
                tracing::error!(error = %e, "Error initializing store");
                return;
            }
        };

        {
            let mut state = self.inner.state.write().await;
            if state.generation != generation {
                return;
            }
            *self.inner.token.write().await = Some(persisted.token);
            state.session.is_authenticated = true;
            state.session.user_id.clone_from(&persisted.user_id);
            state.session.user_role.clone_from(&persisted.user_role);
        }
        tracing::debug!(role = ?persisted.user_role, "Restored persisted session");

        if persisted.user_role.is_none()
            && let Some(user_id) = persisted.user_id
        {
            self.fetch_user_profile(&user_id).await;
        }
    }

    /// Resume a persisted session and load the current user and their cart.
    ///
    /// Returns the current user when both the token and `GET /users/me`
    /// succeed. A failed cart fetch is logged and does not affect the result.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Option<User> {
        self.initialize().await;
        if !self.is_authenticated().await {
            return None;
        }

        let user = match self.fetch_current_user().await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(error = %e, "Error initializing store");
                return None;
            }
        };

        if let Err(e) = self.fetch_cart(&user.id).await {
            tracing::error!(error = %e, user_id = %user.id, "Get user cart failed");
        }
        Some(user)
    }

    /// Load the profile behind the held token (`GET /users/me`).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::MissingToken` without a token, otherwise the
    /// request error.
    #[instrument(skip(self))]
    pub async fn fetch_current_user(&self) -> Result<User, ClientError> {
        let generation = self.generation().await;
        let token = self.require_token().await?;
        let request = self
            .inner
            .api
            .request(Method::GET, &["users", "me"], Some(&token))?;
        let user: User = self
            .inner
            .api
            .send_json(request, action::FETCH_CURRENT_USER)
            .await?;

        let mut state = self.inner.state.write().await;
        if state.generation == generation {
            state.session.apply_user(user.clone());
        } else {
            tracing::debug!(user_id = %user.id, "Discarding profile answer after sign-out");
        }
        Ok(user)
    }

    /// Fetch a user profile, failing open.
    ///
    /// Returns `None` (and logs) on any error rather than propagating it. On
    /// success the profile, its id and its role replace the session's, unless
    /// the session was signed out meanwhile.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn fetch_user_profile(&self, user_id: &UserId) -> Option<User> {
        let generation = {
            let mut state = self.inner.state.write().await;
            state.session.loading_user = true;
            state.generation
        };

        let token = self.token().await;
        let result = async {
            let request = self.inner.api.request(
                Method::GET,
                &["users", user_id.as_str()],
                token.as_ref(),
            )?;
            self.inner
                .api
                .send_json::<User>(request, action::FETCH_PROFILE)
                .await
        }
        .await;

        let mut state = self.inner.state.write().await;
        let current = state.generation == generation;
        if current {
            state.session.loading_user = false;
        }
        match result {
            Ok(user) => {
                if current {
                    state.session.apply_user(user.clone());
                } else {
                    tracing::debug!("Discarding profile answer after sign-out");
                }
                Some(user)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch user profile");
                None
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// The held bearer token, if any.
    async fn token(&self) -> Option<SecretString> {
        self.inner.token.read().await.clone()
    }

    /// The held bearer token, or `MissingToken`.
    async fn require_token(&self) -> Result<SecretString, ClientError> {
        self.token().await.ok_or(ClientError::MissingToken)
    }

    /// Current session generation, captured before a request is sent.
    async fn generation(&self) -> u64 {
        self.inner.state.read().await.generation
    }

    /// Number a cart request at issue time.
    fn next_cart_seq(&self) -> u64 {
        self.inner.cart_issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply a cart answer unless a later-issued one is already applied.
    async fn apply_cart(&self, seq: u64, cart: &Cart) -> bool {
        let mut state = self.inner.state.write().await;
        if seq <= state.cart_applied {
            tracing::debug!(
                seq,
                applied = state.cart_applied,
                "Discarding stale cart response"
            );
            return false;
        }
        state.cart_applied = seq;
        state.session.cart = cart.clone();
        true
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("api", &self.inner.api)
            .finish_non_exhaustive()
    }
}

/// Any rejection of a sign-in request is reported as `SignInFailed`.
fn into_sign_in_failure(error: ClientError) -> ClientError {
    match error {
        ClientError::RequestFailed { status, .. } => ClientError::SignInFailed { status },
        other => other,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;
    use crate::token_store::MemoryTokenStore;

    // Nothing listens on the discard port, so any request fails fast.
    const UNREACHABLE: &str = "http://127.0.0.1:9";

    fn store_with(tokens: MemoryTokenStore) -> Store {
        let config = ClientConfig::new(UNREACHABLE).unwrap();
        Store::new(&config, tokens).unwrap()
    }

    fn persisted(role: Option<UserRole>) -> PersistedSession {
        PersistedSession {
            token: SecretString::from("jwt".to_owned()),
            user_role: role,
            user_id: Some(UserId::new("u1")),
        }
    }

    #[tokio::test]
    async fn test_initialize_without_token_stays_signed_out() {
        let store = store_with(MemoryTokenStore::new());
        store.initialize().await;
        assert_eq!(store.session().await, Session::default());
    }

    #[tokio::test]
    async fn test_initialize_restores_token_and_role() {
        let store = store_with(MemoryTokenStore::with_session(&persisted(Some(
            UserRole::Admin,
        ))));
        store.initialize().await;

        let session = store.session().await;
        assert!(session.is_authenticated);
        assert!(session.is_admin());
        assert_eq!(session.user_id, Some(UserId::new("u1")));
        assert_eq!(store.token().await.unwrap().expose_secret(), "jwt");
    }

    #[tokio::test]
    async fn test_initialize_without_role_fails_open_on_profile() {
        let store = store_with(MemoryTokenStore::with_session(&persisted(None)));
        store.initialize().await;

        let session = store.session().await;
        assert!(session.is_authenticated);
        assert!(session.user.is_none());
        assert!(!session.loading_user);
    }

    #[tokio::test]
    async fn test_sign_out_is_unconditional() {
        let tokens = MemoryTokenStore::with_session(&persisted(Some(UserRole::User)));
        let store = store_with(tokens);
        store.initialize().await;

        store.sign_out().await;
        assert_eq!(store.session().await, Session::default());
        assert!(store.token().await.is_none());

        // Signing out twice is harmless
        store.sign_out().await;
        assert!(!store.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_stale_cart_answers_are_discarded() {
        let store = store_with(MemoryTokenStore::new());
        let older = store.next_cart_seq();
        let newer = store.next_cart_seq();

        let newer_cart: Cart =
            serde_json::from_str(r#"{"items":[{"product":"p1","quantity":1}]}"#).unwrap();
        let older_cart: Cart =
            serde_json::from_str(r#"{"items":[{"product":"p1","quantity":2}]}"#).unwrap();

        assert!(store.apply_cart(newer, &newer_cart).await);
        assert!(!store.apply_cart(older, &older_cart).await);
        assert_eq!(store.cart().await, newer_cart);
    }

    #[tokio::test]
    async fn test_sign_out_discards_in_flight_cart_answers() {
        let store = store_with(MemoryTokenStore::new());
        let in_flight = store.next_cart_seq();
        store.sign_out().await;

        let cart: Cart =
            serde_json::from_str(r#"{"items":[{"product":"p1","quantity":1}]}"#).unwrap();
        assert!(!store.apply_cart(in_flight, &cart).await);
        assert!(store.cart().await.is_empty());
    }

    #[tokio::test]
    async fn test_sign_out_starts_new_generation() {
        let store = store_with(MemoryTokenStore::new());
        let before = store.generation().await;

        store.sign_out().await;
        assert_eq!(store.generation().await, before + 1);

        let response: SignInResponse = serde_json::from_str(
            r#"{"user":{"_id":"u1","name":"Ada","email":"ada@example.com","role":"admin"},"token":"jwt"}"#,
        )
        .unwrap();
        let err = store.establish(before, response).await.unwrap_err();
        assert!(matches!(err, ClientError::SignedOut));
        assert_eq!(store.session().await, Session::default());
        assert!(store.token().await.is_none());
    }

    #[test]
    fn test_rejected_sign_in_maps_to_sign_in_failed() {
        let err = into_sign_in_failure(ClientError::RequestFailed {
            action: action::SIGN_IN,
            status: 401,
        });
        assert!(matches!(err, ClientError::SignInFailed { status: 401 }));

        let passthrough = into_sign_in_failure(ClientError::MissingToken);
        assert!(matches!(passthrough, ClientError::MissingToken));
    }
}
