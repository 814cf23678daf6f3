//! Integration tests for Cartwheel.
//!
//! The tests drive a real [`cartwheel_client::Store`] against
//! [`MockBackend`], an in-process axum server that speaks the storefront REST
//! contract and keeps its data in memory. Each test spawns its own backend on
//! an ephemeral port, so tests run in parallel without shared state.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cartwheel-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `auth` - Sign in/up/out, session restore
//! - `cart` - Cart round trips, ordering of overlapping requests, checkout
//! - `catalog` - Products, reviews, derived views
//! - `admin` - Order management, moderation, branding uploads

#![cfg_attr(not(test), forbid(unsafe_code))]

mod routes;
mod state;

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use cartwheel_client::{ClientConfig, MemoryTokenStore, Store, TokenStore};
use cartwheel_core::{CartItem, Order, Price, ProductId, UserId, UserRole};
use tokio::sync::Notify;

pub use state::StoredFile;

use state::BackendState;

/// Password given to every seeded account.
pub const PASSWORD: &str = "correct horse battery staple";

/// State shared between the server task and the test.
pub(crate) struct Shared {
    state: Mutex<BackendState>,
    requests: AtomicUsize,
    issue_tokens: AtomicBool,
    increase_delay_ms: AtomicU64,
    increase_received: Notify,
    user_delay_ms: AtomicU64,
    user_received: Notify,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn increase_delay(&self) -> Duration {
        Duration::from_millis(self.increase_delay_ms.load(Ordering::SeqCst))
    }

    fn user_delay(&self) -> Duration {
        Duration::from_millis(self.user_delay_ms.load(Ordering::SeqCst))
    }
}

/// A running mock storefront backend.
pub struct MockBackend {
    base_url: String,
    shared: Arc<Shared>,
}

impl MockBackend {
    /// Start a backend on an ephemeral local port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn() -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(BackendState::default()),
            requests: AtomicUsize::new(0),
            issue_tokens: AtomicBool::new(true),
            increase_delay_ms: AtomicU64::new(0),
            increase_received: Notify::new(),
            user_delay_ms: AtomicU64::new(0),
            user_received: Notify::new(),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener
            .local_addr()
            .expect("Failed to read mock backend address");

        let app = routes::router(Arc::clone(&shared));
        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Mock backend stopped");
        });

        Self {
            base_url: format!("http://{addr}"),
            shared,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Panics
    ///
    /// Panics if the base URL is rejected.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url).expect("Mock backend URL is valid")
    }

    /// A store with in-memory session storage, and a handle on that storage.
    ///
    /// # Panics
    ///
    /// Panics if the store cannot be built.
    #[must_use]
    pub fn store(&self) -> (Store, Arc<MemoryTokenStore>) {
        let tokens = Arc::new(MemoryTokenStore::new());
        (self.store_with(Arc::clone(&tokens)), tokens)
    }

    /// A store persisting through `tokens`.
    ///
    /// # Panics
    ///
    /// Panics if the store cannot be built.
    #[must_use]
    pub fn store_with(&self, tokens: impl TokenStore + 'static) -> Store {
        Store::new(&self.config(), tokens).expect("Failed to build store")
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    /// Add an account whose password is [`PASSWORD`].
    pub fn add_user(&self, name: &str, email: &str, role: UserRole) -> UserId {
        self.shared.state().add_account(name, email, PASSWORD, role)
    }

    pub fn add_product(&self, name: &str, price: Price) -> ProductId {
        self.shared.state().add_product(name, price, "fruit")
    }

    /// Delete a product behind the client's back.
    pub fn remove_product(&self, id: &ProductId) {
        self.shared.state().products.retain(|p| &p.id != id);
    }

    /// Issue a token as a previous sign-in would have.
    pub fn issue_token(&self, user_id: &UserId) -> String {
        self.shared.state().issue_token(user_id)
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Cart lines as the backend holds them.
    #[must_use]
    pub fn cart_items(&self, user_id: &UserId) -> Vec<CartItem> {
        self.shared.state().cart(user_id).items
    }

    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.shared.state().orders.clone()
    }

    #[must_use]
    pub fn logo(&self) -> Option<StoredFile> {
        self.shared.state().logo.clone()
    }

    #[must_use]
    pub fn banners(&self) -> Vec<StoredFile> {
        self.shared.state().banners.clone()
    }

    /// Number of requests served so far.
    #[must_use]
    pub fn requests(&self) -> usize {
        self.shared.requests.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Behavior
    // =========================================================================

    /// Whether sign-in answers carry a token.
    pub fn set_issue_tokens(&self, issue: bool) {
        self.shared.issue_tokens.store(issue, Ordering::SeqCst);
    }

    /// Hold every quantity-increase answer for `delay` after applying it.
    pub fn set_increase_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.shared.increase_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Resolves once a quantity increase has been applied server-side.
    pub async fn increase_received(&self) {
        self.shared.increase_received.notified().await;
    }

    /// Hold every sign-in and profile answer for `delay`.
    pub fn set_user_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.shared.user_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Resolves once a delayed sign-in or profile answer is ready server-side.
    pub async fn user_received(&self) {
        self.shared.user_received.notified().await;
    }
}
