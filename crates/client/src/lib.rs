//! Cartwheel client library.
//!
//! A session/cart store for the storefront REST backend. The store holds the
//! authentication flag, the current user and role, and the current cart, and
//! exposes one async action per backend operation. Every action issues a
//! single request and replaces local state with the server's answer.
//!
//! # Example
//!
//! ```rust,ignore
//! use cartwheel_client::{ClientConfig, Store};
//! use cartwheel_core::Credentials;
//!
//! let config = ClientConfig::from_env()?;
//! let store = Store::from_config(&config)?;
//! store.initialize().await;
//!
//! let user = store.sign_in(&Credentials::new("ada@example.com", password)?).await?;
//! store.add_item(&user.id, &product_id, 1).await?;
//! let view = store.cart_view().await;
//! println!("Total Amount: {}", view.total);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod store;
pub mod token_store;
pub mod views;

mod cache;

pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
pub use session::Session;
pub use store::{Logo, Store, Upload};
pub use token_store::{
    FileTokenStore, MemoryTokenStore, PersistedSession, TokenStore, TokenStoreError,
};
pub use views::{
    CartLineView, CartView, OrderHistoryEntry, OrderLineView, REVIEWS_PER_PAGE, ReviewPage,
    review_page,
};
