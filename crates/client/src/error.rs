//! Error type shared by every store action.
//!
//! The backend contract is coarse: any non-OK response is a failure of the
//! whole action, reported with a fixed message per action. Status codes are
//! kept for diagnostics but never drive retries; a 401 and a 500 are handled
//! the same way.

use thiserror::Error;

use crate::config::ConfigError;
use crate::token_store::TokenStoreError;

/// Errors that can occur when talking to the storefront backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend answered with a non-success status.
    #[error("{action} (HTTP {status})")]
    RequestFailed {
        /// Fixed message naming the failed action.
        action: &'static str,
        /// HTTP status code returned by the backend.
        status: u16,
    },

    /// The backend rejected the sign-in (or sign-up) attempt.
    #[error("Sign in failed (HTTP {status})")]
    SignInFailed {
        /// HTTP status code returned by the backend.
        status: u16,
    },

    /// No token is held, or the sign-in response did not carry one.
    #[error("Token not found")]
    MissingToken,

    /// The session was signed out while a sign-in was in flight.
    #[error("Signed out before sign in completed")]
    SignedOut,

    /// HTTP transport failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body did not match the expected shape.
    #[error("{action}: unexpected response body: {source}")]
    Decode {
        /// Fixed message naming the action whose response failed to decode.
        action: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The endpoint URL could not be built from the configured base URL.
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    /// Reading or writing the persisted session failed.
    #[error("Session storage error: {0}")]
    Storage(#[from] TokenStoreError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// HTTP status of a rejected request, if the backend answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } | Self::SignInFailed { status } => Some(*status),
            _ => None,
        }
    }
}

/// Fixed failure messages, one per backend action.
pub mod action {
    pub const SIGN_IN: &str = "Sign in failed";
    pub const SIGN_UP: &str = "Sign up failed";
    pub const FETCH_PROFILE: &str = "Failed to fetch user profile";
    pub const FETCH_CURRENT_USER: &str = "Failed to fetch current user";
    pub const FETCH_CART: &str = "Failed to get user cart";
    pub const ADD_TO_CART: &str = "Failed to add item to cart";
    pub const INCREASE_QUANTITY: &str = "Failed to increase item quantity in cart";
    pub const DECREASE_QUANTITY: &str = "Failed to decrease item quantity in cart";
    pub const REMOVE_FROM_CART: &str = "Failed to remove item from cart";
    pub const EMPTY_CART: &str = "Failed to empty cart";
    pub const ALL_PRODUCTS: &str = "Failed to fetch all products";
    pub const FETCH_PRODUCT: &str = "Failed to fetch product";
    pub const SEARCH_PRODUCTS: &str = "Failed to search products";
    pub const PLACE_ORDER: &str = "Failed to place order";
    pub const CREATE_REVIEW: &str = "Failed to create review";
    pub const PRODUCT_REVIEWS: &str = "Failed to get reviews for product";
    pub const ALL_REVIEWS: &str = "Failed to fetch all reviews";
    pub const DELETE_REVIEW: &str = "Failed to delete review";
    pub const CREATE_PRODUCT: &str = "Failed to create product";
    pub const DELETE_PRODUCT: &str = "Failed to delete product";
    pub const UPDATE_PAYMENT_STATUS: &str = "Failed to update payment status";
    pub const ALL_ORDERS: &str = "Failed to fetch all orders";
    pub const UPDATE_ORDER_STATUS: &str = "Failed to update order status";
    pub const UPLOAD_LOGO: &str = "Failed to upload logo";
    pub const FETCH_LOGO: &str = "Failed to fetch logo";
    pub const UPLOAD_BANNERS: &str = "Failed to upload banner images";
    pub const FETCH_BANNERS: &str = "Failed to fetch banner images";
}
