//! Server-owned shopping cart.
//!
//! The client never merges or recomputes a cart: every mutation returns the
//! backend's full cart, which replaces the local one.

use serde::{Deserialize, Serialize};

use crate::types::{CartId, ProductId, UserId};

/// One line of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: ProductId,
    pub quantity: u32,
}

/// A user's cart, as last answered by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CartId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserId>,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// The line for `product`, if present.
    #[must_use]
    pub fn line(&self, product: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product == product)
    }
}
