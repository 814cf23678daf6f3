//! Response envelopes used by the backend.
//!
//! Mutations answer with `{ message, <entity> }`; reads answer with the bare
//! entity. Only the envelopes live here, the entities are in `cartwheel_core`.

use cartwheel_core::{Cart, Order, Product, Review, User};
use serde::Deserialize;

/// `POST /users/signin` and `POST /users/signup`.
#[derive(Debug, Deserialize)]
pub struct SignInResponse {
    pub user: User,
    #[serde(default)]
    pub token: Option<String>,
}

/// Cart mutations.
#[derive(Debug, Deserialize)]
pub struct CartEnvelope {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub cart: Cart,
}

/// Actions that only confirm (place order, deletions).
#[derive(Debug, Default, Deserialize)]
pub struct MessageEnvelope {
    #[serde(default)]
    pub message: Option<String>,
}

/// Order status and payment updates.
#[derive(Debug, Deserialize)]
pub struct OrderEnvelope {
    #[serde(default)]
    pub message: Option<String>,
    pub order: Order,
}

/// Product creation.
#[derive(Debug, Deserialize)]
pub struct ProductEnvelope {
    #[serde(default)]
    pub message: Option<String>,
    pub product: Product,
}

/// Review creation.
#[derive(Debug, Deserialize)]
pub struct ReviewEnvelope {
    #[serde(default)]
    pub message: Option<String>,
    pub review: Review,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_envelope() {
        let json = r#"{"message":"Item added to cart","cart":{"items":[{"product":"p1","quantity":1}]}}"#;
        let envelope: CartEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.message.as_deref(), Some("Item added to cart"));
        assert_eq!(envelope.cart.item_count(), 1);
    }

    #[test]
    fn test_sign_in_response_without_token() {
        let json = r#"{"user":{"_id":"u1","name":"Ada","email":"a@b.c","role":"user"}}"#;
        let response: SignInResponse = serde_json::from_str(json).unwrap();
        assert!(response.token.is_none());
    }
}
