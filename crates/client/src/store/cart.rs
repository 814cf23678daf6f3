//! Cart actions and checkout.
//!
//! Every mutation answers with the full server cart, which replaces the
//! local one if no later-issued cart request has been applied meanwhile.

use cartwheel_core::{Cart, ProductId, UserId};
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use super::Store;
use crate::api::{CartEnvelope, MessageEnvelope};
use crate::error::{ClientError, action};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddItemBody<'a> {
    user_id: &'a UserId,
    product_id: &'a ProductId,
    quantity: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlaceOrderBody<'a> {
    user_id: &'a UserId,
}

impl Store {
    /// Load the user's cart (`GET /carts/:userId`).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::MissingToken` before any request when no token
    /// is held, otherwise the request error.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn fetch_cart(&self, user_id: &UserId) -> Result<Cart, ClientError> {
        let token = self.require_token().await?;
        let seq = self.next_cart_seq();
        let request =
            self.inner
                .api
                .request(Method::GET, &["carts", user_id.as_str()], Some(&token))?;
        let cart: Cart = self.inner.api.send_json(request, action::FETCH_CART).await?;

        self.apply_cart(seq, &cart).await;
        Ok(cart)
    }

    /// Add `quantity` of a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns the request error; the local cart is left as it was.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn add_item(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart, ClientError> {
        let seq = self.next_cart_seq();
        let token = self.token().await;
        let request = self
            .inner
            .api
            .request(Method::POST, &["carts", "add"], token.as_ref())?
            .json(&AddItemBody {
                user_id,
                product_id,
                quantity,
            });

        self.send_cart(seq, request, action::ADD_TO_CART).await
    }

    /// Increase a line's quantity by one.
    ///
    /// # Errors
    ///
    /// Returns the request error; the local cart is left as it was.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn increase_qty(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
    ) -> Result<Cart, ClientError> {
        let seq = self.next_cart_seq();
        let token = self.token().await;
        let request = self.inner.api.request(
            Method::PUT,
            &[
                "carts",
                "increase-quantity",
                user_id.as_str(),
                product_id.as_str(),
            ],
            token.as_ref(),
        )?;

        self.send_cart(seq, request, action::INCREASE_QUANTITY).await
    }

    /// Decrease a line's quantity by one. What happens at zero is up to the
    /// backend.
    ///
    /// # Errors
    ///
    /// Returns the request error; the local cart is left as it was.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn decrease_qty(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
    ) -> Result<Cart, ClientError> {
        let seq = self.next_cart_seq();
        let token = self.token().await;
        let request = self.inner.api.request(
            Method::PUT,
            &[
                "carts",
                "decrease-quantity",
                user_id.as_str(),
                product_id.as_str(),
            ],
            token.as_ref(),
        )?;

        self.send_cart(seq, request, action::DECREASE_QUANTITY).await
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns the request error; the local cart is left as it was.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn remove_item(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
    ) -> Result<Cart, ClientError> {
        let seq = self.next_cart_seq();
        let token = self.token().await;
        let request = self.inner.api.request(
            Method::DELETE,
            &["carts", "remove", user_id.as_str(), product_id.as_str()],
            token.as_ref(),
        )?;

        self.send_cart(seq, request, action::REMOVE_FROM_CART).await
    }

    /// Remove every line from the cart.
    ///
    /// # Errors
    ///
    /// Returns the request error; the local cart is left as it was.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn empty_cart(&self, user_id: &UserId) -> Result<Cart, ClientError> {
        let seq = self.next_cart_seq();
        let token = self.token().await;
        let request = self.inner.api.request(
            Method::DELETE,
            &["carts", "remove-all", user_id.as_str()],
            token.as_ref(),
        )?;

        self.send_cart(seq, request, action::EMPTY_CART).await
    }

    /// Place an order for the user's current server-side cart.
    ///
    /// The cart is not emptied; see [`Self::checkout`].
    ///
    /// # Errors
    ///
    /// Returns `ClientError::MissingToken` before any request when no token
    /// is held, otherwise the request error.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn place_order(&self, user_id: &UserId) -> Result<(), ClientError> {
        let token = self.require_token().await?;
        let request = self
            .inner
            .api
            .request(Method::POST, &["orders"], Some(&token))?
            .json(&PlaceOrderBody { user_id });

        let envelope: MessageEnvelope =
            self.inner.api.send_json(request, action::PLACE_ORDER).await?;
        tracing::info!(message = ?envelope.message, "Order placed");
        Ok(())
    }

    /// Place an order, then empty the cart.
    ///
    /// The two calls are not atomic. If emptying fails the order stays
    /// placed and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns the first failing request's error.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn checkout(&self, user_id: &UserId) -> Result<Cart, ClientError> {
        self.place_order(user_id).await?;
        self.empty_cart(user_id).await.inspect_err(|e| {
            tracing::error!(error = %e, "Order placed but emptying the cart failed");
        })
    }

    /// Send a cart mutation and apply the answered cart.
    async fn send_cart(
        &self,
        seq: u64,
        request: reqwest::RequestBuilder,
        action: &'static str,
    ) -> Result<Cart, ClientError> {
        let envelope: CartEnvelope = self.inner.api.send_json(request, action).await?;
        if let Some(message) = &envelope.message {
            tracing::debug!(%message, "Cart updated");
        }

        self.apply_cart(seq, &envelope.cart).await;
        Ok(envelope.cart)
    }
}
