//! Administrator actions.
//!
//! Nothing here checks the role: the backend is the gate. Actions that need
//! a token fail with `MissingToken` before sending anything.

use cartwheel_core::{
    NewProduct, Order, OrderId, OrderStatus, PaymentStatus, Product, ProductId, Review, ReviewId,
};
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use super::Store;
use crate::api::{MessageEnvelope, OrderEnvelope, ProductEnvelope};
use crate::error::{ClientError, action};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderStatusBody<'a> {
    order_id: &'a OrderId,
    status: OrderStatus,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentStatusBody<'a> {
    order_id: &'a OrderId,
    payment: PaymentStatus,
}

impl Store {
    // =========================================================================
    // Orders
    // =========================================================================

    /// Every order in the shop. Fails open to an empty list.
    #[instrument(skip(self))]
    pub async fn all_orders(&self) -> Vec<Order> {
        let result = async {
            let token = self.require_token().await?;
            let request = self
                .inner
                .api
                .request(Method::GET, &["orders"], Some(&token))?;
            self.inner
                .api
                .send_json::<Vec<Order>>(request, action::ALL_ORDERS)
                .await
        }
        .await;

        result.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to fetch all orders");
            Vec::new()
        })
    }

    /// Move an order to another fulfilment status.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::MissingToken` without a token, otherwise the
    /// request error.
    #[instrument(skip(self), fields(order_id = %order_id, status = %status))]
    pub async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, ClientError> {
        let token = self.require_token().await?;
        let request = self
            .inner
            .api
            .request(Method::PUT, &["orders", "update-status"], Some(&token))?
            .json(&OrderStatusBody { order_id, status });

        let envelope: OrderEnvelope = self
            .inner
            .api
            .send_json(request, action::UPDATE_ORDER_STATUS)
            .await?;
        tracing::info!(message = ?envelope.message, "Order status updated");
        Ok(envelope.order)
    }

    /// Mark an order's payment.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::MissingToken` without a token, otherwise the
    /// request error.
    #[instrument(skip(self), fields(order_id = %order_id, payment = %payment))]
    pub async fn update_payment_status(
        &self,
        order_id: &OrderId,
        payment: PaymentStatus,
    ) -> Result<Order, ClientError> {
        let token = self.require_token().await?;
        let request = self
            .inner
            .api
            .request(Method::PUT, &["orders", "updatepaystatus"], Some(&token))?
            .json(&PaymentStatusBody { order_id, payment });

        let envelope: OrderEnvelope = self
            .inner
            .api
            .send_json(request, action::UPDATE_PAYMENT_STATUS)
            .await?;
        tracing::info!(message = ?envelope.message, "Payment status updated");
        Ok(envelope.order)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Add a product to the catalog.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::MissingToken` without a token, otherwise the
    /// request error.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, ClientError> {
        let token = self.require_token().await?;
        let request = self
            .inner
            .api
            .request(Method::POST, &["products", "createproduct"], Some(&token))?
            .json(product);

        let envelope: ProductEnvelope = self
            .inner
            .api
            .send_json(request, action::CREATE_PRODUCT)
            .await?;
        tracing::info!(product_id = %envelope.product.id, "Product created");
        Ok(envelope.product)
    }

    /// Remove a product from the catalog and from the product cache.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::MissingToken` without a token, otherwise the
    /// request error.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn delete_product(&self, product_id: &ProductId) -> Result<(), ClientError> {
        let token = self.require_token().await?;
        let request = self.inner.api.request(
            Method::DELETE,
            &["products", product_id.as_str()],
            Some(&token),
        )?;

        let _: MessageEnvelope = self
            .inner
            .api
            .send_json(request, action::DELETE_PRODUCT)
            .await?;
        self.inner.products.invalidate(product_id).await;
        tracing::info!("Product deleted");
        Ok(())
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// Every review in the shop. Fails open to an empty list.
    #[instrument(skip(self))]
    pub async fn all_reviews(&self) -> Vec<Review> {
        let token = self.token().await;
        let result = async {
            let request =
                self.inner
                    .api
                    .request(Method::GET, &["reviews", "user", "all"], token.as_ref())?;
            self.inner
                .api
                .send_json::<Vec<Review>>(request, action::ALL_REVIEWS)
                .await
        }
        .await;

        result.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to fetch all reviews");
            Vec::new()
        })
    }

    /// Delete a review.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    #[instrument(skip(self), fields(review_id = %review_id))]
    pub async fn delete_review(&self, review_id: &ReviewId) -> Result<(), ClientError> {
        let token = self.token().await;
        let request = self.inner.api.request(
            Method::DELETE,
            &["reviews", review_id.as_str()],
            token.as_ref(),
        )?;

        let _: MessageEnvelope = self
            .inner
            .api
            .send_json(request, action::DELETE_REVIEW)
            .await?;
        tracing::info!("Review deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::token_store::MemoryTokenStore;

    fn signed_out_store() -> Store {
        let config = ClientConfig::new("http://127.0.0.1:9").unwrap();
        Store::new(&config, MemoryTokenStore::new()).unwrap()
    }

    #[tokio::test]
    async fn test_token_guarded_actions_fail_before_sending() {
        let store = signed_out_store();
        let order = OrderId::new("o1");

        let err = store
            .update_order_status(&order, OrderStatus::Shipped)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::MissingToken));

        let err = store
            .update_payment_status(&order, PaymentStatus::Paid)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::MissingToken));

        let err = store
            .delete_product(&ProductId::new("p1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::MissingToken));
    }

    #[tokio::test]
    async fn test_all_orders_fails_open() {
        assert!(signed_out_store().all_orders().await.is_empty());
    }

    #[test]
    fn test_status_bodies_use_backend_field_names() {
        let order = OrderId::new("o1");
        let body = serde_json::to_value(OrderStatusBody {
            order_id: &order,
            status: OrderStatus::Delivered,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"orderId": "o1", "status": "delivered"})
        );

        let body = serde_json::to_value(PaymentStatusBody {
            order_id: &order,
            payment: PaymentStatus::Paid,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"orderId": "o1", "payment": "paid"}));
    }
}
