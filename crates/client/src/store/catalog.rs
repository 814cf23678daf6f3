//! Product browsing and reviews.

use cartwheel_core::{Product, ProductId, Review, UserId};
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use super::Store;
use crate::api::ReviewEnvelope;
use crate::error::{ClientError, action};

#[derive(Serialize)]
struct SearchBody<'a> {
    keyword: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateReviewBody<'a> {
    user_id: &'a UserId,
    product_id: &'a ProductId,
    rating: u8,
    comment: &'a str,
}

impl Store {
    /// List the whole catalog. Fails open to an empty list.
    #[instrument(skip(self))]
    pub async fn all_products(&self) -> Vec<Product> {
        let result = async {
            let request =
                self.inner
                    .api
                    .request(Method::GET, &["products", "allproducts"], None)?;
            self.inner
                .api
                .send_json::<Vec<Product>>(request, action::ALL_PRODUCTS)
                .await
        }
        .await;

        result.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to fetch all products");
            Vec::new()
        })
    }

    /// Fetch one product. The answer refreshes the product cache.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn product(&self, product_id: &ProductId) -> Result<Product, ClientError> {
        let request =
            self.inner
                .api
                .request(Method::GET, &["products", product_id.as_str()], None)?;
        let product: Product = self
            .inner
            .api
            .send_json(request, action::FETCH_PRODUCT)
            .await?;

        self.inner.products.insert(product.clone()).await;
        Ok(product)
    }

    /// Search the catalog by keyword. Fails open to an empty list.
    #[instrument(skip(self))]
    pub async fn search_products(&self, keyword: &str) -> Vec<Product> {
        let result = async {
            let request = self
                .inner
                .api
                .request(Method::POST, &["products", "search"], None)?
                .json(&SearchBody { keyword });
            self.inner
                .api
                .send_json::<Vec<Product>>(request, action::SEARCH_PRODUCTS)
                .await
        }
        .await;

        result.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to search products");
            Vec::new()
        })
    }

    /// Product for a view line: cached if possible, `None` if the lookup
    /// fails.
    pub(crate) async fn lookup_product(&self, product_id: &ProductId) -> Option<Product> {
        if let Some(product) = self.inner.products.get(product_id).await {
            return Some(product);
        }

        match self.product(product_id).await {
            Ok(product) => Some(product),
            Err(e) => {
                tracing::warn!(error = %e, product_id = %product_id, "Product lookup failed");
                None
            }
        }
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// Review a product. The backend only accepts reviews from buyers.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    #[instrument(skip(self, comment), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn create_review(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        rating: u8,
        comment: &str,
    ) -> Result<Review, ClientError> {
        let token = self.token().await;
        let request = self
            .inner
            .api
            .request(Method::POST, &["reviews", "createreview"], token.as_ref())?
            .json(&CreateReviewBody {
                user_id,
                product_id,
                rating,
                comment,
            });

        let envelope: ReviewEnvelope = self
            .inner
            .api
            .send_json(request, action::CREATE_REVIEW)
            .await?;
        tracing::info!(review_id = %envelope.review.id, "Review created");
        Ok(envelope.review)
    }

    /// Reviews left on a product. Fails open to an empty list.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn product_reviews(&self, product_id: &ProductId) -> Vec<Review> {
        let result = async {
            let request =
                self.inner
                    .api
                    .request(Method::GET, &["reviews", product_id.as_str()], None)?;
            self.inner
                .api
                .send_json::<Vec<Review>>(request, action::PRODUCT_REVIEWS)
                .await
        }
        .await;

        result.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to get reviews for product");
            Vec::new()
        })
    }
}
