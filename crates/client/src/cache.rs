//! Product lookup cache for the derived views.
//!
//! The cart and order views need a name and price for every line. Lookups go
//! through a bounded `moka` cache so re-rendering a cart does not refetch the
//! same products. Carts themselves are never cached.

use std::time::Duration;

use cartwheel_core::{Product, ProductId};
use moka::future::Cache;

const MAX_CACHED_PRODUCTS: u64 = 1000;

/// Cache of product details keyed by ID. Disabled when the TTL is zero.
#[derive(Clone)]
pub(crate) struct ProductCache {
    inner: Option<Cache<ProductId, Product>>,
}

impl ProductCache {
    pub(crate) fn new(ttl: Duration) -> Self {
        let inner = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(MAX_CACHED_PRODUCTS)
                .time_to_live(ttl)
                .build()
        });
        Self { inner }
    }

    pub(crate) async fn get(&self, id: &ProductId) -> Option<Product> {
        match &self.inner {
            Some(cache) => cache.get(id).await,
            None => None,
        }
    }

    pub(crate) async fn insert(&self, product: Product) {
        if let Some(cache) = &self.inner {
            cache.insert(product.id.clone(), product).await;
        }
    }

    pub(crate) async fn invalidate(&self, id: &ProductId) {
        if let Some(cache) = &self.inner {
            cache.invalidate(id).await;
        }
    }
}
