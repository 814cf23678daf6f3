//! Derived data for display.
//!
//! The cart and order records only carry product IDs. These helpers join them
//! with product details so a front end can show names, prices and totals.
//! Lookups that fail degrade the affected line instead of failing the view.

use std::collections::HashMap;

use cartwheel_core::{Cart, Order, OrderId, OrderStatus, PaymentStatus, Price, Product, ProductId, Review};
use futures::future::join_all;
use tracing::instrument;

use crate::store::Store;

/// Reviews shown before "load more".
pub const REVIEWS_PER_PAGE: usize = 5;

// =============================================================================
// Cart
// =============================================================================

/// One cart line joined with its product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineView {
    pub product: ProductId,
    /// Product name, blank when the product could not be loaded.
    pub name: String,
    /// Unit price, zero when the product could not be loaded.
    pub unit_price: Price,
    pub quantity: u32,
    pub line_total: Price,
    /// Whether the product lookup succeeded.
    pub available: bool,
}

/// The cart as displayed, with its total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: Price,
    pub item_count: u32,
}

impl CartView {
    /// View of an empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            lines: Vec::new(),
            total: Price::ZERO,
            item_count: 0,
        }
    }

    /// Join `cart` with the products that could be loaded.
    ///
    /// Missing products count as price zero with a blank name.
    #[must_use]
    pub fn build(cart: &Cart, products: &HashMap<ProductId, Product>) -> Self {
        let lines: Vec<CartLineView> = cart
            .items
            .iter()
            .map(|item| {
                let product = products.get(&item.product);
                let unit_price = product.map_or(Price::ZERO, |p| p.price);
                CartLineView {
                    product: item.product.clone(),
                    name: product.map(|p| p.name.clone()).unwrap_or_default(),
                    unit_price,
                    quantity: item.quantity,
                    line_total: unit_price.times(item.quantity),
                    available: product.is_some(),
                }
            })
            .collect();

        Self {
            total: lines.iter().map(|line| line.line_total).sum(),
            item_count: cart.item_count(),
            lines,
        }
    }
}

impl Default for CartView {
    fn default() -> Self {
        Self::empty()
    }
}

// =============================================================================
// Order History
// =============================================================================

/// One order line joined with its product, `None` when not available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineView {
    pub product_id: ProductId,
    pub product: Option<Product>,
    pub quantity: u32,
}

/// A past order with its lines resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderHistoryEntry {
    pub id: OrderId,
    pub status: OrderStatus,
    pub payment: PaymentStatus,
    pub total_amount: Option<Price>,
    pub lines: Vec<OrderLineView>,
}

impl OrderHistoryEntry {
    fn build(order: &Order, products: &HashMap<ProductId, Product>) -> Self {
        Self {
            id: order.id.clone(),
            status: order.status,
            payment: order.payment,
            total_amount: order.total_amount,
            lines: order
                .items
                .iter()
                .map(|item| OrderLineView {
                    product_id: item.product.clone(),
                    product: products.get(&item.product).cloned(),
                    quantity: item.quantity,
                })
                .collect(),
        }
    }
}

// =============================================================================
// Reviews
// =============================================================================

/// The reviews to display and whether more are hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewPage<'a> {
    pub shown: &'a [Review],
    pub has_more: bool,
}

/// First [`REVIEWS_PER_PAGE`] reviews, or all of them with `show_all`.
#[must_use]
pub fn review_page(reviews: &[Review], show_all: bool) -> ReviewPage<'_> {
    match reviews.get(..REVIEWS_PER_PAGE) {
        Some(first) if !show_all && reviews.len() > REVIEWS_PER_PAGE => ReviewPage {
            shown: first,
            has_more: true,
        },
        _ => ReviewPage {
            shown: reviews,
            has_more: false,
        },
    }
}

// =============================================================================
// Store Views
// =============================================================================

impl Store {
    /// The current cart joined with product names and prices.
    #[instrument(skip(self))]
    pub async fn cart_view(&self) -> CartView {
        let cart = self.cart().await;
        if cart.is_empty() {
            return CartView::empty();
        }

        let products = self
            .lookup_products(cart.items.iter().map(|item| &item.product))
            .await;
        CartView::build(&cart, &products)
    }

    /// The signed-in user's previous orders with product details.
    ///
    /// Loads the current user first when no profile is held. Returns an
    /// empty history when there is no user to load.
    #[instrument(skip(self))]
    pub async fn order_history(&self) -> Vec<OrderHistoryEntry> {
        let user = match self.user().await {
            Some(user) => user,
            None => match self.fetch_current_user().await {
                Ok(user) => user,
                Err(e) => {
                    tracing::error!(error = %e, "Error fetching user data");
                    return Vec::new();
                }
            },
        };

        let products = self
            .lookup_products(
                user.previous_orders
                    .iter()
                    .flat_map(|order| order.items.iter().map(|item| &item.product)),
            )
            .await;

        user.previous_orders
            .iter()
            .map(|order| OrderHistoryEntry::build(order, &products))
            .collect()
    }

    /// Look up each distinct product concurrently. Failed lookups are absent
    /// from the map.
    async fn lookup_products<'a>(
        &self,
        ids: impl Iterator<Item = &'a ProductId>,
    ) -> HashMap<ProductId, Product> {
        let mut unique: Vec<&ProductId> = ids.collect();
        unique.sort_unstable();
        unique.dedup();

        join_all(unique.into_iter().map(|id| self.lookup_product(id)))
            .await
            .into_iter()
            .flatten()
            .map(|product| (product.id.clone(), product))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: &str, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: String::new(),
            price: Price::from_cents(cents),
            category: String::new(),
            images: Vec::new(),
        }
    }

    fn cart(lines: &[(&str, u32)]) -> Cart {
        let items: Vec<serde_json::Value> = lines
            .iter()
            .map(|(id, qty)| serde_json::json!({"product": id, "quantity": qty}))
            .collect();
        serde_json::from_value(serde_json::json!({ "items": items })).unwrap()
    }

    fn catalog(products: Vec<Product>) -> HashMap<ProductId, Product> {
        products.into_iter().map(|p| (p.id.clone(), p)).collect()
    }

    fn review(id: &str) -> Review {
        serde_json::from_value(serde_json::json!({"_id": id, "rating": 4})).unwrap()
    }

    #[test]
    fn test_total_after_increase() {
        // $10 product, added once then increased once
        let view = CartView::build(&cart(&[("p1", 2)]), &catalog(vec![product("p1", 1000)]));
        assert_eq!(view.total.display(), "$20.00");
        assert_eq!(view.lines[0].line_total, Price::from_cents(2000));
        assert_eq!(view.item_count, 2);
    }

    #[test]
    fn test_total_sums_lines() {
        let view = CartView::build(
            &cart(&[("p1", 3), ("p2", 1)]),
            &catalog(vec![product("p1", 250), product("p2", 1999)]),
        );
        assert_eq!(view.total.display(), "$27.49");
    }

    #[test]
    fn test_missing_product_counts_as_zero() {
        let view = CartView::build(
            &cart(&[("p1", 1), ("gone", 4)]),
            &catalog(vec![product("p1", 500)]),
        );
        assert_eq!(view.total, Price::from_cents(500));

        let missing = &view.lines[1];
        assert!(!missing.available);
        assert!(missing.name.is_empty());
        assert_eq!(missing.unit_price, Price::ZERO);
    }

    #[test]
    fn test_order_line_without_product_is_not_available() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "_id": "o1",
            "items": [{"product": "p1", "quantity": 1}, {"product": "gone", "quantity": 2}]
        }))
        .unwrap();

        let entry = OrderHistoryEntry::build(&order, &catalog(vec![product("p1", 100)]));
        assert_eq!(entry.lines[0].product.as_ref().unwrap().name, "Product p1");
        assert!(entry.lines[1].product.is_none());
        assert_eq!(entry.lines[1].quantity, 2);
    }

    #[test]
    fn test_review_page_cuts_at_five() {
        let reviews: Vec<Review> = (0..7).map(|i| review(&format!("r{i}"))).collect();

        let page = review_page(&reviews, false);
        assert_eq!(page.shown.len(), REVIEWS_PER_PAGE);
        assert!(page.has_more);

        let page = review_page(&reviews, true);
        assert_eq!(page.shown.len(), 7);
        assert!(!page.has_more);
    }

    #[test]
    fn test_review_page_exactly_five_has_no_more() {
        let reviews: Vec<Review> = (0..5).map(|i| review(&format!("r{i}"))).collect();
        let page = review_page(&reviews, false);
        assert_eq!(page.shown.len(), 5);
        assert!(!page.has_more);
    }
}
