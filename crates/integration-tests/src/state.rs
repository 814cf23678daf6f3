//! In-memory data behind the mock backend.

use std::collections::HashMap;

use cartwheel_core::{
    Cart, CartId, CartItem, Order, OrderId, Price, Product, ProductId, Review, ReviewId, User,
    UserId, UserRole,
};

/// An account with the password the sign-in endpoint checks.
pub(crate) struct Account {
    pub user: User,
    pub password: String,
}

/// An uploaded file.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Default)]
pub(crate) struct BackendState {
    pub accounts: Vec<Account>,
    pub tokens: HashMap<String, UserId>,
    pub products: Vec<Product>,
    pub carts: HashMap<UserId, Vec<CartItem>>,
    pub orders: Vec<Order>,
    pub reviews: Vec<Review>,
    pub logo: Option<StoredFile>,
    pub banners: Vec<StoredFile>,
    next_id: u64,
}

impl BackendState {
    /// Fresh identifier such as `p0003`.
    pub fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{:04}", self.next_id)
    }

    pub fn add_account(&mut self, name: &str, email: &str, password: &str, role: UserRole) -> UserId {
        let id = UserId::new(self.next_id("u"));
        self.accounts.push(Account {
            user: User {
                id: id.clone(),
                name: name.to_owned(),
                email: email.to_owned(),
                role,
                previous_orders: Vec::new(),
            },
            password: password.to_owned(),
        });
        id
    }

    pub fn add_product(&mut self, name: &str, price: Price, category: &str) -> ProductId {
        let id = ProductId::new(self.next_id("p"));
        self.products.push(Product {
            id: id.clone(),
            name: name.to_owned(),
            description: format!("{name} from the mock catalog"),
            price,
            category: category.to_owned(),
            images: vec![format!("/images/{id}.png")],
        });
        id
    }

    pub fn issue_token(&mut self, user_id: &UserId) -> String {
        let token = format!("token-{}", self.next_id(user_id.as_str()));
        self.tokens.insert(token.clone(), user_id.clone());
        token
    }

    pub fn account_by_email(&self, email: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.user.email == email)
    }

    pub fn account(&self, id: &UserId) -> Option<&Account> {
        self.accounts.iter().find(|a| &a.user.id == id)
    }

    /// The user record as the profile endpoints render it, orders included.
    pub fn user_view(&self, id: &UserId) -> Option<User> {
        let mut user = self.account(id)?.user.clone();
        user.previous_orders = self
            .orders
            .iter()
            .filter(|order| order.user.as_ref() == Some(id))
            .cloned()
            .collect();
        Some(user)
    }

    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    pub fn cart(&self, user_id: &UserId) -> Cart {
        Cart {
            id: Some(CartId::new(format!("c-{user_id}"))),
            user: Some(user_id.clone()),
            items: self.carts.get(user_id).cloned().unwrap_or_default(),
        }
    }

    pub fn cart_items_mut(&mut self, user_id: &UserId) -> &mut Vec<CartItem> {
        self.carts.entry(user_id.clone()).or_default()
    }

    pub fn order_mut(&mut self, id: &OrderId) -> Option<&mut Order> {
        self.orders.iter_mut().find(|o| &o.id == id)
    }

    /// Whether any of the user's orders contains the product.
    pub fn has_purchased(&self, user_id: &UserId, product_id: &ProductId) -> bool {
        self.orders
            .iter()
            .filter(|order| order.user.as_ref() == Some(user_id))
            .any(|order| order.items.iter().any(|item| &item.product == product_id))
    }

    pub fn remove_review(&mut self, id: &ReviewId) -> bool {
        let before = self.reviews.len();
        self.reviews.retain(|r| &r.id != id);
        self.reviews.len() != before
    }
}
