//! Records returned by the storefront backend.
//!
//! These are displayed as-is: the client never normalizes or validates them
//! beyond typed deserialization. Unknown fields are ignored and optional
//! fields default, so schema additions on the backend do not break decoding.

pub mod cart;
pub mod order;
pub mod product;
pub mod review;
pub mod user;

pub use cart::{Cart, CartItem};
pub use order::{Order, OrderItem};
pub use product::{NewProduct, Product};
pub use review::Review;
pub use user::User;
