//! Storefront accounts.

use serde::{Deserialize, Serialize};

use crate::models::Order;
use crate::types::{UserId, UserRole};

/// A user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
    /// Orders placed by this user, populated by the profile endpoints.
    #[serde(default)]
    pub previous_orders: Vec<Order>,
}
