//! Product reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ProductId, ReviewId};

/// A review left on a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: ReviewId,
    /// Author as the backend renders it (an id or a display name).
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub product: Option<ProductId>,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Review {
    /// Lowest rating the star widget offers.
    pub const MIN_RATING: u8 = 1;
    /// Highest rating the star widget offers.
    pub const MAX_RATING: u8 = 5;
}
