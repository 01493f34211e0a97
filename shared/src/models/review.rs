//! Review Model

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Review {
    pub id: i64,
    pub product_id: i64,
    pub user_id: i64,
    /// Author display name (joined from users)
    #[cfg_attr(feature = "db", sqlx(default))]
    #[serde(default)]
    pub user_name: String,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReviewCreate {
    pub product_id: i64,
    #[validate(range(min = 1, max = 5))]
    pub rating: i16,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ReviewUpdate {
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i16>,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

/// Aggregate rating for one product
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average: f64,
    pub count: i64,
    /// Count per star, index 0 = 1 star
    pub distribution: [i64; 5],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductReviews {
    pub summary: RatingSummary,
    pub items: Vec<Review>,
    pub pagination: crate::response::Pagination,
}
