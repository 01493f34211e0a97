//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub category_id: Option<i64>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    /// Crossed-out "was" price shown next to `price`
    pub compare_at_price: Option<Decimal>,
    pub image: Option<String>,
    pub images: Vec<String>,
    pub stock_quantity: i32,
    pub in_stock: bool,
    pub is_active: bool,
    pub is_featured: bool,
    pub rating_avg: f64,
    pub review_count: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductCreate {
    pub category_id: Option<i64>,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 200))]
    pub slug: Option<String>,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    #[validate(length(max = 2048))]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub stock_quantity: i32,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProductUpdate {
    pub category_id: Option<i64>,
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub slug: Option<String>,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub compare_at_price: Option<Decimal>,
    #[validate(length(max = 2048))]
    pub image: Option<String>,
    pub images: Option<Vec<String>>,
    #[validate(range(min = 0))]
    pub stock_quantity: Option<i32>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StockUpdate {
    #[validate(range(min = 0))]
    pub stock_quantity: i32,
}

/// Listing sort order
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Rating,
    Name,
}

impl ProductSort {
    /// `ORDER BY` clause for this sort
    pub fn order_by(&self) -> &'static str {
        match self {
            ProductSort::Newest => "p.created_at DESC, p.id DESC",
            ProductSort::PriceAsc => "p.price ASC, p.id ASC",
            ProductSort::PriceDesc => "p.price DESC, p.id DESC",
            ProductSort::Rating => "p.rating_avg DESC, p.review_count DESC, p.id DESC",
            ProductSort::Name => "p.name ASC, p.id ASC",
        }
    }
}

/// `GET /api/products` filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category_id: Option<i64>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub q: Option<String>,
    pub in_stock: Option<bool>,
    pub featured: Option<bool>,
    #[serde(default)]
    pub sort: ProductSort,
}

impl ProductListQuery {
    /// Stable cache key covering every filter
    pub fn cache_key(&self, include_inactive: bool) -> String {
        format!(
            "products:list:{}:{}:{}:{}:{}:{}:{}:{}:{:?}:{}",
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(0),
            self.category_id.map(|v| v.to_string()).unwrap_or_default(),
            self.min_price.map(|v| v.to_string()).unwrap_or_default(),
            self.max_price.map(|v| v.to_string()).unwrap_or_default(),
            self.q.as_deref().unwrap_or("").to_lowercase(),
            self.in_stock.map(|v| v.to_string()).unwrap_or_default(),
            self.featured.map(|v| v.to_string()).unwrap_or_default(),
            self.sort,
            include_inactive,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_deserialize() {
        let q: ProductListQuery =
            serde_json::from_str(r#"{"sort":"price_desc","in_stock":true}"#).unwrap();
        assert_eq!(q.sort, ProductSort::PriceDesc);
        assert_eq!(q.in_stock, Some(true));

        let q: ProductListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.sort, ProductSort::Newest);
    }

    #[test]
    fn test_cache_key_distinguishes_filters() {
        let a = ProductListQuery {
            category_id: Some(1),
            ..Default::default()
        };
        let b = ProductListQuery {
            category_id: Some(2),
            ..Default::default()
        };
        assert_ne!(a.cache_key(false), b.cache_key(false));
        assert_ne!(a.cache_key(false), a.cache_key(true));
        assert!(a.cache_key(false).starts_with("products:"));
    }
}
