//! Coupon Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "discount_type", rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum DiscountType {
    /// `discount_value` is a percentage of the subtotal
    Percentage,
    /// `discount_value` is an absolute amount
    Fixed,
}

/// Coupon entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Coupon {
    pub id: i64,
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_order_value: Decimal,
    pub max_discount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub starts_at: Option<i64>,
    pub expires_at: Option<i64>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CouponCreate {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_order_value: Option<Decimal>,
    pub max_discount: Option<Decimal>,
    #[validate(range(min = 1))]
    pub usage_limit: Option<i32>,
    pub starts_at: Option<i64>,
    pub expires_at: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CouponUpdate {
    #[validate(length(min = 1, max = 64))]
    pub code: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<Decimal>,
    pub min_order_value: Option<Decimal>,
    pub max_discount: Option<Decimal>,
    #[validate(range(min = 1))]
    pub usage_limit: Option<i32>,
    pub starts_at: Option<i64>,
    pub expires_at: Option<i64>,
    pub is_active: Option<bool>,
}

/// `POST /api/coupons/validate`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CouponValidateRequest {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    pub subtotal: Decimal,
}

/// Discount preview returned by coupon validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponPreview {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub discount: Decimal,
    pub subtotal_after_discount: Decimal,
}
