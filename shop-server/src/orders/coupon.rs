//! Coupon eligibility and discount rules

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{Coupon, DiscountType};

use super::pricing::round_money;

/// Check every eligibility rule, in the order clients see them reported
pub fn check_coupon(coupon: &Coupon, subtotal: Decimal, now: i64) -> Result<(), AppError> {
    if !coupon.is_active {
        return Err(AppError::new(ErrorCode::CouponInactive));
    }
    if coupon.starts_at.is_some_and(|at| now < at) {
        return Err(AppError::new(ErrorCode::CouponNotStarted));
    }
    if coupon.expires_at.is_some_and(|at| now > at) {
        return Err(AppError::new(ErrorCode::CouponExpired));
    }
    if coupon
        .usage_limit
        .is_some_and(|limit| coupon.used_count >= limit)
    {
        return Err(AppError::new(ErrorCode::CouponUsageExceeded));
    }
    if subtotal < coupon.min_order_value {
        return Err(AppError::new(ErrorCode::CouponMinOrderNotMet)
            .with_detail("min_order_value", coupon.min_order_value.to_string()));
    }
    Ok(())
}

/// Discount granted on `subtotal`; never negative, never above the subtotal
pub fn discount_for(coupon: &Coupon, subtotal: Decimal) -> Decimal {
    let raw = match coupon.discount_type {
        DiscountType::Percentage => {
            let pct = round_money(subtotal * coupon.discount_value / Decimal::ONE_HUNDRED);
            match coupon.max_discount {
                Some(cap) => pct.min(cap),
                None => pct,
            }
        }
        DiscountType::Fixed => coupon.discount_value,
    };
    raw.max(Decimal::ZERO).min(subtotal)
}

/// Validate then compute the discount
pub fn apply_coupon(coupon: &Coupon, subtotal: Decimal, now: i64) -> Result<Decimal, AppError> {
    check_coupon(coupon, subtotal, now)?;
    Ok(discount_for(coupon, subtotal))
}
