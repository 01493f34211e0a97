//! Coupon API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{
    Coupon, CouponCreate, CouponPreview, CouponUpdate, CouponValidateRequest, DiscountType,
};
use shared::response::{PageQuery, PaginatedResponse};
use shared::util::now_millis;

use crate::api::{ApiResult, ok, ok_message, paginated};
use crate::audit_log;
use crate::auth::{AdminUser, CurrentUser};
use crate::db;
use crate::error::{ServiceError, validate};
use crate::orders::coupon::apply_coupon;
use crate::state::AppState;

/// Value rules the derive validators cannot express
fn check_terms(
    discount_type: DiscountType,
    value: Decimal,
    starts_at: Option<i64>,
    expires_at: Option<i64>,
) -> Result<(), AppError> {
    if value <= Decimal::ZERO {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "discount_value must be positive",
        ));
    }
    if discount_type == DiscountType::Percentage && value > Decimal::ONE_HUNDRED {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "percentage discount cannot exceed 100",
        ));
    }
    if let (Some(start), Some(end)) = (starts_at, expires_at)
        && start > end
    {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "starts_at must not be after expires_at",
        ));
    }
    Ok(())
}

fn map_code_conflict(e: sqlx::Error) -> ServiceError {
    let err = ServiceError::from(e);
    if err.is_unique_violation_on("coupons_code_key") {
        ServiceError::from(ErrorCode::CouponCodeExists)
    } else {
        err
    }
}

/// POST /api/coupons/validate
///
/// Preview only: the usage counter moves at checkout.
pub async fn validate_code(
    State(state): State<AppState>,
    _current: CurrentUser,
    Json(payload): Json<CouponValidateRequest>,
) -> ApiResult<CouponPreview> {
    validate(&payload)?;
    if payload.subtotal < Decimal::ZERO {
        return Err(AppError::with_message(ErrorCode::ValueOutOfRange, "subtotal must not be negative").into());
    }
    let mut conn = state.pool.acquire().await?;
    let coupon = db::coupons::find_by_code(&mut *conn, &payload.code)
        .await?
        .ok_or(ErrorCode::CouponNotFound)?;
    drop(conn);

    let discount = apply_coupon(&coupon, payload.subtotal, now_millis())?;
    ok(CouponPreview {
        code: coupon.code,
        discount_type: coupon.discount_type,
        discount_value: coupon.discount_value,
        discount,
        subtotal_after_discount: payload.subtotal - discount,
    })
}

/// GET /api/coupons (admin)
pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(page): Query<PageQuery>,
) -> ApiResult<PaginatedResponse<Coupon>> {
    let (items, total) = db::coupons::list(&state.pool, &page).await?;
    paginated(items, &page, total)
}

/// GET /api/coupons/{id} (admin)
pub async fn get_by_id(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<Coupon> {
    let coupon = db::coupons::find_by_id(&state.pool, id)
        .await?
        .ok_or(ErrorCode::CouponNotFound)?;
    ok(coupon)
}

/// POST /api/coupons (admin)
pub async fn create(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<CouponCreate>,
) -> Result<(StatusCode, ApiResponse<Coupon>), ServiceError> {
    validate(&payload)?;
    check_terms(
        payload.discount_type,
        payload.discount_value,
        payload.starts_at,
        payload.expires_at,
    )?;

    let coupon = db::coupons::create(&state.pool, &payload)
        .await
        .map_err(map_code_conflict)?;

    audit_log!(admin.id, "create_coupon", format!("coupon:{}", coupon.id), &coupon.code);
    Ok((StatusCode::CREATED, ApiResponse::success(coupon)))
}

/// PUT /api/coupons/{id} (admin)
pub async fn update(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<CouponUpdate>,
) -> ApiResult<Coupon> {
    validate(&payload)?;
    let existing = db::coupons::find_by_id(&state.pool, id)
        .await?
        .ok_or(ErrorCode::CouponNotFound)?;
    check_terms(
        payload.discount_type.unwrap_or(existing.discount_type),
        payload.discount_value.unwrap_or(existing.discount_value),
        payload.starts_at.or(existing.starts_at),
        payload.expires_at.or(existing.expires_at),
    )?;

    let coupon = db::coupons::update(&state.pool, id, &payload)
        .await
        .map_err(map_code_conflict)?
        .ok_or(ErrorCode::CouponNotFound)?;

    audit_log!(admin.id, "update_coupon", format!("coupon:{id}"));
    ok(coupon)
}

/// DELETE /api/coupons/{id} (admin)
pub async fn delete(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    if !db::coupons::delete(&state.pool, id).await? {
        return Err(ErrorCode::CouponNotFound.into());
    }
    audit_log!(admin.id, "delete_coupon", format!("coupon:{id}"));
    ok_message("Coupon deleted")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_above_hundred_rejected() {
        let err = check_terms(DiscountType::Percentage, Decimal::from(150), None, None)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
        assert!(check_terms(DiscountType::Fixed, Decimal::from(150), None, None).is_ok());
    }

    #[test]
    fn test_non_positive_value_rejected() {
        assert!(check_terms(DiscountType::Fixed, Decimal::ZERO, None, None).is_err());
    }

    #[test]
    fn test_window_must_be_ordered() {
        assert!(check_terms(DiscountType::Fixed, Decimal::ONE, Some(10), Some(5)).is_err());
        assert!(check_terms(DiscountType::Fixed, Decimal::ONE, Some(5), Some(10)).is_ok());
    }
}
