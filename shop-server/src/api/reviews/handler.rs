//! Review API handlers
//!
//! Every write recomputes the product's `rating_avg`/`review_count` inside
//! the same transaction.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use shared::error::{ApiResponse, ErrorCode};
use shared::models::{ProductReviews, Review, ReviewCreate, ReviewUpdate};
use shared::response::{PageQuery, Pagination};

use crate::api::{ApiResult, ok, ok_message};
use crate::auth::CurrentUser;
use crate::db;
use crate::error::{ServiceError, validate};
use crate::state::AppState;

fn invalidate_product_listings(state: &AppState) {
    state.cache.invalidate_prefix("products:");
}

/// GET /api/reviews/product/{product_id}
pub async fn list_for_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    Query(page): Query<PageQuery>,
) -> ApiResult<ProductReviews> {
    if db::products::find_by_id(&state.pool, product_id).await?.is_none() {
        return Err(ErrorCode::ProductNotFound.into());
    }
    let summary = db::reviews::summary(&state.pool, product_id).await?;
    let items =
        db::reviews::list_for_product(&state.pool, product_id, page.limit(), page.offset()).await?;
    let pagination = Pagination::new(page.page(), page.per_page(), summary.count.max(0) as u64);
    ok(ProductReviews {
        summary,
        items,
        pagination,
    })
}

/// POST /api/reviews
///
/// Only buyers with a delivered order containing the product; one review
/// per user per product.
pub async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<ReviewCreate>,
) -> Result<(StatusCode, ApiResponse<Review>), ServiceError> {
    validate(&payload)?;
    if db::products::find_by_id(&state.pool, payload.product_id).await?.is_none() {
        return Err(ErrorCode::ProductNotFound.into());
    }

    let mut tx = state.pool.begin().await?;
    if !db::reviews::has_delivered_purchase(&mut *tx, current.id, payload.product_id).await? {
        return Err(ErrorCode::ReviewNotAllowed.into());
    }
    let id = db::reviews::insert(&mut *tx, current.id, &payload)
        .await
        .map_err(|e| {
            let err = ServiceError::from(e);
            if err.is_unique_violation_on("reviews_user_product_key") {
                ServiceError::from(ErrorCode::ReviewAlreadyExists)
            } else {
                err
            }
        })?;
    db::reviews::refresh_product_rating(&mut *tx, payload.product_id).await?;
    let review = db::reviews::find_by_id(&mut *tx, id)
        .await?
        .ok_or(ErrorCode::ReviewNotFound)?;
    tx.commit().await?;

    invalidate_product_listings(&state);
    Ok((StatusCode::CREATED, ApiResponse::success(review)))
}

/// PUT /api/reviews/{id} (author only)
pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<ReviewUpdate>,
) -> ApiResult<Review> {
    validate(&payload)?;

    let mut tx = state.pool.begin().await?;
    let review = db::reviews::find_by_id(&mut *tx, id)
        .await?
        .ok_or(ErrorCode::ReviewNotFound)?;
    if review.user_id != current.id {
        return Err(ErrorCode::PermissionDenied.into());
    }
    db::reviews::update(&mut *tx, id, &payload).await?;
    db::reviews::refresh_product_rating(&mut *tx, review.product_id).await?;
    let updated = db::reviews::find_by_id(&mut *tx, id)
        .await?
        .ok_or(ErrorCode::ReviewNotFound)?;
    tx.commit().await?;

    invalidate_product_listings(&state);
    ok(updated)
}

/// DELETE /api/reviews/{id} (author or admin)
pub async fn delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    let mut tx = state.pool.begin().await?;
    let review = db::reviews::find_by_id(&mut *tx, id)
        .await?
        .ok_or(ErrorCode::ReviewNotFound)?;
    if review.user_id != current.id && !current.is_admin() {
        return Err(ErrorCode::PermissionDenied.into());
    }
    db::reviews::delete(&mut *tx, id).await?;
    db::reviews::refresh_product_rating(&mut *tx, review.product_id).await?;
    tx.commit().await?;

    if current.is_admin() && review.user_id != current.id {
        crate::audit_log!(current.id, "delete_review", format!("review:{id}"));
    }
    invalidate_product_listings(&state);
    ok_message("Review deleted")
}
