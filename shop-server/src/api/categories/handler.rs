//! Category API handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use shared::error::{ApiResponse, ErrorCode};
use shared::models::{Category, CategoryCreate, CategoryUpdate};
use shared::util::slugify;

use crate::api::{ApiResult, ok, ok_message};
use crate::audit_log;
use crate::auth::{AdminUser, MaybeUser};
use crate::db;
use crate::error::{ServiceError, validate};
use crate::state::AppState;

const CACHE_PREFIX: &str = "categories:";

fn invalidate(state: &AppState) {
    state.cache.invalidate_prefix(CACHE_PREFIX);
    state.cache.invalidate_prefix("products:");
}

/// Name and slug collisions both surface as a duplicate name
fn map_conflict(e: sqlx::Error) -> ServiceError {
    let err = ServiceError::from(e);
    if err.is_unique_violation_on("categories_name_key")
        || err.is_unique_violation_on("categories_slug_key")
    {
        ServiceError::from(ErrorCode::CategoryNameExists)
    } else {
        err
    }
}

/// GET /api/categories
pub async fn list(State(state): State<AppState>, viewer: MaybeUser) -> ApiResult<Vec<Category>> {
    let include_inactive = viewer.is_admin();
    let key = format!("{CACHE_PREFIX}list:{include_inactive}");
    let pool = state.pool.clone();

    let categories = state
        .cache
        .get_or_load(&key, None, || async move {
            db::categories::list_with_counts(&pool, include_inactive).await
        })
        .await?;
    ok(categories)
}

/// GET /api/categories/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<i64>,
) -> ApiResult<Category> {
    match db::categories::find_by_id(&state.pool, id).await? {
        Some(c) if c.is_active || viewer.is_admin() => ok(c),
        _ => Err(ErrorCode::CategoryNotFound.into()),
    }
}

/// POST /api/categories (admin)
pub async fn create(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<CategoryCreate>,
) -> Result<(StatusCode, ApiResponse<Category>), ServiceError> {
    validate(&payload)?;
    let slug = slugify(payload.slug.as_deref().unwrap_or(&payload.name));

    let category = db::categories::create(&state.pool, &payload, &slug)
        .await
        .map_err(map_conflict)?;
    invalidate(&state);

    audit_log!(admin.id, "create_category", format!("category:{}", category.id), &category.name);
    Ok((StatusCode::CREATED, ApiResponse::success(category)))
}

/// PUT /api/categories/{id} (admin)
pub async fn update(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    Json(mut payload): Json<CategoryUpdate>,
) -> ApiResult<Category> {
    validate(&payload)?;
    payload.slug = payload.slug.as_deref().map(slugify);

    let category = db::categories::update(&state.pool, id, &payload)
        .await
        .map_err(map_conflict)?
        .ok_or(ErrorCode::CategoryNotFound)?;
    invalidate(&state);

    audit_log!(admin.id, "update_category", format!("category:{id}"));
    ok(category)
}

/// DELETE /api/categories/{id} (admin)
///
/// Refused while any product still references the category.
pub async fn delete(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    let products = db::categories::product_count(&state.pool, id).await?;
    if products > 0 {
        return Err(shared::error::AppError::with_message(
            ErrorCode::CategoryHasProducts,
            format!("Category still has {products} products"),
        )
        .into());
    }
    if !db::categories::delete(&state.pool, id).await? {
        return Err(ErrorCode::CategoryNotFound.into());
    }
    invalidate(&state);

    audit_log!(admin.id, "delete_category", format!("category:{id}"));
    ok_message("Category deleted")
}
