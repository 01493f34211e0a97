//! Product API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use shared::error::{ApiResponse, ErrorCode};
use shared::models::{Product, ProductCreate, ProductListQuery, ProductUpdate, StockUpdate};
use shared::response::{PageQuery, PaginatedResponse};
use shared::util::slugify;

use crate::api::{ApiResult, ok, ok_message};
use crate::audit_log;
use crate::auth::{AdminUser, MaybeUser};
use crate::db;
use crate::error::{ServiceError, validate};
use crate::state::AppState;

const CACHE_PREFIX: &str = "products:";
const RELATED_LIMIT: i64 = 8;

fn invalidate(state: &AppState) {
    state.cache.invalidate_prefix(CACHE_PREFIX);
    // Category listings carry product counts
    state.cache.invalidate_prefix("categories:");
}

fn slug_for(explicit: Option<&str>, name: &str) -> String {
    slugify(explicit.unwrap_or(name))
}

fn map_slug_conflict(e: sqlx::Error) -> ServiceError {
    let err = ServiceError::from(e);
    if err.is_unique_violation_on("products_slug_key") {
        ServiceError::from(ErrorCode::ProductSlugExists)
    } else {
        err
    }
}

/// Hide inactive products from non-admin callers
fn visible(product: Option<Product>, viewer: &MaybeUser) -> Result<Product, ServiceError> {
    match product {
        Some(p) if p.is_active || viewer.is_admin() => Ok(p),
        _ => Err(ErrorCode::ProductNotFound.into()),
    }
}

/// GET /api/products
pub async fn list(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Query(query): Query<ProductListQuery>,
) -> ApiResult<PaginatedResponse<Product>> {
    let include_inactive = viewer.is_admin();
    let page = PageQuery {
        page: query.page,
        per_page: query.per_page,
    };
    let key = query.cache_key(include_inactive);
    let pool = state.pool.clone();

    let response = state
        .cache
        .get_or_load(&key, None, || async move {
            let (items, total) =
                db::products::list(&pool, &query, include_inactive, page.limit(), page.offset())
                    .await?;
            Ok::<_, ServiceError>(PaginatedResponse::new(items, &page, total))
        })
        .await?;
    ok(response)
}

/// GET /api/products/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<i64>,
) -> ApiResult<Product> {
    let product = db::products::find_by_id(&state.pool, id).await?;
    ok(visible(product, &viewer)?)
}

/// GET /api/products/slug/{slug}
pub async fn get_by_slug(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(slug): Path<String>,
) -> ApiResult<Product> {
    let product = db::products::find_by_slug(&state.pool, &slug).await?;
    ok(visible(product, &viewer)?)
}

/// GET /api/products/{id}/related: same category, best rated first
pub async fn related(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<i64>,
) -> ApiResult<Vec<Product>> {
    let product = visible(db::products::find_by_id(&state.pool, id).await?, &viewer)?;
    ok(db::products::related(&state.pool, &product, RELATED_LIMIT).await?)
}

/// POST /api/products (admin)
pub async fn create(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<ProductCreate>,
) -> Result<(StatusCode, ApiResponse<Product>), ServiceError> {
    validate(&payload)?;
    if !db::products::valid_price(payload.price, payload.compare_at_price) {
        return Err(ErrorCode::ProductInvalidPrice.into());
    }

    let slug = slug_for(payload.slug.as_deref(), &payload.name);
    if db::products::slug_exists(&state.pool, &slug).await? {
        return Err(ErrorCode::ProductSlugExists.into());
    }

    let product = db::products::create(&state.pool, &payload, &slug)
        .await
        .map_err(map_slug_conflict)?;
    invalidate(&state);

    audit_log!(admin.id, "create_product", format!("product:{}", product.id), &product.name);
    Ok((StatusCode::CREATED, ApiResponse::success(product)))
}

/// PUT /api/products/{id} (admin)
pub async fn update(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    Json(mut payload): Json<ProductUpdate>,
) -> ApiResult<Product> {
    validate(&payload)?;

    let existing = db::products::find_by_id(&state.pool, id)
        .await?
        .ok_or(ErrorCode::ProductNotFound)?;
    let price = payload.price.unwrap_or(existing.price);
    let compare_at = payload.compare_at_price.or(existing.compare_at_price);
    if !db::products::valid_price(price, compare_at) {
        return Err(ErrorCode::ProductInvalidPrice.into());
    }

    if let Some(raw) = payload.slug.take() {
        let slug = slug_for(Some(&raw), &existing.name);
        if slug != existing.slug && db::products::slug_exists(&state.pool, &slug).await? {
            return Err(ErrorCode::ProductSlugExists.into());
        }
        payload.slug = Some(slug);
    }

    let product = db::products::update(&state.pool, id, &payload)
        .await
        .map_err(map_slug_conflict)?
        .ok_or(ErrorCode::ProductNotFound)?;
    invalidate(&state);

    audit_log!(admin.id, "update_product", format!("product:{id}"));
    ok(product)
}

/// PUT /api/products/{id}/stock (admin)
pub async fn update_stock(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<StockUpdate>,
) -> ApiResult<Product> {
    validate(&payload)?;
    let product = db::products::set_stock(&state.pool, id, payload.stock_quantity)
        .await?
        .ok_or(ErrorCode::ProductNotFound)?;
    invalidate(&state);

    audit_log!(
        admin.id,
        "update_stock",
        format!("product:{id}"),
        payload.stock_quantity
    );
    ok(product)
}

/// DELETE /api/products/{id} (admin)
///
/// Order items keep their snapshot; their product reference is nulled.
pub async fn delete(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    if !db::products::delete(&state.pool, id).await? {
        return Err(ErrorCode::ProductNotFound.into());
    }
    invalidate(&state);

    audit_log!(admin.id, "delete_product", format!("product:{id}"));
    ok_message("Product deleted")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_prefers_explicit_value() {
        assert_eq!(slug_for(Some("Summer Sale"), "ignored"), "summer-sale");
        assert_eq!(slug_for(None, "Red Shoes"), "red-shoes");
    }
}
