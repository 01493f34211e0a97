//! Cart API handlers
//!
//! Every mutation answers with the full cart so clients can re-render.

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{AddCartItem, CartView, Product, UpdateCartItem};

use crate::api::{ApiResult, ok};
use crate::auth::CurrentUser;
use crate::db;
use crate::error::{ServiceError, validate};
use crate::state::AppState;

fn exceeds_stock(product: &Product) -> AppError {
    AppError::new(ErrorCode::CartQuantityExceedsStock)
        .with_detail("product_id", product.id)
        .with_detail("available", product.stock_quantity)
}

/// Quantity the cart may hold for `product`
fn check_quantity(product: &Product, quantity: i32) -> Result<(), AppError> {
    if !product.is_active {
        return Err(AppError::new(ErrorCode::ProductInactive).with_detail("product_id", product.id));
    }
    if quantity > product.stock_quantity {
        return Err(exceeds_stock(product));
    }
    Ok(())
}

async fn load_product(state: &AppState, product_id: i64) -> Result<Product, ServiceError> {
    db::products::find_by_id(&state.pool, product_id)
        .await?
        .ok_or_else(|| ErrorCode::ProductNotFound.into())
}

async fn view(state: &AppState, user_id: i64) -> ApiResult<CartView> {
    let lines = db::cart::lines(&state.pool, user_id).await?;
    ok(CartView::from_lines(lines))
}

/// GET /api/cart
pub async fn get_cart(State(state): State<AppState>, current: CurrentUser) -> ApiResult<CartView> {
    view(&state, current.id).await
}

/// POST /api/cart/items: adds to any quantity already in the cart
pub async fn add_item(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<AddCartItem>,
) -> ApiResult<CartView> {
    validate(&payload)?;
    let product = load_product(&state, payload.product_id).await?;
    check_quantity(&product, payload.quantity)?;

    let added =
        db::cart::add_quantity(&state.pool, current.id, product.id, payload.quantity).await?;
    if added.is_none() {
        // Rejected in SQL: the line plus this request is over stock, or the
        // product changed since it was read
        let product = load_product(&state, product.id).await?;
        check_quantity(&product, payload.quantity)?;
        return Err(exceeds_stock(&product).into());
    }
    view(&state, current.id).await
}

/// PUT /api/cart/items/{product_id}: zero removes the line
pub async fn update_item(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(product_id): Path<i64>,
    Json(payload): Json<UpdateCartItem>,
) -> ApiResult<CartView> {
    validate(&payload)?;
    if payload.quantity == 0 {
        db::cart::remove(&state.pool, current.id, product_id).await?;
        return view(&state, current.id).await;
    }

    if db::cart::quantity_of(&state.pool, current.id, product_id).await? == 0 {
        return Err(ErrorCode::CartItemNotFound.into());
    }
    let product = load_product(&state, product_id).await?;
    check_quantity(&product, payload.quantity)?;

    db::cart::set_quantity(&state.pool, current.id, product_id, payload.quantity).await?;
    view(&state, current.id).await
}

/// DELETE /api/cart/items/{product_id}
pub async fn remove_item(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(product_id): Path<i64>,
) -> ApiResult<CartView> {
    if !db::cart::remove(&state.pool, current.id, product_id).await? {
        return Err(ErrorCode::CartItemNotFound.into());
    }
    view(&state, current.id).await
}

/// DELETE /api/cart
pub async fn clear(State(state): State<AppState>, current: CurrentUser) -> ApiResult<CartView> {
    let mut conn = state.pool.acquire().await?;
    db::cart::clear(&mut *conn, current.id).await?;
    drop(conn);
    view(&state, current.id).await
}
