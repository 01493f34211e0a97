//! User API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use shared::error::{ApiResponse, ErrorCode};
use shared::models::{
    Address, AddressCreate, AddressUpdate, AdminUserUpdate, ProfileUpdate, User, UserListQuery,
};
use shared::response::{PageQuery, PaginatedResponse};

use crate::api::{ApiResult, ok, ok_message, paginated};
use crate::audit_log;
use crate::auth::{AdminUser, CurrentUser};
use crate::db;
use crate::error::{ServiceError, validate};
use crate::state::AppState;

/// PUT /api/users/me
pub async fn update_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<ProfileUpdate>,
) -> ApiResult<User> {
    validate(&payload)?;
    let user = db::users::update_profile(&state.pool, current.id, &payload)
        .await?
        .ok_or(ErrorCode::UserNotFound)?;
    ok(user)
}

/// GET /api/users/me/addresses
pub async fn list_addresses(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Vec<Address>> {
    ok(db::addresses::list_for_user(&state.pool, current.id).await?)
}

/// POST /api/users/me/addresses
pub async fn create_address(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<AddressCreate>,
) -> Result<(StatusCode, ApiResponse<Address>), ServiceError> {
    validate(&payload)?;
    let mut tx = state.pool.begin().await?;
    let address = db::addresses::create(&mut *tx, current.id, &payload).await?;
    tx.commit().await?;
    Ok((StatusCode::CREATED, ApiResponse::success(address)))
}

/// PUT /api/users/me/addresses/{id}
pub async fn update_address(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<AddressUpdate>,
) -> ApiResult<Address> {
    validate(&payload)?;
    let mut tx = state.pool.begin().await?;
    // Dropping the transaction on the error path undoes the cleared default.
    let address = db::addresses::update(&mut *tx, current.id, id, &payload)
        .await?
        .ok_or(ErrorCode::AddressNotFound)?;
    tx.commit().await?;
    ok(address)
}

/// DELETE /api/users/me/addresses/{id}
pub async fn delete_address(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    if !db::addresses::delete(&state.pool, current.id, id).await? {
        return Err(ErrorCode::AddressNotFound.into());
    }
    ok_message("Address deleted")
}

/// GET /api/users (admin)
pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<UserListQuery>,
) -> ApiResult<PaginatedResponse<User>> {
    let page = PageQuery {
        page: query.page,
        per_page: query.per_page,
    };
    let (users, total) = db::users::list(&state.pool, &query, page.limit(), page.offset()).await?;
    paginated(users, &page, total)
}

/// GET /api/users/{id} (admin)
pub async fn get_by_id(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<User> {
    let user = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or(ErrorCode::UserNotFound)?;
    ok(user)
}

/// PUT /api/users/{id} (admin): role and active flag
pub async fn admin_update(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<AdminUserUpdate>,
) -> ApiResult<User> {
    let user = db::users::admin_update(&state.pool, id, &payload)
        .await?
        .ok_or(ErrorCode::UserNotFound)?;
    audit_log!(
        admin.id,
        "update_user",
        format!("user:{id}"),
        format!("role={} active={}", user.role.as_str(), user.is_active)
    );
    ok(user)
}

/// DELETE /api/users/{id} (admin)
pub async fn delete(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    if admin.id == id {
        return Err(ErrorCode::CannotDeleteSelf.into());
    }
    if !db::users::delete(&state.pool, id).await? {
        return Err(ErrorCode::UserNotFound.into());
    }
    audit_log!(admin.id, "delete_user", format!("user:{id}"));
    ok_message("User deleted")
}
