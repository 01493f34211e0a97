//! Contact form handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use shared::error::{ApiResponse, ErrorCode};
use shared::models::{
    ContactCreate, ContactListQuery, ContactMessage, ContactStatusUpdate, NewNotification,
    NotificationKind,
};
use shared::response::{PageQuery, PaginatedResponse};

use crate::api::{ApiResult, ok, ok_message, paginated};
use crate::audit_log;
use crate::auth::AdminUser;
use crate::db;
use crate::error::{ServiceError, validate};
use crate::notifications::notify;
use crate::state::AppState;

/// POST /api/contact (public)
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<ContactCreate>,
) -> Result<(StatusCode, ApiResponse<ContactMessage>), ServiceError> {
    validate(&payload)?;
    let message = db::contact::create(&state.pool, &payload).await?;

    let data = NewNotification::to_admins(
        NotificationKind::Contact,
        "New contact message",
        format!("{} <{}>: {}", message.name, message.email, message.subject),
    )
    .with_link("/admin/contact");
    notify(&state.pool, &state.realtime, data).await;

    Ok((StatusCode::CREATED, ApiResponse::success(message)))
}

/// GET /api/contact (admin)
pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ContactListQuery>,
) -> ApiResult<PaginatedResponse<ContactMessage>> {
    let page = PageQuery {
        page: query.page,
        per_page: query.per_page,
    };
    let (items, total) = db::contact::list(&state.pool, &query, page.limit(), page.offset()).await?;
    paginated(items, &page, total)
}

/// PUT /api/contact/{id}/status (admin)
pub async fn update_status(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<ContactStatusUpdate>,
) -> ApiResult<ContactMessage> {
    let message = db::contact::set_status(&state.pool, id, payload.status)
        .await?
        .ok_or(ErrorCode::ContactMessageNotFound)?;
    audit_log!(admin.id, "update_contact_status", format!("contact:{id}"), format!("{:?}", payload.status));
    ok(message)
}

/// DELETE /api/contact/{id} (admin)
pub async fn delete(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    if !db::contact::delete(&state.pool, id).await? {
        return Err(ErrorCode::ContactMessageNotFound.into());
    }
    audit_log!(admin.id, "delete_contact", format!("contact:{id}"));
    ok_message("Contact message deleted")
}
