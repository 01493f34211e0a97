//! Support chat handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Serialize;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{ChatMessage, Conversation, SendMessageRequest, UserRole};
use shared::response::{PageQuery, PaginatedResponse};

use crate::api::{ApiResult, ok, paginated};
use crate::auth::{AdminUser, CurrentUser};
use crate::db;
use crate::error::{ServiceError, validate};
use crate::realtime::events;
use crate::state::AppState;

const PREVIEW_CHARS: usize = 100;

/// Payload of `new_message_notification`
#[derive(Debug, Serialize)]
struct NewMessageNotice<'a> {
    customer_id: i64,
    sender_email: &'a str,
    preview: String,
    created_at: i64,
}

#[derive(Debug, Serialize)]
pub struct ReadResult {
    pub updated: u64,
}

fn message_content(payload: &SendMessageRequest) -> Result<String, AppError> {
    let content = payload.content.trim();
    if content.is_empty() {
        return Err(AppError::new(ErrorCode::ChatMessageEmpty));
    }
    Ok(content.to_string())
}

fn preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_CHARS {
        content.to_string()
    } else {
        let cut: String = content.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}…")
    }
}

/// Deliver a stored message to both sides of the conversation
async fn fan_out(state: &AppState, message: &ChatMessage) {
    state
        .realtime
        .to_user(message.customer_id, events::RECEIVE_MESSAGE, message)
        .await;
    state
        .realtime
        .to_admins(events::RECEIVE_MESSAGE, message)
        .await;
}

/// GET /api/chat/messages: the caller's own conversation
pub async fn my_messages(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(page): Query<PageQuery>,
) -> ApiResult<PaginatedResponse<ChatMessage>> {
    let (items, total) =
        db::chat::messages(&state.pool, current.id, page.limit(), page.offset()).await?;
    paginated(items, &page, total)
}

/// POST /api/chat/messages: customer writes to support
pub async fn send_as_customer(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<SendMessageRequest>,
) -> Result<(StatusCode, ApiResponse<ChatMessage>), ServiceError> {
    let content = message_content(&payload)?;
    validate(&payload)?;

    let message = db::chat::insert(&state.pool, current.id, current.id, current.role, &content).await?;
    fan_out(&state, &message).await;

    if !current.is_admin() {
        let notice = NewMessageNotice {
            customer_id: current.id,
            sender_email: &current.email,
            preview: preview(&message.content),
            created_at: message.created_at,
        };
        state
            .realtime
            .to_admins(events::NEW_MESSAGE_NOTIFICATION, &notice)
            .await;
    }

    Ok((StatusCode::CREATED, ApiResponse::success(message)))
}

/// GET /api/chat/conversations (admin)
pub async fn conversations(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Vec<Conversation>> {
    ok(db::chat::conversations(&state.pool).await?)
}

/// GET /api/chat/conversations/{user_id}/messages (admin)
pub async fn conversation_messages(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<i64>,
    Query(page): Query<PageQuery>,
) -> ApiResult<PaginatedResponse<ChatMessage>> {
    let (items, total) =
        db::chat::messages(&state.pool, user_id, page.limit(), page.offset()).await?;
    paginated(items, &page, total)
}

/// POST /api/chat/conversations/{user_id}/messages (admin reply)
pub async fn send_as_admin(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(user_id): Path<i64>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<(StatusCode, ApiResponse<ChatMessage>), ServiceError> {
    let content = message_content(&payload)?;
    validate(&payload)?;
    if db::users::find_by_id(&state.pool, user_id).await?.is_none() {
        return Err(ErrorCode::UserNotFound.into());
    }

    let message = db::chat::insert(&state.pool, user_id, admin.id, UserRole::Admin, &content).await?;
    fan_out(&state, &message).await;

    Ok((StatusCode::CREATED, ApiResponse::success(message)))
}

/// PUT /api/chat/conversations/{user_id}/read
///
/// Marks the other side's messages read. Customers may only pass their own id.
pub async fn mark_read(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<i64>,
) -> ApiResult<ReadResult> {
    if !current.is_admin() && current.id != user_id {
        return Err(ErrorCode::PermissionDenied.into());
    }
    let updated = db::chat::mark_read(&state.pool, user_id, current.role).await?;
    ok(ReadResult { updated })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_message_rejected() {
        let req = SendMessageRequest {
            content: "   \n ".into(),
        };
        assert_eq!(
            message_content(&req).unwrap_err().code,
            ErrorCode::ChatMessageEmpty
        );
        let req = SendMessageRequest {
            content: "  hello ".into(),
        };
        assert_eq!(message_content(&req).unwrap(), "hello");
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "é".repeat(150);
        let p = preview(&long);
        assert_eq!(p.chars().count(), PREVIEW_CHARS + 1);
        assert_eq!(preview("short"), "short");
    }
}
