//! Notification handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Serialize;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{
    NewNotification, Notification, NotificationAudience, NotificationCreate, NotificationKind,
    NotificationList,
};
use shared::response::{PageQuery, Pagination};

use crate::api::{ApiResult, ok, ok_message};
use crate::audit_log;
use crate::auth::{AdminUser, CurrentUser};
use crate::db;
use crate::error::{ServiceError, validate};
use crate::notifications::dispatch;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ReadAllResult {
    pub updated: u64,
}

/// Audience and recipient must agree
fn to_new_notification(payload: NotificationCreate) -> Result<NewNotification, AppError> {
    let user_id = match payload.audience {
        NotificationAudience::User => Some(payload.user_id.ok_or_else(|| {
            AppError::with_message(
                ErrorCode::RequiredField,
                "user_id is required for USER notifications",
            )
        })?),
        NotificationAudience::Admins | NotificationAudience::All => None,
    };
    Ok(NewNotification {
        title: payload.title,
        message: payload.message,
        kind: payload.kind.unwrap_or(NotificationKind::System),
        audience: payload.audience,
        user_id,
        link: payload.link,
        scheduled_at: payload.scheduled_at,
    })
}

/// GET /api/notifications: the caller's sent notifications with unread count
pub async fn list(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(page): Query<PageQuery>,
) -> ApiResult<NotificationList> {
    let (items, total, unread_count) = db::notifications::list_visible(
        &state.pool,
        current.id,
        current.is_admin(),
        page.limit(),
        page.offset(),
    )
    .await?;
    ok(NotificationList {
        items,
        pagination: Pagination::new(page.page(), page.per_page(), total.max(0) as u64),
        unread_count,
    })
}

/// PUT /api/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    let visible =
        db::notifications::mark_read(&state.pool, id, current.id, current.is_admin()).await?;
    if !visible {
        return Err(ErrorCode::NotificationNotFound.into());
    }
    ok_message("Notification marked as read")
}

/// PUT /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<ReadAllResult> {
    let updated =
        db::notifications::mark_all_read(&state.pool, current.id, current.is_admin()).await?;
    ok(ReadAllResult { updated })
}

/// POST /api/notifications (admin)
///
/// Immediate notifications are pushed now; a future `scheduled_at` leaves
/// the row for the sweep.
pub async fn create(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<NotificationCreate>,
) -> Result<(StatusCode, ApiResponse<Notification>), ServiceError> {
    validate(&payload)?;
    let data = to_new_notification(payload)?;
    if let Some(user_id) = data.user_id
        && db::users::find_by_id(&state.pool, user_id).await?.is_none()
    {
        return Err(ErrorCode::UserNotFound.into());
    }

    let notification = dispatch(&state.pool, &state.realtime, &data).await?;
    audit_log!(
        admin.id,
        "create_notification",
        format!("notification:{}", notification.id),
        if notification.is_sent { "sent" } else { "scheduled" }
    );
    Ok((StatusCode::CREATED, ApiResponse::success(notification)))
}

/// DELETE /api/notifications/{id} (admin)
pub async fn delete(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    if !db::notifications::delete(&state.pool, id).await? {
        return Err(ErrorCode::NotificationNotFound.into());
    }
    audit_log!(admin.id, "delete_notification", format!("notification:{id}"));
    ok_message("Notification deleted")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(audience: NotificationAudience, user_id: Option<i64>) -> NotificationCreate {
        NotificationCreate {
            title: "Sale".into(),
            message: "Everything 10% off".into(),
            kind: None,
            audience,
            user_id,
            link: None,
            scheduled_at: None,
        }
    }

    #[test]
    fn test_user_audience_requires_recipient() {
        let err = to_new_notification(payload(NotificationAudience::User, None)).unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);
        let ok = to_new_notification(payload(NotificationAudience::User, Some(9))).unwrap();
        assert_eq!(ok.user_id, Some(9));
    }

    #[test]
    fn test_broadcast_drops_recipient_and_defaults_kind() {
        let n = to_new_notification(payload(NotificationAudience::All, Some(9))).unwrap();
        assert_eq!(n.user_id, None);
        assert_eq!(n.kind, NotificationKind::System);
    }
}
