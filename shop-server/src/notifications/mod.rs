//! Notification fan-out
//!
//! A notification is persisted first, then pushed to the socket room of its
//! audience. Scheduled notifications are left unsent and picked up by
//! [`sweep::NotificationSweep`].

pub mod sweep;

use shared::models::{NewNotification, Notification, NotificationAudience};
use sqlx::PgPool;

use crate::db;
use crate::error::ServiceResult;
use crate::realtime::{RealtimeHub, events};

/// Push a sent notification to its audience room
pub async fn push(realtime: &RealtimeHub, notification: &Notification) {
    match notification.audience {
        NotificationAudience::User => {
            if let Some(user_id) = notification.user_id {
                realtime
                    .to_user(user_id, events::NEW_NOTIFICATION, notification)
                    .await;
            }
        }
        NotificationAudience::Admins => {
            realtime
                .to_admins(events::NEW_NOTIFICATION, notification)
                .await;
        }
        NotificationAudience::All => {
            realtime.to_all(events::NEW_NOTIFICATION, notification).await;
        }
    }
}

/// Persist and, unless scheduled for later, push immediately
pub async fn dispatch(
    pool: &PgPool,
    realtime: &RealtimeHub,
    data: &NewNotification,
) -> ServiceResult<Notification> {
    let notification = db::notifications::insert(pool, data).await?;
    if notification.is_sent {
        push(realtime, &notification).await;
    }
    Ok(notification)
}

/// Fire-and-forget variant for side notifications of another operation;
/// failures are logged, never returned.
pub async fn notify(pool: &PgPool, realtime: &RealtimeHub, data: NewNotification) {
    if let Err(e) = dispatch(pool, realtime, &data).await {
        tracing::warn!(title = %data.title, error = ?e, "Failed to deliver notification");
    }
}
