//! Notification Model

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::response::Pagination;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "notification_kind", rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum NotificationKind {
    Order,
    System,
    Promotion,
    Chat,
    Contact,
}

/// Who receives a notification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "notification_audience", rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum NotificationAudience {
    /// The single user in `user_id`
    User,
    /// Every admin
    Admins,
    /// Everyone
    All,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Notification {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub audience: NotificationAudience,
    pub user_id: Option<i64>,
    pub link: Option<String>,
    pub scheduled_at: Option<i64>,
    pub is_sent: bool,
    pub created_at: i64,
    /// Read by the requesting user (list queries only)
    #[cfg_attr(feature = "db", sqlx(default))]
    #[serde(default)]
    pub is_read: bool,
}

/// Internal description of a notification to persist
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub audience: NotificationAudience,
    pub user_id: Option<i64>,
    pub link: Option<String>,
    pub scheduled_at: Option<i64>,
}

impl NewNotification {
    pub fn to_user(user_id: i64, kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            audience: NotificationAudience::User,
            user_id: Some(user_id),
            link: None,
            scheduled_at: None,
        }
    }

    pub fn to_admins(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            audience: NotificationAudience::Admins,
            user_id: None,
            link: None,
            scheduled_at: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// Admin `POST /api/notifications`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NotificationCreate {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    pub kind: Option<NotificationKind>,
    pub audience: NotificationAudience,
    pub user_id: Option<i64>,
    #[validate(length(max = 2048))]
    pub link: Option<String>,
    pub scheduled_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationList {
    pub items: Vec<Notification>,
    pub pagination: Pagination,
    pub unread_count: i64,
}
