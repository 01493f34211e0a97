//! Realtime delivery over socket.io
//!
//! Rooms:
//! - `user_{id}`: every socket authenticated as that user
//! - `admin_notifications`: every admin socket
//! - `order_{id}`: sockets following one order (owner or admin)

mod handlers;

pub use handlers::register;

use dashmap::DashMap;
use serde::Serialize;
use socketioxide::SocketIo;
use socketioxide::socket::Sid;
use std::sync::Arc;

use crate::auth::CurrentUser;

pub const ADMIN_ROOM: &str = "admin_notifications";

/// Server → client events
pub mod events {
    pub const NEW_NOTIFICATION: &str = "new_notification";
    pub const RECEIVE_MESSAGE: &str = "receive_message";
    pub const ORDER_UPDATED: &str = "order_updated";
    pub const NEW_MESSAGE_NOTIFICATION: &str = "new_message_notification";
}

pub fn user_room(user_id: i64) -> String {
    format!("user_{user_id}")
}

pub fn order_room(order_id: i64) -> String {
    format!("order_{order_id}")
}

/// Handle for pushing events to socket rooms
///
/// A hub without a `SocketIo` drops every emit, which is what unit and
/// router tests run with.
#[derive(Clone, Default)]
pub struct RealtimeHub {
    io: Option<SocketIo>,
    sessions: Arc<DashMap<Sid, CurrentUser>>,
}

impl std::fmt::Debug for RealtimeHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeHub")
            .field("enabled", &self.io.is_some())
            .field("sessions", &self.sessions.len())
            .finish()
    }
}

impl RealtimeHub {
    pub fn new(io: SocketIo) -> Self {
        Self {
            io: Some(io),
            sessions: Arc::new(DashMap::new()),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.io.is_some()
    }

    /// Number of authenticated sockets
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub(crate) fn bind_session(&self, sid: Sid, user: CurrentUser) {
        self.sessions.insert(sid, user);
    }

    pub(crate) fn session(&self, sid: &Sid) -> Option<CurrentUser> {
        self.sessions.get(sid).map(|entry| entry.value().clone())
    }

    pub(crate) fn drop_session(&self, sid: &Sid) {
        self.sessions.remove(sid);
    }

    async fn emit_room<T: Serialize + ?Sized>(&self, room: String, event: &'static str, data: &T) {
        let Some(io) = &self.io else {
            return;
        };
        if let Err(e) = io.to(room.clone()).emit(event, data).await {
            tracing::warn!(room = %room, event, error = %e, "Socket emit failed");
        }
    }

    pub async fn to_user<T: Serialize + ?Sized>(&self, user_id: i64, event: &'static str, data: &T) {
        self.emit_room(user_room(user_id), event, data).await;
    }

    pub async fn to_admins<T: Serialize + ?Sized>(&self, event: &'static str, data: &T) {
        self.emit_room(ADMIN_ROOM.to_string(), event, data).await;
    }

    pub async fn to_order<T: Serialize + ?Sized>(&self, order_id: i64, event: &'static str, data: &T) {
        self.emit_room(order_room(order_id), event, data).await;
    }

    /// Broadcast to every connected socket, authenticated or not
    pub async fn to_all<T: Serialize + ?Sized>(&self, event: &'static str, data: &T) {
        let Some(io) = &self.io else {
            return;
        };
        if let Err(e) = io.emit(event, data).await {
            tracing::warn!(event, error = %e, "Socket broadcast failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_names() {
        assert_eq!(user_room(7), "user_7");
        assert_eq!(order_room(12), "order_12");
    }

    #[tokio::test]
    async fn test_disabled_hub_drops_emits() {
        let hub = RealtimeHub::disabled();
        assert!(!hub.is_enabled());
        hub.to_user(1, events::ORDER_UPDATED, &serde_json::json!({"id": 1}))
            .await;
        hub.to_all(events::NEW_NOTIFICATION, "hello").await;
        assert_eq!(hub.session_count(), 0);
    }
}
