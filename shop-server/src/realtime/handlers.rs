//! Socket connection handlers

use serde::Deserialize;
use socketioxide::SocketIo;
use socketioxide::extract::{Data, SocketRef, TryData};

use super::{ADMIN_ROOM, order_room, user_room};
use crate::auth::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct HandshakeAuth {
    token: String,
}

#[derive(Debug, Deserialize)]
struct OrderRoomRequest {
    order_id: i64,
}

/// Register the default-namespace handlers
pub fn register(io: &SocketIo, state: AppState) {
    io.ns("/", move |socket: SocketRef, auth: TryData<HandshakeAuth>| {
        let state = state.clone();
        async move { on_connect(socket, auth, state) }
    });
}

fn on_connect(socket: SocketRef, TryData(auth): TryData<HandshakeAuth>, state: AppState) {
    let user = auth
        .ok()
        .and_then(|auth| state.jwt.validate_token(&auth.token).ok())
        .and_then(|claims| CurrentUser::try_from(claims).ok());

    match &user {
        Some(user) => {
            socket.join(user_room(user.id));
            if user.is_admin() {
                socket.join(ADMIN_ROOM);
            }
            state.realtime.bind_session(socket.id, user.clone());
            tracing::debug!(sid = %socket.id, user_id = user.id, "Socket authenticated");
        }
        None => {
            tracing::debug!(sid = %socket.id, "Anonymous socket connected");
        }
    }

    let join_state = state.clone();
    socket.on(
        "join_order",
        move |socket: SocketRef, Data(req): Data<OrderRoomRequest>| {
            let state = join_state.clone();
            async move {
                let Some(user) = state.realtime.session(&socket.id) else {
                    return;
                };
                let allowed = if user.is_admin() {
                    true
                } else {
                    match state.orders.owner_of(req.order_id).await {
                        Ok(owner) => owner == Some(user.id),
                        Err(e) => {
                            tracing::warn!(order_id = req.order_id, error = ?e, "Order room lookup failed");
                            false
                        }
                    }
                };
                if allowed {
                    socket.join(order_room(req.order_id));
                }
            }
        },
    );

    socket.on(
        "leave_order",
        |socket: SocketRef, Data(req): Data<OrderRoomRequest>| async move {
            socket.leave(order_room(req.order_id));
        },
    );

    let disconnect_state = state;
    socket.on_disconnect(move |socket: SocketRef| {
        let state = disconnect_state.clone();
        async move {
            state.realtime.drop_session(&socket.id);
        }
    });
}
