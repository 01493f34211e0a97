//! Support chat API
//!
//! A conversation is keyed by the customer id; admins answer as a team.

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/chat", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/messages",
            get(handler::my_messages).post(handler::send_as_customer),
        )
        .route("/conversations", get(handler::conversations))
        .route(
            "/conversations/{user_id}/messages",
            get(handler::conversation_messages).post(handler::send_as_admin),
        )
        .route("/conversations/{user_id}/read", put(handler::mark_read))
}
