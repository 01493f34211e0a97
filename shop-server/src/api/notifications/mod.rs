//! Notification API

mod handler;

use axum::{
    Router,
    routing::{delete, get, put},
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/notifications", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        // before /{id}
        .route("/read-all", put(handler::mark_all_read))
        .route("/{id}/read", put(handler::mark_read))
        .route("/{id}", delete(handler::delete))
}
