//! Contact form API

mod handler;

use axum::{
    Router,
    routing::{delete, get, put},
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/contact", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}/status", put(handler::update_status))
        .route("/{id}", delete(handler::delete))
}
