//! Image upload API (admin)
//!
//! Stored files are served statically under `/uploads`.

mod handler;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, post},
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/upload", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(handler::upload).layer(DefaultBodyLimit::max(handler::MAX_BODY_SIZE)),
        )
        .route("/{filename}", delete(handler::delete))
}
