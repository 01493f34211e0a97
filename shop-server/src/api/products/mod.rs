//! Product API
//!
//! Public reads see active products only; admins see everything.
//! Listings are cached under the `products:` prefix and dropped on any write.

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/products", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/slug/{slug}", get(handler::get_by_slug))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/related", get(handler::related))
        .route("/{id}/stock", put(handler::update_stock))
}
