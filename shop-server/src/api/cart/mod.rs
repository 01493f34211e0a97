//! Cart API (authenticated)

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/cart", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::get_cart).delete(handler::clear))
        .route("/items", post(handler::add_item))
        .route(
            "/items/{product_id}",
            put(handler::update_item).delete(handler::remove_item),
        )
}
