//! Review API

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/reviews", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handler::create))
        .route("/product/{product_id}", get(handler::list_for_product))
        .route("/{id}", put(handler::update).delete(handler::delete))
}
