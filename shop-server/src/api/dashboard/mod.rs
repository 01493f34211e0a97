//! Admin dashboard API

mod handler;

use axum::{Router, routing::get};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/dashboard", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(handler::stats))
        .route("/sales", get(handler::sales))
        .route("/top-products", get(handler::top_products))
        .route("/recent-orders", get(handler::recent_orders))
        .route("/order-status", get(handler::order_status))
}
