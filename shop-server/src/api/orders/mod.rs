//! Order API
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/orders | POST | user |
//! | /api/orders | GET | admin |
//! | /api/orders/my | GET | user |
//! | /api/orders/{id} | GET | owner, admin |
//! | /api/orders/{id}/history | GET | owner, admin |
//! | /api/orders/{id}/cancel | PUT | owner |
//! | /api/orders/{id}/status | PUT | admin |
//! | /api/orders/{id}/confirm-delivery | PUT | owner, admin |
//! | /api/orders/{id}/payment | PUT | admin |

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/my", get(handler::list_mine))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/history", get(handler::history))
        .route("/{id}/cancel", put(handler::cancel))
        .route("/{id}/status", put(handler::update_status))
        .route("/{id}/confirm-delivery", put(handler::confirm_delivery))
        .route("/{id}/payment", put(handler::update_payment))
}
