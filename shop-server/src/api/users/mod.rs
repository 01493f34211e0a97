//! User API
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/users/me | PUT | user |
//! | /api/users/me/addresses | GET, POST | user |
//! | /api/users/me/addresses/{id} | PUT, DELETE | user |
//! | /api/users | GET | admin |
//! | /api/users/{id} | GET, PUT, DELETE | admin |

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/users", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list))
        // before /{id}
        .route("/me", put(handler::update_profile))
        .route(
            "/me/addresses",
            get(handler::list_addresses).post(handler::create_address),
        )
        .route(
            "/me/addresses/{id}",
            put(handler::update_address).delete(handler::delete_address),
        )
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::admin_update)
                .delete(handler::delete),
        )
}
