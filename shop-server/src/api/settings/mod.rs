//! Site settings API
//!
//! Public reads, admin writes. The full map is cached and dropped on write.

mod handler;

use axum::{Router, routing::get};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/settings", routes())
}

fn routes() -> Router<AppState> {
    Router::new().route("/", get(handler::list)).route(
        "/{key}",
        get(handler::get_by_key)
            .put(handler::upsert)
            .delete(handler::delete),
    )
}
