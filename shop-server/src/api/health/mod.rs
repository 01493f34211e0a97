//! Health check
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /health | GET | none |

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Serialize)]
pub struct HealthResponse {
    /// ok | degraded
    status: &'static str,
    /// up | down
    database: &'static str,
    version: &'static str,
}

/// GET /health
///
/// Always 200; a failed database ping reports `degraded`.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_ok = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
    if !database_ok {
        tracing::warn!("Health check: database unreachable");
    }
    Json(HealthResponse {
        status: if database_ok { "ok" } else { "degraded" },
        database: if database_ok { "up" } else { "down" },
        version: env!("CARGO_PKG_VERSION"),
    })
}
