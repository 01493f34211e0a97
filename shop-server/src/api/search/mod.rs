//! Catalog search

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{Category, Product};

use crate::api::{ApiResult, ok};
use crate::db;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 50;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/search", get(search))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
}

/// Trimmed, non-empty search term
fn search_term(query: &SearchQuery) -> Result<&str, AppError> {
    query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::with_message(ErrorCode::RequiredField, "Query parameter q is required"))
}

/// GET /api/search?q=&limit=
async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<SearchResults> {
    let pattern = db::like_pattern(search_term(&query)?);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let (products, categories) = tokio::try_join!(
        db::products::search(&state.pool, &pattern, limit),
        db::categories::search(&state.pool, &pattern, limit),
    )?;
    ok(SearchResults {
        products,
        categories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_query_rejected() {
        assert!(search_term(&SearchQuery::default()).is_err());
        let q = SearchQuery {
            q: Some("   ".into()),
            limit: None,
        };
        assert!(search_term(&q).is_err());
        let q = SearchQuery {
            q: Some("  mug ".into()),
            limit: None,
        };
        assert_eq!(search_term(&q).unwrap(), "mug");
    }
}
