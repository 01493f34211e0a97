//! Dashboard handlers (admin)

use std::time::Duration;

use axum::extract::{Query, State};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{DashboardStats, RecentOrder, SalesPoint, StatusCount, TopProduct};
use shared::util::now_millis;

use crate::api::{ApiResult, ok};
use crate::auth::AdminUser;
use crate::db;
use crate::state::AppState;

const STATS_CACHE_KEY: &str = "dashboard:stats";
const STATS_TTL: Duration = Duration::from_secs(60);
const MAX_SALES_DAYS: i64 = 365;
const DEFAULT_SALES_DAYS: i64 = 7;
const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 50;

#[derive(Debug, Default, Deserialize)]
pub struct SalesQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

impl LimitQuery {
    fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

fn sales_days(query: &SalesQuery) -> Result<i64, AppError> {
    let days = query.days.unwrap_or(DEFAULT_SALES_DAYS);
    if !(1..=MAX_SALES_DAYS).contains(&days) {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("days must be between 1 and {MAX_SALES_DAYS}"),
        ));
    }
    Ok(days)
}

/// GET /api/dashboard/stats
pub async fn stats(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<DashboardStats> {
    let pool = state.pool.clone();
    let threshold = state.config.low_stock_threshold;
    let stats = state
        .cache
        .get_or_load(STATS_CACHE_KEY, Some(STATS_TTL), || async move {
            db::dashboard::stats(&pool, threshold, now_millis()).await
        })
        .await?;
    ok(stats)
}

/// GET /api/dashboard/sales?days=N: one point per day, oldest first
pub async fn sales(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<SalesQuery>,
) -> ApiResult<Vec<SalesPoint>> {
    let days = sales_days(&query)?;
    ok(db::dashboard::sales(&state.pool, days, now_millis()).await?)
}

/// GET /api/dashboard/top-products?limit=N
pub async fn top_products(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Vec<TopProduct>> {
    ok(db::dashboard::top_products(&state.pool, query.limit()).await?)
}

/// GET /api/dashboard/recent-orders?limit=N
pub async fn recent_orders(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Vec<RecentOrder>> {
    ok(db::dashboard::recent_orders(&state.pool, query.limit()).await?)
}

/// GET /api/dashboard/order-status
pub async fn order_status(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Vec<StatusCount>> {
    ok(db::dashboard::status_counts(&state.pool).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sales_days_bounds() {
        assert_eq!(sales_days(&SalesQuery::default()).unwrap(), 7);
        assert_eq!(sales_days(&SalesQuery { days: Some(365) }).unwrap(), 365);
        assert!(sales_days(&SalesQuery { days: Some(366) }).is_err());
        assert!(sales_days(&SalesQuery { days: Some(0) }).is_err());
    }

    #[test]
    fn test_limit_clamped() {
        assert_eq!(LimitQuery::default().limit(), DEFAULT_LIMIT);
        assert_eq!(LimitQuery { limit: Some(500) }.limit(), MAX_LIMIT);
        assert_eq!(LimitQuery { limit: Some(-3) }.limit(), 1);
    }
}
