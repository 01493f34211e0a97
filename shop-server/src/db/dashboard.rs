use rust_decimal::Decimal;
use shared::models::{DashboardStats, RecentOrder, SalesPoint, StatusCount, TopProduct};
use sqlx::PgPool;

const DAY_MILLIS: i64 = 86_400_000;

/// Headline numbers; revenue counts paid orders only
pub async fn stats(
    pool: &PgPool,
    low_stock_threshold: i32,
    now: i64,
) -> Result<DashboardStats, sqlx::Error> {
    let today_start = now - now.rem_euclid(DAY_MILLIS);

    let (total_revenue, total_orders, pending_orders, today_revenue, today_orders): (
        Decimal,
        i64,
        i64,
        Decimal,
        i64,
    ) = sqlx::query_as(
        "SELECT
            COALESCE(SUM(total) FILTER (WHERE payment_status = 'PAID'), 0),
            COUNT(*),
            COUNT(*) FILTER (WHERE status = 'PENDING'),
            COALESCE(SUM(total) FILTER (WHERE payment_status = 'PAID' AND created_at >= $1), 0),
            COUNT(*) FILTER (WHERE created_at >= $1)
         FROM orders",
    )
    .bind(today_start)
    .fetch_one(pool)
    .await?;

    let (total_customers,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = 'CUSTOMER'")
            .fetch_one(pool)
            .await?;

    let (total_products, low_stock_products): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_active AND stock_quantity <= $1) FROM products",
    )
    .bind(low_stock_threshold)
    .fetch_one(pool)
    .await?;

    Ok(DashboardStats {
        total_revenue,
        total_orders,
        total_customers,
        total_products,
        pending_orders,
        low_stock_products,
        today_revenue,
        today_orders,
    })
}

/// Daily revenue (paid) and order count for the last `days` days, gaps filled with zero
pub async fn sales(pool: &PgPool, days: i64, now: i64) -> Result<Vec<SalesPoint>, sqlx::Error> {
    let today_start = now - now.rem_euclid(DAY_MILLIS);
    let from = today_start - (days - 1) * DAY_MILLIS;
    sqlx::query_as(
        "SELECT
            TO_CHAR(d.day, 'YYYY-MM-DD') AS date,
            COALESCE(SUM(o.total) FILTER (WHERE o.payment_status = 'PAID'), 0) AS revenue,
            COUNT(o.id) AS orders
         FROM generate_series(
                TO_TIMESTAMP($1 / 1000.0) AT TIME ZONE 'UTC',
                TO_TIMESTAMP($2 / 1000.0) AT TIME ZONE 'UTC',
                INTERVAL '1 day'
              ) AS d(day)
         LEFT JOIN orders o
           ON o.created_at >= (EXTRACT(EPOCH FROM d.day) * 1000)::BIGINT
          AND o.created_at < (EXTRACT(EPOCH FROM d.day) * 1000)::BIGINT + $3
         GROUP BY d.day
         ORDER BY d.day ASC",
    )
    .bind(from)
    .bind(today_start)
    .bind(DAY_MILLIS)
    .fetch_all(pool)
    .await
}

/// Best sellers by quantity over non-cancelled orders
pub async fn top_products(pool: &PgPool, limit: i64) -> Result<Vec<TopProduct>, sqlx::Error> {
    sqlx::query_as(
        "SELECT oi.product_id,
                MAX(oi.product_name) AS product_name,
                SUM(oi.quantity)::BIGINT AS quantity_sold,
                SUM(oi.subtotal) AS revenue
         FROM order_items oi
         JOIN orders o ON o.id = oi.order_id
         WHERE o.status NOT IN ('CANCELLED', 'REFUNDED')
         GROUP BY oi.product_id
         ORDER BY quantity_sold DESC, revenue DESC
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn recent_orders(pool: &PgPool, limit: i64) -> Result<Vec<RecentOrder>, sqlx::Error> {
    sqlx::query_as(
        "SELECT o.id, o.user_id, u.full_name AS customer_name, o.total, o.status,
                o.payment_status, o.created_at
         FROM orders o
         JOIN users u ON u.id = o.user_id
         ORDER BY o.created_at DESC
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn status_counts(pool: &PgPool) -> Result<Vec<StatusCount>, sqlx::Error> {
    sqlx::query_as("SELECT status, COUNT(*) AS count FROM orders GROUP BY status ORDER BY status")
        .fetch_all(pool)
        .await
}
