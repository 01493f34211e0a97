use shared::models::{Coupon, CouponCreate, CouponUpdate};
use shared::response::PageQuery;
use shared::util::{now_millis, snowflake_id};
use sqlx::{PgConnection, PgPool};

pub async fn list(pool: &PgPool, page: &PageQuery) -> Result<(Vec<Coupon>, i64), sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM coupons ORDER BY created_at DESC LIMIT $1 OFFSET $2")
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await?;
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM coupons")
        .fetch_one(pool)
        .await?;
    Ok((items, total))
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Coupon>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM coupons WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_code(conn: &mut PgConnection, code: &str) -> Result<Option<Coupon>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM coupons WHERE code = UPPER($1)")
        .bind(code.trim())
        .fetch_optional(conn)
        .await
}

pub async fn create(pool: &PgPool, data: &CouponCreate) -> Result<Coupon, sqlx::Error> {
    let now = now_millis();
    sqlx::query_as(
        "INSERT INTO coupons (
            id, code, description, discount_type, discount_value, min_order_value,
            max_discount, usage_limit, used_count, starts_at, expires_at, is_active,
            created_at, updated_at
         )
         VALUES ($1, UPPER($2), $3, $4, $5, $6, $7, $8, 0, $9, $10, $11, $12, $12)
         RETURNING *",
    )
    .bind(snowflake_id())
    .bind(data.code.trim())
    .bind(data.description.as_deref())
    .bind(data.discount_type)
    .bind(data.discount_value)
    .bind(data.min_order_value.unwrap_or_default())
    .bind(data.max_discount)
    .bind(data.usage_limit)
    .bind(data.starts_at)
    .bind(data.expires_at)
    .bind(data.is_active.unwrap_or(true))
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    data: &CouponUpdate,
) -> Result<Option<Coupon>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE coupons SET
            code = COALESCE(UPPER($1), code),
            description = COALESCE($2, description),
            discount_type = COALESCE($3, discount_type),
            discount_value = COALESCE($4, discount_value),
            min_order_value = COALESCE($5, min_order_value),
            max_discount = COALESCE($6, max_discount),
            usage_limit = COALESCE($7, usage_limit),
            starts_at = COALESCE($8, starts_at),
            expires_at = COALESCE($9, expires_at),
            is_active = COALESCE($10, is_active),
            updated_at = $11
         WHERE id = $12
         RETURNING *",
    )
    .bind(data.code.as_deref().map(str::trim))
    .bind(data.description.as_deref())
    .bind(data.discount_type)
    .bind(data.discount_value)
    .bind(data.min_order_value)
    .bind(data.max_discount)
    .bind(data.usage_limit)
    .bind(data.starts_at)
    .bind(data.expires_at)
    .bind(data.is_active)
    .bind(now_millis())
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
