use rust_decimal::Decimal;
use shared::models::{Product, ProductCreate, ProductListQuery, ProductUpdate};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use super::like_pattern;

const LIST_FILTER: &str = "
    WHERE ($1 OR p.is_active)
      AND ($2::BIGINT IS NULL OR p.category_id = $2)
      AND ($3::NUMERIC IS NULL OR p.price >= $3)
      AND ($4::NUMERIC IS NULL OR p.price <= $4)
      AND ($5::TEXT IS NULL OR p.name ILIKE $5 OR p.description ILIKE $5)
      AND ($6::BOOLEAN IS NULL OR p.in_stock = $6)
      AND ($7::BOOLEAN IS NULL OR p.is_featured = $7)";

/// Filtered page of products plus the total matching count
pub async fn list(
    pool: &PgPool,
    query: &ProductListQuery,
    include_inactive: bool,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Product>, i64), sqlx::Error> {
    let search = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(like_pattern);

    let sql = format!(
        "SELECT p.* FROM products p {LIST_FILTER} ORDER BY {} LIMIT $8 OFFSET $9",
        query.sort.order_by()
    );
    let items: Vec<Product> = sqlx::query_as(&sql)
        .bind(include_inactive)
        .bind(query.category_id)
        .bind(query.min_price)
        .bind(query.max_price)
        .bind(search.as_deref())
        .bind(query.in_stock)
        .bind(query.featured)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let count_sql = format!("SELECT COUNT(*) FROM products p {LIST_FILTER}");
    let (total,): (i64,) = sqlx::query_as(&count_sql)
        .bind(include_inactive)
        .bind(query.category_id)
        .bind(query.min_price)
        .bind(query.max_price)
        .bind(search.as_deref())
        .bind(query.in_stock)
        .bind(query.featured)
        .fetch_one(pool)
        .await?;

    Ok((items, total))
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
}

/// Active products of the same category, best rated first
pub async fn related(
    pool: &PgPool,
    product: &Product,
    limit: i64,
) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM products
         WHERE is_active AND id <> $1
           AND category_id IS NOT DISTINCT FROM $2
         ORDER BY rating_avg DESC, created_at DESC
         LIMIT $3",
    )
    .bind(product.id)
    .bind(product.category_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    data: &ProductCreate,
    slug: &str,
) -> Result<Product, sqlx::Error> {
    let now = now_millis();
    sqlx::query_as(
        "INSERT INTO products (
            id, category_id, name, slug, description, price, compare_at_price,
            image, images, stock_quantity, in_stock, is_active, is_featured,
            created_at, updated_at
         )
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10 > 0, $11, $12, $13, $13)
         RETURNING *",
    )
    .bind(snowflake_id())
    .bind(data.category_id)
    .bind(&data.name)
    .bind(slug)
    .bind(data.description.as_deref())
    .bind(data.price)
    .bind(data.compare_at_price)
    .bind(data.image.as_deref())
    .bind(&data.images)
    .bind(data.stock_quantity)
    .bind(data.is_active.unwrap_or(true))
    .bind(data.is_featured.unwrap_or(false))
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    data: &ProductUpdate,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE products SET
            category_id = COALESCE($1, category_id),
            name = COALESCE($2, name),
            slug = COALESCE($3, slug),
            description = COALESCE($4, description),
            price = COALESCE($5, price),
            compare_at_price = COALESCE($6, compare_at_price),
            image = COALESCE($7, image),
            images = COALESCE($8, images),
            stock_quantity = COALESCE($9, stock_quantity),
            in_stock = COALESCE($9, stock_quantity) > 0,
            is_active = COALESCE($10, is_active),
            is_featured = COALESCE($11, is_featured),
            updated_at = $12
         WHERE id = $13
         RETURNING *",
    )
    .bind(data.category_id)
    .bind(data.name.as_deref())
    .bind(data.slug.as_deref())
    .bind(data.description.as_deref())
    .bind(data.price)
    .bind(data.compare_at_price)
    .bind(data.image.as_deref())
    .bind(data.images.as_ref())
    .bind(data.stock_quantity)
    .bind(data.is_active)
    .bind(data.is_featured)
    .bind(now_millis())
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Set absolute stock; `in_stock` follows the quantity
pub async fn set_stock(
    pool: &PgPool,
    id: i64,
    stock_quantity: i32,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE products SET stock_quantity = $1, in_stock = $1 > 0, updated_at = $2
         WHERE id = $3
         RETURNING *",
    )
    .bind(stock_quantity)
    .bind(now_millis())
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn slug_exists(pool: &PgPool, slug: &str) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM products WHERE slug = $1)")
        .bind(slug)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// Active products matching `pattern` on name or description
pub async fn search(pool: &PgPool, pattern: &str, limit: i64) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM products
         WHERE is_active AND (name ILIKE $1 OR description ILIKE $1)
         ORDER BY is_featured DESC, rating_avg DESC, name ASC
         LIMIT $2",
    )
    .bind(pattern)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Price guard shared by create and update
pub fn valid_price(price: Decimal, compare_at_price: Option<Decimal>) -> bool {
    price >= Decimal::ZERO && compare_at_price.is_none_or(|c| c >= Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_price() {
        assert!(valid_price(Decimal::from(10), None));
        assert!(valid_price(Decimal::ZERO, Some(Decimal::from(5))));
        assert!(!valid_price(Decimal::from(-1), None));
        assert!(!valid_price(Decimal::ONE, Some(Decimal::from(-1))));
    }
}
