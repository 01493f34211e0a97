use shared::models::{Category, CategoryCreate, CategoryUpdate};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

/// All categories with the number of products referencing each
pub async fn list_with_counts(
    pool: &PgPool,
    include_inactive: bool,
) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as(
        "SELECT c.*, COUNT(p.id) AS product_count
         FROM categories c
         LEFT JOIN products p ON p.category_id = c.id AND ($1 OR p.is_active)
         WHERE $1 OR c.is_active
         GROUP BY c.id
         ORDER BY c.name ASC",
    )
    .bind(include_inactive)
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as(
        "SELECT c.*, (SELECT COUNT(*) FROM products p WHERE p.category_id = c.id) AS product_count
         FROM categories c WHERE c.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    data: &CategoryCreate,
    slug: &str,
) -> Result<Category, sqlx::Error> {
    let now = now_millis();
    sqlx::query_as(
        "INSERT INTO categories (id, name, slug, description, image, is_active, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
         RETURNING *, 0::BIGINT AS product_count",
    )
    .bind(snowflake_id())
    .bind(&data.name)
    .bind(slug)
    .bind(data.description.as_deref())
    .bind(data.image.as_deref())
    .bind(data.is_active.unwrap_or(true))
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    data: &CategoryUpdate,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE categories SET
            name = COALESCE($1, name),
            slug = COALESCE($2, slug),
            description = COALESCE($3, description),
            image = COALESCE($4, image),
            is_active = COALESCE($5, is_active),
            updated_at = $6
         WHERE id = $7
         RETURNING *, (SELECT COUNT(*) FROM products p WHERE p.category_id = categories.id) AS product_count",
    )
    .bind(data.name.as_deref())
    .bind(data.slug.as_deref())
    .bind(data.description.as_deref())
    .bind(data.image.as_deref())
    .bind(data.is_active)
    .bind(now_millis())
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn product_count(pool: &PgPool, id: i64) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE category_id = $1")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Active categories matching `pattern` on name or description
pub async fn search(pool: &PgPool, pattern: &str, limit: i64) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as(
        "SELECT c.*, 0::BIGINT AS product_count FROM categories c
         WHERE c.is_active AND (c.name ILIKE $1 OR c.description ILIKE $1)
         ORDER BY c.name ASC
         LIMIT $2",
    )
    .bind(pattern)
    .bind(limit)
    .fetch_all(pool)
    .await
}
