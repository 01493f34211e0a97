use shared::models::CartLine;
use shared::util::now_millis;
use sqlx::{PgConnection, PgPool};

pub async fn lines(pool: &PgPool, user_id: i64) -> Result<Vec<CartLine>, sqlx::Error> {
    sqlx::query_as(
        "SELECT ci.product_id, ci.quantity, ci.added_at,
                p.name, p.slug, p.image, p.price, p.stock_quantity, p.in_stock, p.is_active
         FROM cart_items ci
         JOIN products p ON p.id = ci.product_id
         WHERE ci.user_id = $1
         ORDER BY ci.added_at ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn quantity_of(
    pool: &PgPool,
    user_id: i64,
    product_id: i64,
) -> Result<i32, sqlx::Error> {
    let row: Option<(i32,)> =
        sqlx::query_as("SELECT quantity FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(q,)| q).unwrap_or(0))
}

/// Add `quantity` to the caller's line in one statement.
///
/// The insert and the increment only apply while the product is active and
/// the resulting line fits in stock; `None` means nothing was written.
pub async fn add_quantity(
    pool: &PgPool,
    user_id: i64,
    product_id: i64,
    quantity: i32,
) -> Result<Option<i32>, sqlx::Error> {
    let row: Option<(i32,)> = sqlx::query_as(
        "INSERT INTO cart_items (user_id, product_id, quantity, added_at)
         SELECT $1, p.id, $3, $4 FROM products p
         WHERE p.id = $2 AND p.is_active AND p.stock_quantity >= $3
         ON CONFLICT (user_id, product_id) DO UPDATE
            SET quantity = cart_items.quantity + EXCLUDED.quantity
            WHERE cart_items.quantity + EXCLUDED.quantity <= (
                SELECT stock_quantity FROM products
                WHERE id = EXCLUDED.product_id AND is_active
            )
         RETURNING quantity",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .bind(now_millis())
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(q,)| q))
}

/// Insert or overwrite the quantity of one line
pub async fn set_quantity(
    pool: &PgPool,
    user_id: i64,
    product_id: i64,
    quantity: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO cart_items (user_id, product_id, quantity, added_at)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .bind(now_millis())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn remove(pool: &PgPool, user_id: i64, product_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn clear(conn: &mut PgConnection, user_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
