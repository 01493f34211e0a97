use shared::models::{RatingSummary, Review, ReviewCreate, ReviewUpdate};
use shared::util::{now_millis, snowflake_id};
use sqlx::{PgConnection, PgPool};

const SELECT_REVIEW: &str = "
    SELECT r.*, u.full_name AS user_name
    FROM reviews r
    JOIN users u ON u.id = r.user_id";

pub async fn list_for_product(
    pool: &PgPool,
    product_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<Review>, sqlx::Error> {
    let sql = format!(
        "{SELECT_REVIEW} WHERE r.product_id = $1 ORDER BY r.created_at DESC, r.id DESC LIMIT $2 OFFSET $3"
    );
    sqlx::query_as(&sql)
        .bind(product_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

pub async fn summary(pool: &PgPool, product_id: i64) -> Result<RatingSummary, sqlx::Error> {
    let rows: Vec<(i16, i64)> = sqlx::query_as(
        "SELECT rating, COUNT(*) FROM reviews WHERE product_id = $1 GROUP BY rating",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(summarize(&rows))
}

/// Fold `(rating, count)` rows into a summary
pub fn summarize(rows: &[(i16, i64)]) -> RatingSummary {
    let mut distribution = [0i64; 5];
    let mut count = 0i64;
    let mut sum = 0i64;
    for &(rating, n) in rows {
        if (1..=5).contains(&rating) {
            distribution[(rating - 1) as usize] += n;
            count += n;
            sum += i64::from(rating) * n;
        }
    }
    let average = if count == 0 {
        0.0
    } else {
        ((sum as f64 / count as f64) * 100.0).round() / 100.0
    };
    RatingSummary {
        average,
        count,
        distribution,
    }
}

pub async fn find_by_id(
    conn: &mut PgConnection,
    id: i64,
) -> Result<Option<Review>, sqlx::Error> {
    let sql = format!("{SELECT_REVIEW} WHERE r.id = $1");
    sqlx::query_as(&sql).bind(id).fetch_optional(conn).await
}

/// Whether `user_id` has a delivered order containing `product_id`
pub async fn has_delivered_purchase(
    conn: &mut PgConnection,
    user_id: i64,
    product_id: i64,
) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS(
            SELECT 1 FROM orders o
            JOIN order_items oi ON oi.order_id = o.id
            WHERE o.user_id = $1 AND oi.product_id = $2 AND o.status = 'DELIVERED'
         )",
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_one(conn)
    .await?;
    Ok(exists)
}

pub async fn insert(
    conn: &mut PgConnection,
    user_id: i64,
    data: &ReviewCreate,
) -> Result<i64, sqlx::Error> {
    let now = now_millis();
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO reviews (id, product_id, user_id, rating, comment, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $6)
         RETURNING id",
    )
    .bind(snowflake_id())
    .bind(data.product_id)
    .bind(user_id)
    .bind(data.rating)
    .bind(data.comment.as_deref())
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn update(
    conn: &mut PgConnection,
    id: i64,
    data: &ReviewUpdate,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE reviews SET rating = COALESCE($1, rating), comment = COALESCE($2, comment), updated_at = $3
         WHERE id = $4",
    )
    .bind(data.rating)
    .bind(data.comment.as_deref())
    .bind(now_millis())
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn delete(conn: &mut PgConnection, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Recompute `rating_avg` and `review_count` on the product row
pub async fn refresh_product_rating(
    conn: &mut PgConnection,
    product_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE products SET
            rating_avg = COALESCE((SELECT ROUND(AVG(rating)::NUMERIC, 2)::DOUBLE PRECISION FROM reviews WHERE product_id = $1), 0),
            review_count = (SELECT COUNT(*)::INTEGER FROM reviews WHERE product_id = $1)
         WHERE id = $1",
    )
    .bind(product_id)
    .execute(conn)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_distribution() {
        let summary = summarize(&[(5, 3), (4, 1), (1, 1)]);
        assert_eq!(summary.count, 5);
        assert_eq!(summary.distribution, [1, 0, 0, 1, 3]);
        assert!((summary.average - 3.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average, 0.0);
    }
}
