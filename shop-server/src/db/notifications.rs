use shared::models::{NewNotification, Notification};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

/// Visibility predicate for user `$1` with admin flag `$2`
const VISIBLE: &str = "
    n.is_sent AND (
        (n.audience = 'USER' AND n.user_id = $1)
        OR n.audience = 'ALL'
        OR (n.audience = 'ADMINS' AND $2)
    )";

/// Persist a notification; `is_sent` is false while `scheduled_at` is in the future
pub async fn insert(pool: &PgPool, data: &NewNotification) -> Result<Notification, sqlx::Error> {
    let now = now_millis();
    let is_sent = data.scheduled_at.is_none_or(|at| at <= now);
    sqlx::query_as(
        "INSERT INTO notifications (id, title, message, kind, audience, user_id, link, scheduled_at, is_sent, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING *",
    )
    .bind(snowflake_id())
    .bind(&data.title)
    .bind(&data.message)
    .bind(data.kind)
    .bind(data.audience)
    .bind(data.user_id)
    .bind(data.link.as_deref())
    .bind(data.scheduled_at)
    .bind(is_sent)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn list_visible(
    pool: &PgPool,
    user_id: i64,
    is_admin: bool,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Notification>, i64, i64), sqlx::Error> {
    let sql = format!(
        "SELECT n.*, (r.user_id IS NOT NULL) AS is_read
         FROM notifications n
         LEFT JOIN notification_reads r ON r.notification_id = n.id AND r.user_id = $1
         WHERE {VISIBLE}
         ORDER BY COALESCE(n.scheduled_at, n.created_at) DESC, n.id DESC
         LIMIT $3 OFFSET $4"
    );
    let items = sqlx::query_as(&sql)
        .bind(user_id)
        .bind(is_admin)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let count_sql = format!(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE r.user_id IS NULL)
         FROM notifications n
         LEFT JOIN notification_reads r ON r.notification_id = n.id AND r.user_id = $1
         WHERE {VISIBLE}"
    );
    let (total, unread): (i64, i64) = sqlx::query_as(&count_sql)
        .bind(user_id)
        .bind(is_admin)
        .fetch_one(pool)
        .await?;

    Ok((items, total, unread))
}

/// Returns false when the notification is not visible to the user
pub async fn mark_read(
    pool: &PgPool,
    notification_id: i64,
    user_id: i64,
    is_admin: bool,
) -> Result<bool, sqlx::Error> {
    let sql = format!(
        "INSERT INTO notification_reads (notification_id, user_id, read_at)
         SELECT n.id, $1, $3 FROM notifications n
         WHERE n.id = $4 AND {VISIBLE}
         ON CONFLICT DO NOTHING"
    );
    sqlx::query(&sql)
        .bind(user_id)
        .bind(is_admin)
        .bind(now_millis())
        .bind(notification_id)
        .execute(pool)
        .await?;

    let visible_sql = format!("SELECT EXISTS(SELECT 1 FROM notifications n WHERE n.id = $3 AND {VISIBLE})");
    let (visible,): (bool,) = sqlx::query_as(&visible_sql)
        .bind(user_id)
        .bind(is_admin)
        .bind(notification_id)
        .fetch_one(pool)
        .await?;
    Ok(visible)
}

pub async fn mark_all_read(pool: &PgPool, user_id: i64, is_admin: bool) -> Result<u64, sqlx::Error> {
    let sql = format!(
        "INSERT INTO notification_reads (notification_id, user_id, read_at)
         SELECT n.id, $1, $3 FROM notifications n
         WHERE {VISIBLE}
         ON CONFLICT DO NOTHING"
    );
    let result = sqlx::query(&sql)
        .bind(user_id)
        .bind(is_admin)
        .bind(now_millis())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Claim due scheduled notifications and mark them sent in one statement.
///
/// `SKIP LOCKED` lets concurrent sweeps run without delivering a row twice.
pub async fn claim_due(pool: &PgPool, now: i64, batch: i64) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE notifications SET is_sent = TRUE
         WHERE id IN (
            SELECT id FROM notifications
            WHERE NOT is_sent AND scheduled_at IS NOT NULL AND scheduled_at <= $1
            ORDER BY scheduled_at ASC
            LIMIT $2
            FOR UPDATE SKIP LOCKED
         )
         RETURNING *",
    )
    .bind(now)
    .bind(batch)
    .fetch_all(pool)
    .await
}
