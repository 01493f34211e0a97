use shared::models::{ContactCreate, ContactListQuery, ContactMessage, ContactStatus};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

pub async fn create(pool: &PgPool, data: &ContactCreate) -> Result<ContactMessage, sqlx::Error> {
    let now = now_millis();
    sqlx::query_as(
        "INSERT INTO contact_messages (id, name, email, phone, subject, message, status, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, 'NEW', $7, $7)
         RETURNING *",
    )
    .bind(snowflake_id())
    .bind(&data.name)
    .bind(&data.email)
    .bind(data.phone.as_deref())
    .bind(&data.subject)
    .bind(&data.message)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn list(
    pool: &PgPool,
    query: &ContactListQuery,
    limit: i64,
    offset: i64,
) -> Result<(Vec<ContactMessage>, i64), sqlx::Error> {
    let items = sqlx::query_as(
        "SELECT * FROM contact_messages
         WHERE ($1::contact_status IS NULL OR status = $1)
         ORDER BY created_at DESC
         LIMIT $2 OFFSET $3",
    )
    .bind(query.status)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM contact_messages WHERE ($1::contact_status IS NULL OR status = $1)",
    )
    .bind(query.status)
    .fetch_one(pool)
    .await?;
    Ok((items, total))
}

pub async fn set_status(
    pool: &PgPool,
    id: i64,
    status: ContactStatus,
) -> Result<Option<ContactMessage>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE contact_messages SET status = $1, updated_at = $2 WHERE id = $3 RETURNING *",
    )
    .bind(status)
    .bind(now_millis())
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM contact_messages WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
