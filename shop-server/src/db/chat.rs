use shared::models::{ChatMessage, Conversation, UserRole};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

pub async fn insert(
    pool: &PgPool,
    customer_id: i64,
    sender_id: i64,
    sender_role: UserRole,
    content: &str,
) -> Result<ChatMessage, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO chat_messages (id, customer_id, sender_id, sender_role, content, is_read, created_at)
         VALUES ($1, $2, $3, $4, $5, FALSE, $6)
         RETURNING *",
    )
    .bind(snowflake_id())
    .bind(customer_id)
    .bind(sender_id)
    .bind(sender_role)
    .bind(content)
    .bind(now_millis())
    .fetch_one(pool)
    .await
}

/// Messages of one conversation, oldest first
pub async fn messages(
    pool: &PgPool,
    customer_id: i64,
    limit: i64,
    offset: i64,
) -> Result<(Vec<ChatMessage>, i64), sqlx::Error> {
    let items = sqlx::query_as(
        "SELECT * FROM chat_messages WHERE customer_id = $1
         ORDER BY created_at ASC, id ASC
         LIMIT $2 OFFSET $3",
    )
    .bind(customer_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    let (total,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM chat_messages WHERE customer_id = $1")
            .bind(customer_id)
            .fetch_one(pool)
            .await?;
    Ok((items, total))
}

/// Admin inbox: last message and customer-side unread count per conversation
pub async fn conversations(pool: &PgPool) -> Result<Vec<Conversation>, sqlx::Error> {
    sqlx::query_as(
        "SELECT DISTINCT ON (m.customer_id)
                m.customer_id,
                u.full_name AS customer_name,
                u.email AS customer_email,
                m.content AS last_message,
                m.created_at AS last_message_at,
                (SELECT COUNT(*) FROM chat_messages x
                  WHERE x.customer_id = m.customer_id
                    AND x.sender_role = 'CUSTOMER' AND NOT x.is_read) AS unread_count
         FROM chat_messages m
         JOIN users u ON u.id = m.customer_id
         ORDER BY m.customer_id, m.created_at DESC, m.id DESC",
    )
    .fetch_all(pool)
    .await
    .map(|mut rows: Vec<Conversation>| {
        rows.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        rows
    })
}

/// Mark messages sent by the other side as read; returns the number updated
pub async fn mark_read(
    pool: &PgPool,
    customer_id: i64,
    reader_role: UserRole,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE chat_messages SET is_read = TRUE
         WHERE customer_id = $1 AND sender_role <> $2 AND NOT is_read",
    )
    .bind(customer_id)
    .bind(reader_role)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
