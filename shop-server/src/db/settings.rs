use shared::models::Setting;
use shared::util::now_millis;
use sqlx::PgPool;

pub async fn list(pool: &PgPool) -> Result<Vec<Setting>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM settings ORDER BY key")
        .fetch_all(pool)
        .await
}

pub async fn find(pool: &PgPool, key: &str) -> Result<Option<Setting>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM settings WHERE key = $1")
        .bind(key)
        .fetch_optional(pool)
        .await
}

pub async fn upsert(
    pool: &PgPool,
    key: &str,
    value: &serde_json::Value,
) -> Result<Setting, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO settings (key, value, updated_at) VALUES ($1, $2, $3)
         ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
         RETURNING *",
    )
    .bind(key)
    .bind(value)
    .bind(now_millis())
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, key: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM settings WHERE key = $1")
        .bind(key)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
