use shared::models::{AdminUserUpdate, ProfileUpdate, User, UserListQuery, UserRole};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use super::like_pattern;

pub async fn create(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    full_name: &str,
    phone: Option<&str>,
    role: UserRole,
) -> Result<User, sqlx::Error> {
    let now = now_millis();
    sqlx::query_as(
        "INSERT INTO users (id, email, password_hash, full_name, phone, role, is_active, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $7)
         RETURNING *",
    )
    .bind(snowflake_id())
    .bind(email.to_lowercase())
    .bind(password_hash)
    .bind(full_name)
    .bind(phone)
    .bind(role)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update_password(
    pool: &PgPool,
    id: i64,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3")
        .bind(password_hash)
        .bind(now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_profile(
    pool: &PgPool,
    id: i64,
    data: &ProfileUpdate,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE users SET
            full_name = COALESCE($1, full_name),
            phone = COALESCE($2, phone),
            avatar = COALESCE($3, avatar),
            updated_at = $4
         WHERE id = $5
         RETURNING *",
    )
    .bind(data.full_name.as_deref())
    .bind(data.phone.as_deref())
    .bind(data.avatar.as_deref())
    .bind(now_millis())
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn admin_update(
    pool: &PgPool,
    id: i64,
    data: &AdminUserUpdate,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE users SET
            role = COALESCE($1, role),
            is_active = COALESCE($2, is_active),
            updated_at = $3
         WHERE id = $4
         RETURNING *",
    )
    .bind(data.role)
    .bind(data.is_active)
    .bind(now_millis())
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Returns `true` if a row was deleted
pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Page of users plus the total matching count
pub async fn list(
    pool: &PgPool,
    query: &UserListQuery,
    limit: i64,
    offset: i64,
) -> Result<(Vec<User>, i64), sqlx::Error> {
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(like_pattern);

    let users: Vec<User> = sqlx::query_as(
        "SELECT * FROM users
         WHERE ($1::TEXT IS NULL OR email ILIKE $1 OR full_name ILIKE $1)
           AND ($2::user_role IS NULL OR role = $2)
         ORDER BY created_at DESC, id DESC
         LIMIT $3 OFFSET $4",
    )
    .bind(search.as_deref())
    .bind(query.role)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM users
         WHERE ($1::TEXT IS NULL OR email ILIKE $1 OR full_name ILIKE $1)
           AND ($2::user_role IS NULL OR role = $2)",
    )
    .bind(search.as_deref())
    .bind(query.role)
    .fetch_one(pool)
    .await?;

    Ok((users, total))
}
