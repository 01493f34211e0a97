use shared::models::{Address, AddressCreate, AddressUpdate};
use shared::util::{now_millis, snowflake_id};
use sqlx::{PgConnection, PgPool};

pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Address>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM addresses WHERE user_id = $1 ORDER BY is_default DESC, created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Address owned by `user_id`
pub async fn find_owned(
    conn: &mut PgConnection,
    user_id: i64,
    id: i64,
) -> Result<Option<Address>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM addresses WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(conn)
        .await
}

async fn clear_default(conn: &mut PgConnection, user_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE addresses SET is_default = FALSE WHERE user_id = $1 AND is_default")
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Insert an address; the first address of a user becomes the default.
pub async fn create(
    conn: &mut PgConnection,
    user_id: i64,
    data: &AddressCreate,
) -> Result<Address, sqlx::Error> {
    // Serializes concurrent inserts for one user so only one becomes the default
    sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM addresses WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;
    let is_default = data.is_default || existing == 0;
    if is_default {
        clear_default(&mut *conn, user_id).await?;
    }

    let now = now_millis();
    sqlx::query_as(
        "INSERT INTO addresses (id, user_id, recipient_name, phone, address_line, ward, district, city, is_default, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
         RETURNING *",
    )
    .bind(snowflake_id())
    .bind(user_id)
    .bind(&data.recipient_name)
    .bind(&data.phone)
    .bind(&data.address_line)
    .bind(data.ward.as_deref())
    .bind(data.district.as_deref())
    .bind(&data.city)
    .bind(is_default)
    .bind(now)
    .fetch_one(conn)
    .await
}

pub async fn update(
    conn: &mut PgConnection,
    user_id: i64,
    id: i64,
    data: &AddressUpdate,
) -> Result<Option<Address>, sqlx::Error> {
    if data.is_default == Some(true) {
        clear_default(&mut *conn, user_id).await?;
    }
    sqlx::query_as(
        "UPDATE addresses SET
            recipient_name = COALESCE($1, recipient_name),
            phone = COALESCE($2, phone),
            address_line = COALESCE($3, address_line),
            ward = COALESCE($4, ward),
            district = COALESCE($5, district),
            city = COALESCE($6, city),
            is_default = COALESCE($7, is_default),
            updated_at = $8
         WHERE id = $9 AND user_id = $10
         RETURNING *",
    )
    .bind(data.recipient_name.as_deref())
    .bind(data.phone.as_deref())
    .bind(data.address_line.as_deref())
    .bind(data.ward.as_deref())
    .bind(data.district.as_deref())
    .bind(data.city.as_deref())
    .bind(data.is_default)
    .bind(now_millis())
    .bind(id)
    .bind(user_id)
    .fetch_optional(conn)
    .await
}

pub async fn delete(pool: &PgPool, user_id: i64, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
