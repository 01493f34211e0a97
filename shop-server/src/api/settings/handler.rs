//! Settings handlers

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{Setting, SettingUpsert};

use crate::api::{ApiResult, ok, ok_message};
use crate::audit_log;
use crate::auth::AdminUser;
use crate::db;
use crate::state::AppState;

const CACHE_KEY: &str = "settings:all";
const MAX_KEY_LEN: usize = 100;

/// Keys are short identifiers: `[A-Za-z0-9_.-]`
fn check_key(key: &str) -> Result<(), AppError> {
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if valid {
        Ok(())
    } else {
        Err(AppError::with_message(
            ErrorCode::InvalidFormat,
            "Setting key must be 1-100 characters of letters, digits, '_', '.' or '-'",
        ))
    }
}

/// GET /api/settings: `{key: value}` map
pub async fn list(
    State(state): State<AppState>,
) -> ApiResult<BTreeMap<String, serde_json::Value>> {
    let pool = state.pool.clone();
    let map = state
        .cache
        .get_or_load(CACHE_KEY, None, || async move {
            let settings = db::settings::list(&pool).await?;
            Ok::<_, sqlx::Error>(
                settings
                    .into_iter()
                    .map(|s| (s.key, s.value))
                    .collect::<BTreeMap<_, _>>(),
            )
        })
        .await?;
    ok(map)
}

/// GET /api/settings/{key}
pub async fn get_by_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Setting> {
    let setting = db::settings::find(&state.pool, &key)
        .await?
        .ok_or(ErrorCode::SettingNotFound)?;
    ok(setting)
}

/// PUT /api/settings/{key} (admin)
pub async fn upsert(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(key): Path<String>,
    Json(payload): Json<SettingUpsert>,
) -> ApiResult<Setting> {
    check_key(&key)?;
    let setting = db::settings::upsert(&state.pool, &key, &payload.value).await?;
    state.cache.invalidate(CACHE_KEY);

    audit_log!(admin.id, "upsert_setting", format!("setting:{key}"));
    ok(setting)
}

/// DELETE /api/settings/{key} (admin)
pub async fn delete(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(key): Path<String>,
) -> ApiResult<()> {
    if !db::settings::delete(&state.pool, &key).await? {
        return Err(ErrorCode::SettingNotFound.into());
    }
    state.cache.invalidate(CACHE_KEY);

    audit_log!(admin.id, "delete_setting", format!("setting:{key}"));
    ok_message("Setting deleted")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_keys() {
        assert!(check_key("store.name").is_ok());
        assert!(check_key("free_shipping-banner").is_ok());
        assert!(check_key("").is_err());
        assert!(check_key("has space").is_err());
        assert!(check_key(&"k".repeat(101)).is_err());
    }
}
