//! Site Setting Model

use serde::{Deserialize, Serialize};

/// Key/value setting; value is arbitrary JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Setting {
    pub key: String,
    pub value: serde_json::Value,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettingUpsert {
    pub value: serde_json::Value,
}
