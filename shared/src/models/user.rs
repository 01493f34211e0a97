//! User and Address Models

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Account role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum UserRole {
    Customer,
    Admin,
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Customer => "CUSTOMER",
            UserRole::Admin => "ADMIN",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CUSTOMER" => Ok(UserRole::Customer),
            "ADMIN" => Ok(UserRole::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, max = 128))]
    pub current_password: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

/// Token + profile returned by register/login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 200))]
    pub full_name: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 2048))]
    pub avatar: Option<String>,
}

/// Admin-side account update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminUserUpdate {
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Matches email or full name
    pub search: Option<String>,
    pub role: Option<UserRole>,
}

/// Address book entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Address {
    pub id: i64,
    pub user_id: i64,
    pub recipient_name: String,
    pub phone: String,
    pub address_line: String,
    pub ward: Option<String>,
    pub district: Option<String>,
    pub city: String,
    pub is_default: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create address payload (also used inline at checkout)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddressCreate {
    #[validate(length(min = 1, max = 200))]
    pub recipient_name: String,
    #[validate(length(min = 1, max = 32))]
    pub phone: String,
    #[validate(length(min = 1, max = 500))]
    pub address_line: String,
    #[validate(length(max = 100))]
    pub ward: Option<String>,
    #[validate(length(max = 100))]
    pub district: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AddressUpdate {
    #[validate(length(min = 1, max = 200))]
    pub recipient_name: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub address_line: Option<String>,
    #[validate(length(max = 100))]
    pub ward: Option<String>,
    #[validate(length(max = 100))]
    pub district: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,
    pub is_default: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User {
            id: 1,
            email: "a@b.c".into(),
            password_hash: "secret".into(),
            full_name: "A".into(),
            phone: None,
            avatar: None,
            role: UserRole::Customer,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "CUSTOMER");
    }

    #[test]
    fn test_register_validation() {
        let req = RegisterRequest {
            email: "not-an-email".into(),
            password: "short".into(),
            full_name: "".into(),
            phone: None,
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("full_name"));
    }
}
