//! Database access layer
//!
//! Free functions over `&PgPool` (or a transaction connection where the
//! caller needs one). Business rules live in the API handlers and in
//! `crate::orders`.

pub mod addresses;
pub mod cart;
pub mod categories;
pub mod chat;
pub mod contact;
pub mod coupons;
pub mod dashboard;
pub mod notifications;
pub mod products;
pub mod reviews;
pub mod settings;
pub mod users;

/// `%term%` for ILIKE, with LIKE metacharacters escaped
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("tea"), "%tea%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
