//! Data models
//!
//! Shared between the server and API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`;
//! status enums map to PostgreSQL enum types under the same feature.
//! All IDs are `i64` (snowflake), all timestamps are epoch milliseconds.

pub mod cart;
pub mod category;
pub mod chat;
pub mod contact;
pub mod coupon;
pub mod dashboard;
pub mod notification;
pub mod order;
pub mod product;
pub mod review;
pub mod setting;
pub mod user;

// Re-exports
pub use cart::*;
pub use category::*;
pub use chat::*;
pub use contact::*;
pub use coupon::*;
pub use dashboard::*;
pub use notification::*;
pub use order::*;
pub use product::*;
pub use review::*;
pub use setting::*;
pub use user::*;
