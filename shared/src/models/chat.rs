//! Support Chat Models

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::user::UserRole;

/// One message in a customer's support conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ChatMessage {
    pub id: i64,
    /// Conversation key: the customer the thread belongs to
    pub customer_id: i64,
    pub sender_id: i64,
    pub sender_role: UserRole,
    pub content: String,
    pub is_read: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 4000))]
    pub content: String,
}

/// Admin inbox row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Conversation {
    pub customer_id: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub last_message: String,
    pub last_message_at: i64,
    pub unread_count: i64,
}
