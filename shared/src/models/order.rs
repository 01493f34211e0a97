//! Order Models
//!
//! Order aggregate: header row, item snapshots and the append-only status
//! history. Money fields are `Decimal` stored as NUMERIC(14,2).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::user::{Address, AddressCreate};

/// Fulfilment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Refunded => "REFUNDED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum PaymentMethod {
    /// Cash on delivery
    Cod,
    BankTransfer,
    CreditCard,
    EWallet,
}

/// Order header
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub address_id: Option<i64>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping_cost: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub idempotency_key: Option<String>,
    pub coupon_code: Option<String>,
    pub note: Option<String>,
    pub client_confirmed_delivery: bool,
    pub admin_confirmed_delivery: bool,
    /// Set once stock has been returned for a cancelled order
    pub stock_restored: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub shipped_at: Option<i64>,
    pub delivered_at: Option<i64>,
    pub cancelled_at: Option<i64>,
    pub paid_at: Option<i64>,
}

/// Line snapshot taken at order time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    /// Null once the product has been deleted
    pub product_id: Option<i64>,
    pub product_name: String,
    pub product_image: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderStatusHistory {
    pub id: i64,
    pub order_id: i64,
    pub status: OrderStatus,
    pub note: Option<String>,
    pub changed_by: Option<i64>,
    pub created_at: i64,
}

/// Order with its items, history and shipping address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub history: Vec<OrderStatusHistory>,
    pub shipping_address: Option<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderLineInput {
    pub product_id: i64,
    #[validate(range(min = 1, max = 10000))]
    pub quantity: i32,
}

/// `POST /api/orders`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 100), nested)]
    pub items: Vec<OrderLineInput>,
    pub address_id: Option<i64>,
    #[validate(nested)]
    pub shipping_address: Option<AddressCreate>,
    pub payment_method: PaymentMethod,
    #[validate(length(min = 1, max = 128))]
    pub idempotency_key: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub coupon_code: Option<String>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: PaymentStatus,
}

/// Filters for order listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub user_id: Option<i64>,
    /// Inclusive lower bound on `created_at` (epoch millis)
    pub from: Option<i64>,
    /// Exclusive upper bound on `created_at` (epoch millis)
    pub to: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::BankTransfer).unwrap(),
            "\"BANK_TRANSFER\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::EWallet).unwrap(),
            "\"E_WALLET\""
        );
        let status: OrderStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(status, OrderStatus::Cancelled);
        assert_eq!(status.to_string(), "CANCELLED");
    }

    #[test]
    fn test_create_order_requires_items() {
        let req: CreateOrderRequest = serde_json::from_value(serde_json::json!({
            "items": [],
            "payment_method": "COD"
        }))
        .unwrap();
        assert!(req.validate().is_err());

        let req: CreateOrderRequest = serde_json::from_value(serde_json::json!({
            "items": [{"product_id": 1, "quantity": 0}],
            "payment_method": "COD"
        }))
        .unwrap();
        assert!(req.validate().is_err());

        let req: CreateOrderRequest = serde_json::from_value(serde_json::json!({
            "items": [{"product_id": 1, "quantity": 2}],
            "payment_method": "CREDIT_CARD"
        }))
        .unwrap();
        assert!(req.validate().is_ok());
    }
}
