//! Admin Dashboard Models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::order::OrderStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Sum of totals over paid orders
    pub total_revenue: Decimal,
    pub total_orders: i64,
    pub total_customers: i64,
    pub total_products: i64,
    pub pending_orders: i64,
    pub low_stock_products: i64,
    pub today_revenue: Decimal,
    pub today_orders: i64,
}

/// One day of the sales chart
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SalesPoint {
    /// `YYYY-MM-DD` (UTC)
    pub date: String,
    pub revenue: Decimal,
    pub orders: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TopProduct {
    pub product_id: Option<i64>,
    pub product_name: String,
    pub quantity_sold: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

/// Row of the recent orders widget
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RecentOrder {
    pub id: i64,
    pub user_id: i64,
    pub customer_name: String,
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_status: super::order::PaymentStatus,
    pub created_at: i64,
}
