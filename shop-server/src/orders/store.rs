//! Order persistence boundary

use async_trait::async_trait;
use shared::models::{
    AddressCreate, Order, OrderDetail, OrderListQuery, OrderStatus, OrderStatusHistory,
    PaymentMethod, PaymentStatus,
};
use shared::response::PageQuery;

use super::pricing::PricingConfig;
use super::workflow::Actor;
use crate::error::ServiceResult;

/// Where the order ships to
#[derive(Debug, Clone)]
pub enum ShippingAddress {
    /// One of the caller's saved addresses
    Saved(i64),
    /// Inline address, saved to the caller's address book
    New(AddressCreate),
}

/// Validated checkout request
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    /// Merged `(product_id, quantity)`, ascending product id
    pub lines: Vec<(i64, i32)>,
    pub address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub idempotency_key: Option<String>,
    pub coupon_code: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub detail: OrderDetail,
    /// False when an earlier order with the same idempotency key was returned
    pub created: bool,
}

#[derive(Debug, Clone)]
pub struct DeliveryConfirmation {
    pub order: Order,
    /// True only for the call that completed the pair and moved the order to `DELIVERED`
    pub completed: bool,
}

/// Listing filter; `user_id` is forced for customer listings
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub user_id: Option<i64>,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub limit: i64,
    pub offset: i64,
}

impl OrderFilter {
    pub fn from_query(query: &OrderListQuery) -> Self {
        let page = PageQuery {
            page: query.page,
            per_page: query.per_page,
        };
        Self {
            user_id: query.user_id,
            status: query.status,
            payment_status: query.payment_status,
            from: query.from,
            to: query.to,
            limit: page.limit(),
            offset: page.offset(),
        }
    }

    pub fn matches(&self, order: &Order) -> bool {
        self.user_id.is_none_or(|id| order.user_id == id)
            && self.status.is_none_or(|s| order.status == s)
            && self.payment_status.is_none_or(|s| order.payment_status == s)
            && self.from.is_none_or(|from| order.created_at >= from)
            && self.to.is_none_or(|to| order.created_at < to)
    }
}

/// Transactional order operations
///
/// Every method is atomic: implementations hold the order (and product,
/// coupon) rows locked for the whole read-modify-write.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn place_order(
        &self,
        user_id: i64,
        request: PlaceOrder,
        pricing: &PricingConfig,
    ) -> ServiceResult<PlacedOrder>;

    async fn find_order(&self, order_id: i64) -> ServiceResult<Option<OrderDetail>>;

    async fn owner_of(&self, order_id: i64) -> ServiceResult<Option<i64>>;

    async fn cancel_order(&self, order_id: i64, actor: Actor) -> ServiceResult<Order>;

    async fn update_status(
        &self,
        order_id: i64,
        actor: Actor,
        status: OrderStatus,
        note: Option<String>,
    ) -> ServiceResult<Order>;

    async fn confirm_delivery(
        &self,
        order_id: i64,
        actor: Actor,
    ) -> ServiceResult<DeliveryConfirmation>;

    async fn set_payment_status(
        &self,
        order_id: i64,
        status: PaymentStatus,
    ) -> ServiceResult<Order>;

    async fn list_orders(&self, filter: &OrderFilter) -> ServiceResult<(Vec<Order>, i64)>;

    async fn history(&self, order_id: i64) -> ServiceResult<Vec<OrderStatusHistory>>;
}
