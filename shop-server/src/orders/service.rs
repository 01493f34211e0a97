//! Order service: request shaping, access checks and realtime fan-out around
//! an `OrderStore`.

use shared::error::{AppError, ErrorCode};
use shared::models::{
    CreateOrderRequest, Order, OrderDetail, OrderStatus, OrderStatusHistory, PaymentStatus,
};
use std::sync::Arc;

use super::pricing::PricingConfig;
use super::store::{
    DeliveryConfirmation, OrderFilter, OrderStore, PlaceOrder, PlacedOrder, ShippingAddress,
};
use super::workflow::{Actor, merge_lines};
use crate::audit_log;
use crate::auth::CurrentUser;
use crate::error::{ServiceResult, validate};
use crate::realtime::{RealtimeHub, events};

impl From<&CurrentUser> for Actor {
    fn from(user: &CurrentUser) -> Self {
        Actor {
            user_id: user.id,
            is_admin: user.is_admin(),
        }
    }
}

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    pricing: PricingConfig,
    realtime: RealtimeHub,
}

impl std::fmt::Debug for OrderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderService")
            .field("pricing", &self.pricing)
            .finish_non_exhaustive()
    }
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>, pricing: PricingConfig, realtime: RealtimeHub) -> Self {
        Self {
            store,
            pricing,
            realtime,
        }
    }

    pub fn pricing(&self) -> &PricingConfig {
        &self.pricing
    }

    async fn publish(&self, order: &Order) {
        self.realtime
            .to_user(order.user_id, events::ORDER_UPDATED, order)
            .await;
        self.realtime
            .to_order(order.id, events::ORDER_UPDATED, order)
            .await;
    }

    /// Checkout. Replays the earlier order when the idempotency key was seen.
    pub async fn place_order(
        &self,
        user_id: i64,
        request: CreateOrderRequest,
    ) -> ServiceResult<PlacedOrder> {
        validate(&request)?;
        let lines = merge_lines(&request.items)?;
        let address = match (request.address_id, request.shipping_address) {
            (Some(id), _) => ShippingAddress::Saved(id),
            (None, Some(inline)) => ShippingAddress::New(inline),
            (None, None) => {
                return Err(AppError::with_message(
                    ErrorCode::RequiredField,
                    "address_id or shipping_address is required",
                )
                .into());
            }
        };
        let idempotency_key = request
            .idempotency_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let placed = self
            .store
            .place_order(
                user_id,
                PlaceOrder {
                    lines,
                    address,
                    payment_method: request.payment_method,
                    idempotency_key,
                    coupon_code: request.coupon_code,
                    note: request.note,
                },
                &self.pricing,
            )
            .await?;

        if placed.created {
            let order = &placed.detail.order;
            audit_log!(user_id, "place_order", format!("order:{}", order.id), order.total);
            self.publish(order).await;
        } else {
            tracing::info!(order_id = placed.detail.order.id, "Idempotent order replayed");
        }
        Ok(placed)
    }

    /// Order detail visible to its owner and to admins
    pub async fn get_order(&self, actor: Actor, order_id: i64) -> ServiceResult<OrderDetail> {
        let detail = self
            .store
            .find_order(order_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
        if !actor.can_view(&detail.order) {
            return Err(AppError::new(ErrorCode::PermissionDenied).into());
        }
        Ok(detail)
    }

    pub async fn owner_of(&self, order_id: i64) -> ServiceResult<Option<i64>> {
        self.store.owner_of(order_id).await
    }

    pub async fn cancel(&self, actor: Actor, order_id: i64) -> ServiceResult<Order> {
        let order = self.store.cancel_order(order_id, actor).await?;
        audit_log!(actor.user_id, "cancel_order", format!("order:{order_id}"));
        self.publish(&order).await;
        Ok(order)
    }

    pub async fn update_status(
        &self,
        actor: Actor,
        order_id: i64,
        status: OrderStatus,
        note: Option<String>,
    ) -> ServiceResult<Order> {
        if !actor.is_admin {
            return Err(AppError::new(ErrorCode::AdminRequired).into());
        }
        let order = self
            .store
            .update_status(order_id, actor, status, note)
            .await?;
        audit_log!(actor.user_id, "update_order_status", format!("order:{order_id}"), status);
        self.publish(&order).await;
        Ok(order)
    }

    pub async fn confirm_delivery(
        &self,
        actor: Actor,
        order_id: i64,
    ) -> ServiceResult<DeliveryConfirmation> {
        let confirmation = self.store.confirm_delivery(order_id, actor).await?;
        audit_log!(
            actor.user_id,
            "confirm_delivery",
            format!("order:{order_id}"),
            confirmation.order.status
        );
        self.publish(&confirmation.order).await;
        Ok(confirmation)
    }

    pub async fn set_payment_status(
        &self,
        actor: Actor,
        order_id: i64,
        status: PaymentStatus,
    ) -> ServiceResult<Order> {
        if !actor.is_admin {
            return Err(AppError::new(ErrorCode::AdminRequired).into());
        }
        let order = self.store.set_payment_status(order_id, status).await?;
        audit_log!(
            actor.user_id,
            "update_payment_status",
            format!("order:{order_id}"),
            format!("{status:?}")
        );
        self.publish(&order).await;
        Ok(order)
    }

    pub async fn list(&self, filter: &OrderFilter) -> ServiceResult<(Vec<Order>, i64)> {
        self.store.list_orders(filter).await
    }

    pub async fn history(
        &self,
        actor: Actor,
        order_id: i64,
    ) -> ServiceResult<Vec<OrderStatusHistory>> {
        let owner = self
            .store
            .owner_of(order_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
        if !actor.is_admin && owner != actor.user_id {
            return Err(AppError::new(ErrorCode::PermissionDenied).into());
        }
        self.store.history(order_id).await
    }
}
