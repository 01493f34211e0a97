//! Order API handlers
//!
//! Workflow rules live in [`crate::orders`]; handlers add the persisted
//! notifications that accompany each transition.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use shared::error::ApiResponse;
use shared::models::{
    CreateOrderRequest, NewNotification, NotificationKind, Order, OrderDetail, OrderListQuery,
    OrderStatusHistory, PaymentStatus, UpdateOrderStatusRequest,
    UpdatePaymentStatusRequest,
};
use shared::response::{PageQuery, PaginatedResponse};

use crate::api::{ApiResult, ok, paginated};
use crate::auth::{AdminUser, CurrentUser};
use crate::error::{ServiceError, validate};
use crate::notifications::notify;
use crate::orders::{Actor, DeliveryConfirmation, OrderFilter};
use crate::state::AppState;

fn order_link(order_id: i64) -> String {
    format!("/orders/{order_id}")
}

fn page_of(query: &OrderListQuery) -> PageQuery {
    PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
}

async fn notify_owner(state: &AppState, order: &Order, title: &str, message: String) {
    let data = NewNotification::to_user(order.user_id, NotificationKind::Order, title, message)
        .with_link(order_link(order.id));
    notify(&state.pool, &state.realtime, data).await;
}

/// POST /api/orders
///
/// 201 for a new order, 200 when an idempotency key replays an earlier one.
pub async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, ApiResponse<OrderDetail>), ServiceError> {
    let placed = state.orders.place_order(current.id, payload).await?;

    if !placed.created {
        return Ok((StatusCode::OK, ApiResponse::success(placed.detail)));
    }

    let order = &placed.detail.order;
    let data = NewNotification::to_admins(
        NotificationKind::Order,
        "New order",
        format!("Order #{} placed by {}, total {}", order.id, current.email, order.total),
    )
    .with_link(order_link(order.id));
    notify(&state.pool, &state.realtime, data).await;

    Ok((StatusCode::CREATED, ApiResponse::success(placed.detail)))
}

/// GET /api/orders/my
pub async fn list_mine(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<OrderListQuery>,
) -> ApiResult<PaginatedResponse<Order>> {
    let mut filter = OrderFilter::from_query(&query);
    filter.user_id = Some(current.id);
    let (orders, total) = state.orders.list(&filter).await?;
    paginated(orders, &page_of(&query), total)
}

/// GET /api/orders (admin)
pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<OrderListQuery>,
) -> ApiResult<PaginatedResponse<Order>> {
    let filter = OrderFilter::from_query(&query);
    let (orders, total) = state.orders.list(&filter).await?;
    paginated(orders, &page_of(&query), total)
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<OrderDetail> {
    ok(state.orders.get_order(Actor::from(&current), id).await?)
}

/// GET /api/orders/{id}/history
pub async fn history(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Vec<OrderStatusHistory>> {
    ok(state.orders.history(Actor::from(&current), id).await?)
}

/// PUT /api/orders/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Order> {
    let order = state.orders.cancel(Actor::from(&current), id).await?;

    let data = NewNotification::to_admins(
        NotificationKind::Order,
        "Order cancelled",
        format!("Order #{id} was cancelled by the customer"),
    )
    .with_link(order_link(id));
    notify(&state.pool, &state.realtime, data).await;

    ok(order)
}

/// PUT /api/orders/{id}/status (admin)
pub async fn update_status(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> ApiResult<Order> {
    validate(&payload)?;
    let order = state
        .orders
        .update_status(Actor::from(&admin.0), id, payload.status, payload.note)
        .await?;

    notify_owner(
        &state,
        &order,
        "Order status updated",
        format!("Order #{id} is now {}", order.status),
    )
    .await;
    ok(order)
}

/// PUT /api/orders/{id}/confirm-delivery
pub async fn confirm_delivery(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Order> {
    let DeliveryConfirmation { order, completed } = state
        .orders
        .confirm_delivery(Actor::from(&current), id)
        .await?;

    if !completed {
        return ok(order);
    }
    if !current.is_admin() {
        let data = NewNotification::to_admins(
            NotificationKind::Order,
            "Delivery confirmed",
            format!("Order #{id} delivery confirmed by both parties"),
        )
        .with_link(order_link(id));
        notify(&state.pool, &state.realtime, data).await;
    } else {
        notify_owner(
            &state,
            &order,
            "Order delivered",
            format!("Order #{id} has been delivered"),
        )
        .await;
    }
    ok(order)
}

/// PUT /api/orders/{id}/payment (admin)
pub async fn update_payment(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePaymentStatusRequest>,
) -> ApiResult<Order> {
    let order = state
        .orders
        .set_payment_status(Actor::from(&admin.0), id, payload.payment_status)
        .await?;

    if order.payment_status == PaymentStatus::Paid {
        notify_owner(
            &state,
            &order,
            "Payment received",
            format!("Payment for order #{id} has been confirmed"),
        )
        .await;
    }
    ok(order)
}
