//! Order placement and lifecycle rules
//!
//! Everything here is pure: stores load and lock the rows, call into these
//! functions, then persist what they return.

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Coupon, Order, OrderItem, OrderLineInput, OrderStatus, OrderStatusHistory, PaymentMethod,
    PaymentStatus, Product,
};
use std::collections::BTreeMap;

use super::coupon::apply_coupon;
use super::pricing::PricingConfig;

/// Who is acting on an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub is_admin: bool,
}

impl Actor {
    pub fn customer(user_id: i64) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    pub fn admin(user_id: i64) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }

    pub fn can_view(&self, order: &Order) -> bool {
        self.is_admin || order.user_id == self.user_id
    }
}

/// History row and stock side effect produced by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub status: OrderStatus,
    pub note: Option<String>,
    /// Return every line's quantity to stock
    pub restore_stock: bool,
}

/// Merge duplicate product lines; result is ordered by product id, which is
/// also the row-lock order.
pub fn merge_lines(lines: &[OrderLineInput]) -> Result<Vec<(i64, i32)>, AppError> {
    if lines.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }
    let mut merged: BTreeMap<i64, i32> = BTreeMap::new();
    for line in lines {
        if line.quantity < 1 {
            return Err(AppError::with_message(
                ErrorCode::ValueOutOfRange,
                "Quantity must be at least 1",
            )
            .with_detail("product_id", line.product_id));
        }
        let slot = merged.entry(line.product_id).or_insert(0);
        *slot = slot.checked_add(line.quantity).ok_or_else(|| {
            AppError::new(ErrorCode::ValueOutOfRange).with_detail("product_id", line.product_id)
        })?;
    }
    Ok(merged.into_iter().collect())
}

/// A product can be ordered in `quantity`
pub fn check_line(product: &Product, quantity: i32) -> Result<(), AppError> {
    if !product.is_active {
        return Err(AppError::new(ErrorCode::ProductInactive).with_detail("product_id", product.id));
    }
    if quantity > product.stock_quantity {
        return Err(AppError::new(ErrorCode::ProductOutOfStock)
            .with_detail("product_id", product.id)
            .with_detail("available", product.stock_quantity));
    }
    Ok(())
}

/// Header fields of an order being placed
#[derive(Debug, Clone)]
pub struct OrderSeed {
    pub user_id: i64,
    pub address_id: Option<i64>,
    pub payment_method: PaymentMethod,
    pub idempotency_key: Option<String>,
    pub note: Option<String>,
}

/// Fully computed order ready to persist
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub history: OrderStatusHistory,
    /// `(product_id, quantity)` to take out of stock, ascending product id
    pub stock: Vec<(i64, i32)>,
    /// Coupon whose usage counter must be incremented
    pub coupon_id: Option<i64>,
}

/// Price and validate an order against the locked product and coupon rows
pub fn build_order(
    seed: OrderSeed,
    lines: &[(i64, i32)],
    products: &[Product],
    coupon: Option<&Coupon>,
    pricing: &PricingConfig,
    now: i64,
    next_id: &mut dyn FnMut() -> i64,
) -> Result<OrderDraft, AppError> {
    let order_id = next_id();
    let mut items = Vec::with_capacity(lines.len());
    let mut subtotal = Decimal::ZERO;

    for &(product_id, quantity) in lines {
        let product = products
            .iter()
            .find(|p| p.id == product_id)
            .ok_or_else(|| {
                AppError::new(ErrorCode::ProductNotFound).with_detail("product_id", product_id)
            })?;
        check_line(product, quantity)?;

        let line_total = product.price * Decimal::from(quantity);
        subtotal += line_total;
        items.push(OrderItem {
            id: next_id(),
            order_id,
            product_id: Some(product.id),
            product_name: product.name.clone(),
            product_image: product.image.clone(),
            unit_price: product.price,
            quantity,
            subtotal: line_total,
        });
    }

    let discount = match coupon {
        Some(c) => apply_coupon(c, subtotal, now)?,
        None => Decimal::ZERO,
    };
    let totals = pricing.quote(subtotal, discount);

    let order = Order {
        id: order_id,
        user_id: seed.user_id,
        address_id: seed.address_id,
        subtotal: totals.subtotal,
        tax: totals.tax,
        shipping_cost: totals.shipping_cost,
        discount: totals.discount,
        total: totals.total,
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
        payment_method: seed.payment_method,
        idempotency_key: seed.idempotency_key,
        coupon_code: coupon.map(|c| c.code.clone()),
        note: seed.note,
        client_confirmed_delivery: false,
        admin_confirmed_delivery: false,
        stock_restored: false,
        created_at: now,
        updated_at: now,
        shipped_at: None,
        delivered_at: None,
        cancelled_at: None,
        paid_at: None,
    };

    let history = OrderStatusHistory {
        id: next_id(),
        order_id,
        status: OrderStatus::Pending,
        note: Some("Order placed".to_string()),
        changed_by: Some(seed.user_id),
        created_at: now,
    };

    Ok(OrderDraft {
        order,
        items,
        history,
        stock: lines.to_vec(),
        coupon_id: coupon.map(|c| c.id),
    })
}

/// Cancelled orders give their stock back exactly once
fn take_stock_restore(order: &mut Order) -> bool {
    if order.stock_restored {
        return false;
    }
    order.stock_restored = true;
    true
}

/// Cash on delivery is settled when the order is delivered
fn settle_cod(order: &mut Order, now: i64) {
    if order.payment_method == PaymentMethod::Cod && order.payment_status != PaymentStatus::Paid {
        order.payment_status = PaymentStatus::Paid;
        order.paid_at = Some(now);
    }
}

/// Owner cancellation, allowed while `PENDING` or `CONFIRMED`
pub fn cancel(order: &mut Order, actor: Actor, now: i64) -> Result<Transition, AppError> {
    if order.user_id != actor.user_id {
        return Err(AppError::with_message(
            ErrorCode::PermissionDenied,
            "Only the order owner can cancel it",
        ));
    }
    if !matches!(order.status, OrderStatus::Pending | OrderStatus::Confirmed) {
        return Err(AppError::new(ErrorCode::OrderNotCancellable)
            .with_detail("status", order.status.as_str()));
    }
    order.status = OrderStatus::Cancelled;
    order.cancelled_at = Some(now);
    order.updated_at = now;
    Ok(Transition {
        status: OrderStatus::Cancelled,
        note: Some("Cancelled by customer".to_string()),
        restore_stock: take_stock_restore(order),
    })
}

/// Admin status change; any status may follow any other
pub fn apply_status(
    order: &mut Order,
    status: OrderStatus,
    note: Option<String>,
    now: i64,
) -> Transition {
    order.status = status;
    order.updated_at = now;
    let mut restore_stock = false;
    match status {
        OrderStatus::Shipped => order.shipped_at = Some(now),
        OrderStatus::Delivered => {
            order.delivered_at = Some(now);
            settle_cod(order, now);
        }
        OrderStatus::Cancelled => {
            order.cancelled_at = Some(now);
            restore_stock = take_stock_restore(order);
        }
        _ => {}
    }
    Transition {
        status,
        note,
        restore_stock,
    }
}

/// Record one side's delivery confirmation. Returns the transition when this
/// call completed the pair and moved the order to `DELIVERED`.
pub fn confirm_delivery(
    order: &mut Order,
    actor: Actor,
    now: i64,
) -> Result<Option<Transition>, AppError> {
    let is_owner = order.user_id == actor.user_id;
    if !is_owner && !actor.is_admin {
        return Err(AppError::with_message(
            ErrorCode::PermissionDenied,
            "Not allowed to confirm delivery of this order",
        ));
    }
    if matches!(order.status, OrderStatus::Cancelled | OrderStatus::Refunded) {
        return Err(AppError::new(ErrorCode::OrderNotDeliverable)
            .with_detail("status", order.status.as_str()));
    }

    if is_owner {
        order.client_confirmed_delivery = true;
    }
    if actor.is_admin {
        order.admin_confirmed_delivery = true;
    }
    order.updated_at = now;

    if order.client_confirmed_delivery
        && order.admin_confirmed_delivery
        && order.status != OrderStatus::Delivered
    {
        order.status = OrderStatus::Delivered;
        order.delivered_at = Some(now);
        settle_cod(order, now);
        return Ok(Some(Transition {
            status: OrderStatus::Delivered,
            note: Some("Delivery confirmed by customer and admin".to_string()),
            restore_stock: false,
        }));
    }
    Ok(None)
}

/// Admin payment status change
pub fn apply_payment_status(order: &mut Order, status: PaymentStatus, now: i64) {
    order.payment_status = status;
    order.updated_at = now;
    if status == PaymentStatus::Paid && order.paid_at.is_none() {
        order.paid_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(method: PaymentMethod) -> Order {
        Order {
            id: 1,
            user_id: 10,
            address_id: None,
            subtotal: Decimal::from(100),
            tax: Decimal::from(8),
            shipping_cost: Decimal::ZERO,
            discount: Decimal::ZERO,
            total: Decimal::from(108),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method: method,
            idempotency_key: None,
            coupon_code: None,
            note: None,
            client_confirmed_delivery: false,
            admin_confirmed_delivery: false,
            stock_restored: false,
            created_at: 0,
            updated_at: 0,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
            paid_at: None,
        }
    }

    fn product(id: i64, stock: i32) -> Product {
        Product {
            id,
            category_id: None,
            name: format!("P{id}"),
            slug: format!("p{id}"),
            description: None,
            price: Decimal::from(100_000),
            compare_at_price: None,
            image: None,
            images: vec![],
            stock_quantity: stock,
            in_stock: stock > 0,
            is_active: true,
            is_featured: false,
            rating_avg: 0.0,
            review_count: 0,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_merge_lines_sums_and_sorts() {
        let lines = vec![
            OrderLineInput { product_id: 9, quantity: 1 },
            OrderLineInput { product_id: 3, quantity: 2 },
            OrderLineInput { product_id: 9, quantity: 4 },
        ];
        assert_eq!(merge_lines(&lines).unwrap(), vec![(3, 2), (9, 5)]);
        assert_eq!(merge_lines(&[]).unwrap_err().code, ErrorCode::OrderEmpty);
    }

    #[test]
    fn test_check_line() {
        let mut p = product(1, 2);
        assert!(check_line(&p, 2).is_ok());
        assert_eq!(check_line(&p, 3).unwrap_err().code, ErrorCode::ProductOutOfStock);
        p.is_active = false;
        assert_eq!(check_line(&p, 1).unwrap_err().code, ErrorCode::ProductInactive);
    }

    #[test]
    fn test_build_order_totals() {
        let mut seq = 100;
        let mut next = || {
            seq += 1;
            seq
        };
        let seed = OrderSeed {
            user_id: 10,
            address_id: Some(5),
            payment_method: PaymentMethod::Cod,
            idempotency_key: None,
            note: None,
        };
        let draft = build_order(
            seed,
            &[(1, 2), (2, 4)],
            &[product(1, 5), product(2, 5)],
            None,
            &PricingConfig::default(),
            0,
            &mut next,
        )
        .unwrap();
        assert_eq!(draft.order.subtotal, Decimal::from(600_000));
        assert_eq!(draft.order.tax, Decimal::from(48_000));
        assert_eq!(draft.order.shipping_cost, Decimal::ZERO);
        assert_eq!(draft.order.total, Decimal::from(648_000));
        assert_eq!(draft.items.len(), 2);
        assert_eq!(draft.history.status, OrderStatus::Pending);
    }

    #[test]
    fn test_build_order_missing_product() {
        let mut next = || 1;
        let seed = OrderSeed {
            user_id: 10,
            address_id: None,
            payment_method: PaymentMethod::Cod,
            idempotency_key: None,
            note: None,
        };
        let err = build_order(seed, &[(42, 1)], &[], None, &PricingConfig::default(), 0, &mut next)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductNotFound);
    }

    #[test]
    fn test_cancel_rules() {
        let mut o = order(PaymentMethod::Cod);
        assert_eq!(
            cancel(&mut o, Actor::customer(11), 5).unwrap_err().code,
            ErrorCode::PermissionDenied
        );
        let t = cancel(&mut o, Actor::customer(10), 5).unwrap();
        assert!(t.restore_stock);
        assert_eq!(o.status, OrderStatus::Cancelled);
        assert_eq!(o.cancelled_at, Some(5));
        assert_eq!(
            cancel(&mut o, Actor::customer(10), 6).unwrap_err().code,
            ErrorCode::OrderNotCancellable
        );
    }

    #[test]
    fn test_admin_cancel_after_owner_cancel_restores_once() {
        let mut o = order(PaymentMethod::Cod);
        assert!(cancel(&mut o, Actor::customer(10), 1).unwrap().restore_stock);
        let t = apply_status(&mut o, OrderStatus::Cancelled, None, 2);
        assert!(!t.restore_stock);
    }

    #[test]
    fn test_apply_status_accepts_any_transition() {
        let mut o = order(PaymentMethod::BankTransfer);
        apply_status(&mut o, OrderStatus::Delivered, None, 3);
        assert_eq!(o.delivered_at, Some(3));
        assert_eq!(o.payment_status, PaymentStatus::Pending);
        let t = apply_status(&mut o, OrderStatus::Pending, Some("reopened".into()), 4);
        assert_eq!(o.status, OrderStatus::Pending);
        assert_eq!(t.note.as_deref(), Some("reopened"));
    }

    #[test]
    fn test_dual_confirmation() {
        let mut o = order(PaymentMethod::Cod);
        o.status = OrderStatus::Shipped;

        assert!(confirm_delivery(&mut o, Actor::customer(10), 7).unwrap().is_none());
        assert_eq!(o.status, OrderStatus::Shipped);
        assert!(o.client_confirmed_delivery);

        let t = confirm_delivery(&mut o, Actor::admin(1), 8).unwrap().unwrap();
        assert_eq!(t.status, OrderStatus::Delivered);
        assert_eq!(o.status, OrderStatus::Delivered);
        assert_eq!(o.delivered_at, Some(8));
        assert_eq!(o.payment_status, PaymentStatus::Paid);
        assert_eq!(o.paid_at, Some(8));
    }

    #[test]
    fn test_confirm_rejections() {
        let mut o = order(PaymentMethod::Cod);
        assert_eq!(
            confirm_delivery(&mut o, Actor::customer(99), 1).unwrap_err().code,
            ErrorCode::PermissionDenied
        );
        o.status = OrderStatus::Cancelled;
        assert_eq!(
            confirm_delivery(&mut o, Actor::customer(10), 1).unwrap_err().code,
            ErrorCode::OrderNotDeliverable
        );
    }

    #[test]
    fn test_payment_status_stamps_paid_at_once() {
        let mut o = order(PaymentMethod::BankTransfer);
        apply_payment_status(&mut o, PaymentStatus::Paid, 10);
        apply_payment_status(&mut o, PaymentStatus::Paid, 20);
        assert_eq!(o.paid_at, Some(10));
    }
}
