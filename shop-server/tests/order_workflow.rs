//! Order lifecycle through `OrderService` on the in-memory store

use rust_decimal::Decimal;
use shared::error::ErrorCode;
use shared::models::{
    AddressCreate, Coupon, CreateOrderRequest, DiscountType, OrderLineInput, OrderStatus,
    PaymentMethod, PaymentStatus, Product,
};
use shop_server::orders::{Actor, MemoryOrderStore, OrderFilter, OrderService, PricingConfig};
use shop_server::realtime::RealtimeHub;
use std::sync::Arc;

const CUSTOMER: i64 = 10;
const OTHER_CUSTOMER: i64 = 11;
const ADMIN: i64 = 1;

fn product(id: i64, price: i64, stock: i32) -> Product {
    Product {
        id,
        category_id: None,
        name: format!("Product {id}"),
        slug: format!("product-{id}"),
        description: None,
        price: Decimal::from(price),
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

fn coupon(code: &str, usage_limit: Option<i32>) -> Coupon {
    Coupon {
        id: 500,
        code: code.to_string(),
        description: None,
        discount_type: DiscountType::Fixed,
        discount_value: Decimal::from(10_000),
        min_order_value: Decimal::ZERO,
        max_discount: None,
        usage_limit,
        used_count: 0,
        starts_at: None,
        expires_at: None,
        is_active: true,
        created_at: 0,
        updated_at: 0,
    }
}

fn address() -> AddressCreate {
    AddressCreate {
        recipient_name: "Ada".into(),
        phone: "0900000000".into(),
        address_line: "1 Main St".into(),
        ward: None,
        district: None,
        city: "Hanoi".into(),
        is_default: false,
    }
}

fn request(items: &[(i64, i32)], method: PaymentMethod) -> CreateOrderRequest {
    CreateOrderRequest {
        items: items
            .iter()
            .map(|&(product_id, quantity)| OrderLineInput {
                product_id,
                quantity,
            })
            .collect(),
        address_id: None,
        shipping_address: Some(address()),
        payment_method: method,
        idempotency_key: None,
        coupon_code: None,
        note: None,
    }
}

fn setup() -> (Arc<MemoryOrderStore>, OrderService) {
    let store = Arc::new(MemoryOrderStore::new());
    store.insert_product(product(100, 100_000, 5));
    store.insert_product(product(200, 50_000, 10));
    let service = OrderService::new(
        store.clone(),
        PricingConfig::default(),
        RealtimeHub::disabled(),
    );
    (store, service)
}

#[tokio::test]
async fn test_place_order_prices_and_takes_stock() {
    let (store, service) = setup();
    store.set_cart(CUSTOMER, &[(100, 2)]);

    let placed = service
        .place_order(CUSTOMER, request(&[(100, 2), (200, 1)], PaymentMethod::Cod))
        .await
        .unwrap();
    assert!(placed.created);

    let order = &placed.detail.order;
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.subtotal, Decimal::from(250_000));
    assert_eq!(order.tax, Decimal::from(20_000));
    assert_eq!(order.shipping_cost, Decimal::from(30_000));
    assert_eq!(order.total, Decimal::from(300_000));
    assert_eq!(placed.detail.items.len(), 2);
    assert_eq!(placed.detail.history.len(), 1);
    assert!(placed.detail.shipping_address.is_some());

    assert_eq!(store.product(100).unwrap().stock_quantity, 3);
    assert_eq!(store.product(200).unwrap().stock_quantity, 9);
    assert!(store.cart(CUSTOMER).is_empty());
    assert_eq!(store.addresses_of(CUSTOMER).len(), 1);
    assert!(store.addresses_of(CUSTOMER)[0].is_default);
}

#[tokio::test]
async fn test_duplicate_lines_are_merged_before_stock_check() {
    let (store, service) = setup();

    let err = service
        .place_order(CUSTOMER, request(&[(100, 3), (100, 3)], PaymentMethod::Cod))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ProductOutOfStock);
    assert_eq!(store.product(100).unwrap().stock_quantity, 5);
}

#[tokio::test]
async fn test_inactive_product_rejected() {
    let (store, service) = setup();
    let mut hidden = product(300, 10_000, 50);
    hidden.is_active = false;
    store.insert_product(hidden);

    let err = service
        .place_order(CUSTOMER, request(&[(300, 1)], PaymentMethod::Cod))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ProductInactive);
}

#[tokio::test]
async fn test_missing_address_rejected() {
    let (_store, service) = setup();
    let mut req = request(&[(100, 1)], PaymentMethod::Cod);
    req.shipping_address = None;

    let err = service.place_order(CUSTOMER, req).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::RequiredField);
}

#[tokio::test]
async fn test_idempotent_replay_returns_same_order() {
    let (store, service) = setup();
    let mut req = request(&[(100, 1)], PaymentMethod::BankTransfer);
    req.idempotency_key = Some("checkout-abc".into());

    let first = service.place_order(CUSTOMER, req.clone()).await.unwrap();
    let second = service.place_order(CUSTOMER, req.clone()).await.unwrap();

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.detail.order.id, second.detail.order.id);
    assert_eq!(store.product(100).unwrap().stock_quantity, 4);

    let err = service.place_order(OTHER_CUSTOMER, req).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::IdempotencyKeyConflict);
}

#[tokio::test]
async fn test_coupon_usage_limit() {
    let (store, service) = setup();
    store.insert_coupon(coupon("WELCOME", Some(1)));

    let mut req = request(&[(200, 1)], PaymentMethod::Cod);
    req.coupon_code = Some("welcome".into());
    let placed = service.place_order(CUSTOMER, req.clone()).await.unwrap();
    assert_eq!(placed.detail.order.discount, Decimal::from(10_000));
    assert_eq!(placed.detail.order.coupon_code.as_deref(), Some("WELCOME"));
    assert_eq!(store.coupon("WELCOME").unwrap().used_count, 1);

    let err = service
        .place_order(OTHER_CUSTOMER, req)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CouponUsageExceeded);
    assert_eq!(store.product(200).unwrap().stock_quantity, 9);
}

#[tokio::test]
async fn test_unknown_coupon_rejected() {
    let (_store, service) = setup();
    let mut req = request(&[(200, 1)], PaymentMethod::Cod);
    req.coupon_code = Some("NOPE".into());

    let err = service.place_order(CUSTOMER, req).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::CouponNotFound);
}

#[tokio::test]
async fn test_cancel_restores_stock_once() {
    let (store, service) = setup();
    let placed = service
        .place_order(CUSTOMER, request(&[(100, 2)], PaymentMethod::Cod))
        .await
        .unwrap();
    let order_id = placed.detail.order.id;
    assert_eq!(store.product(100).unwrap().stock_quantity, 3);

    let err = service
        .cancel(Actor::customer(OTHER_CUSTOMER), order_id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PermissionDenied);

    let cancelled = service
        .cancel(Actor::customer(CUSTOMER), order_id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert!(cancelled.cancelled_at.is_some());
    assert_eq!(store.product(100).unwrap().stock_quantity, 5);

    let err = service
        .cancel(Actor::customer(CUSTOMER), order_id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::OrderNotCancellable);

    service
        .update_status(Actor::admin(ADMIN), order_id, OrderStatus::Cancelled, None)
        .await
        .unwrap();
    assert_eq!(store.product(100).unwrap().stock_quantity, 5);

    let history = service
        .history(Actor::customer(CUSTOMER), order_id)
        .await
        .unwrap();
    assert_eq!(history.len(), 3);
}

#[tokio::test]
async fn test_shipped_order_cannot_be_cancelled_by_owner() {
    let (_store, service) = setup();
    let placed = service
        .place_order(CUSTOMER, request(&[(100, 1)], PaymentMethod::Cod))
        .await
        .unwrap();
    let order_id = placed.detail.order.id;

    let shipped = service
        .update_status(
            Actor::admin(ADMIN),
            order_id,
            OrderStatus::Shipped,
            Some("Handed to courier".into()),
        )
        .await
        .unwrap();
    assert!(shipped.shipped_at.is_some());

    let err = service
        .cancel(Actor::customer(CUSTOMER), order_id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::OrderNotCancellable);
}

#[tokio::test]
async fn test_status_change_requires_admin() {
    let (_store, service) = setup();
    let placed = service
        .place_order(CUSTOMER, request(&[(100, 1)], PaymentMethod::Cod))
        .await
        .unwrap();

    let err = service
        .update_status(
            Actor::customer(CUSTOMER),
            placed.detail.order.id,
            OrderStatus::Shipped,
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::AdminRequired);
}

#[tokio::test]
async fn test_dual_delivery_confirmation_settles_cod() {
    let (_store, service) = setup();
    let placed = service
        .place_order(CUSTOMER, request(&[(100, 1)], PaymentMethod::Cod))
        .await
        .unwrap();
    let order_id = placed.detail.order.id;

    let first = service
        .confirm_delivery(Actor::customer(CUSTOMER), order_id)
        .await
        .unwrap();
    assert!(!first.completed);
    let after_customer = first.order;
    assert!(after_customer.client_confirmed_delivery);
    assert_eq!(after_customer.status, OrderStatus::Pending);
    assert_eq!(after_customer.payment_status, PaymentStatus::Pending);

    let err = service
        .confirm_delivery(Actor::customer(OTHER_CUSTOMER), order_id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PermissionDenied);

    let second = service
        .confirm_delivery(Actor::admin(ADMIN), order_id)
        .await
        .unwrap();
    assert!(second.completed);
    let delivered = second.order;
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert!(delivered.delivered_at.is_some());
    assert_eq!(delivered.payment_status, PaymentStatus::Paid);
    assert!(delivered.paid_at.is_some());
}

#[tokio::test]
async fn test_confirm_after_admin_delivery_does_not_complete_pair() {
    let (_store, service) = setup();
    let placed = service
        .place_order(CUSTOMER, request(&[(100, 1)], PaymentMethod::Cod))
        .await
        .unwrap();
    let order_id = placed.detail.order.id;

    service
        .update_status(Actor::admin(ADMIN), order_id, OrderStatus::Delivered, None)
        .await
        .unwrap();

    for _ in 0..2 {
        let confirmation = service
            .confirm_delivery(Actor::customer(CUSTOMER), order_id)
            .await
            .unwrap();
        assert!(!confirmation.completed);
        assert_eq!(confirmation.order.status, OrderStatus::Delivered);
        assert!(confirmation.order.client_confirmed_delivery);
        assert!(!confirmation.order.admin_confirmed_delivery);
    }

    // Only the admin status change was recorded
    let history = service
        .history(Actor::customer(CUSTOMER), order_id)
        .await
        .unwrap();
    assert_eq!(
        history
            .iter()
            .filter(|h| h.status == OrderStatus::Delivered)
            .count(),
        1
    );
}

#[tokio::test]
async fn test_repeated_confirmation_completes_once() {
    let (_store, service) = setup();
    let placed = service
        .place_order(CUSTOMER, request(&[(100, 1)], PaymentMethod::Cod))
        .await
        .unwrap();
    let order_id = placed.detail.order.id;

    let customer = Actor::customer(CUSTOMER);
    let admin = Actor::admin(ADMIN);
    assert!(!service.confirm_delivery(customer, order_id).await.unwrap().completed);
    assert!(service.confirm_delivery(admin, order_id).await.unwrap().completed);
    assert!(!service.confirm_delivery(customer, order_id).await.unwrap().completed);
    assert!(!service.confirm_delivery(admin, order_id).await.unwrap().completed);
}

#[tokio::test]
async fn test_payment_status_is_admin_only() {
    let (_store, service) = setup();
    let placed = service
        .place_order(CUSTOMER, request(&[(100, 1)], PaymentMethod::CreditCard))
        .await
        .unwrap();
    let order_id = placed.detail.order.id;

    let err = service
        .set_payment_status(Actor::customer(CUSTOMER), order_id, PaymentStatus::Paid)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::AdminRequired);

    let paid = service
        .set_payment_status(Actor::admin(ADMIN), order_id, PaymentStatus::Paid)
        .await
        .unwrap();
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert!(paid.paid_at.is_some());
}

#[tokio::test]
async fn test_visibility_and_listing() {
    let (_store, service) = setup();
    let mine = service
        .place_order(CUSTOMER, request(&[(100, 1)], PaymentMethod::Cod))
        .await
        .unwrap();
    service
        .place_order(OTHER_CUSTOMER, request(&[(200, 1)], PaymentMethod::Cod))
        .await
        .unwrap();
    let order_id = mine.detail.order.id;

    assert!(service.get_order(Actor::customer(CUSTOMER), order_id).await.is_ok());
    assert!(service.get_order(Actor::admin(ADMIN), order_id).await.is_ok());
    let err = service
        .get_order(Actor::customer(OTHER_CUSTOMER), order_id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PermissionDenied);

    let err = service
        .get_order(Actor::admin(ADMIN), 9_999)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::OrderNotFound);

    let filter = OrderFilter {
        user_id: Some(CUSTOMER),
        limit: 20,
        ..Default::default()
    };
    let (orders, total) = service.list(&filter).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(orders[0].id, order_id);

    let all = OrderFilter {
        limit: 20,
        ..Default::default()
    };
    assert_eq!(service.list(&all).await.unwrap().1, 2);
}
