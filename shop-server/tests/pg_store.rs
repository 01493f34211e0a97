//! Row locking and constraint behavior against a live PostgreSQL
//!
//! Run with `DATABASE_URL=postgres://... cargo test -p shop-server -- --ignored`.
//! Every test seeds its own rows, so the database may be shared.

use futures::future::join_all;
use rust_decimal::Decimal;
use shared::error::ErrorCode;
use shared::models::{
    AddressCreate, CreateOrderRequest, NewNotification, NotificationKind, OrderLineInput,
    PaymentMethod, Product, ProductCreate, User, UserRole,
};
use shared::util::{now_millis, snowflake_id};
use shop_server::db;
use shop_server::orders::{Actor, OrderService, PgOrderStore, PricingConfig};
use shop_server::realtime::RealtimeHub;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::collections::HashSet;
use std::sync::Arc;

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

async fn customer(pool: &PgPool) -> User {
    let email = format!("buyer-{}@example.com", snowflake_id());
    db::users::create(pool, &email, "x", "Buyer", None, UserRole::Customer)
        .await
        .unwrap()
}

async fn product(pool: &PgPool, stock: i32) -> Product {
    let data = ProductCreate {
        category_id: None,
        name: "Teapot".into(),
        slug: None,
        description: None,
        price: Decimal::from(100_000),
        compare_at_price: None,
        image: None,
        images: vec![],
        stock_quantity: stock,
        is_active: Some(true),
        is_featured: None,
    };
    let slug = format!("teapot-{}", snowflake_id());
    db::products::create(pool, &data, &slug).await.unwrap()
}

fn service(pool: &PgPool) -> OrderService {
    OrderService::new(
        Arc::new(PgOrderStore::new(pool.clone())),
        PricingConfig::default(),
        RealtimeHub::disabled(),
    )
}

fn request(product_id: i64, quantity: i32, key: Option<&str>) -> CreateOrderRequest {
    CreateOrderRequest {
        items: vec![OrderLineInput {
            product_id,
            quantity,
        }],
        address_id: None,
        shipping_address: Some(AddressCreate {
            recipient_name: "Ada".into(),
            phone: "0900000000".into(),
            address_line: "1 Main St".into(),
            ward: None,
            district: None,
            city: "Hanoi".into(),
            is_default: false,
        }),
        payment_method: PaymentMethod::Cod,
        idempotency_key: key.map(str::to_owned),
        coupon_code: None,
        note: None,
    }
}

async fn stock_of(pool: &PgPool, product_id: i64) -> (i32, bool) {
    let p = db::products::find_by_id(pool, product_id).await.unwrap().unwrap();
    (p.stock_quantity, p.in_stock)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_checkout_with_same_key_creates_one_order() {
    let pool = pool().await;
    let user = customer(&pool).await;
    let teapot = product(&pool, 5).await;
    let orders = service(&pool);
    let key = format!("checkout-{}", snowflake_id());

    let (a, b) = tokio::join!(
        orders.place_order(user.id, request(teapot.id, 2, Some(&key))),
        orders.place_order(user.id, request(teapot.id, 2, Some(&key))),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.detail.order.id, b.detail.order.id);
    assert_eq!([a.created, b.created].iter().filter(|c| **c).count(), 1);
    assert_eq!(stock_of(&pool, teapot.id).await, (3, true));

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE idempotency_key = $1")
        .bind(&key)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_cancel_restores_stock_and_persists_flag() {
    let pool = pool().await;
    let user = customer(&pool).await;
    let teapot = product(&pool, 2).await;
    let orders = service(&pool);
    let actor = Actor::customer(user.id);

    let placed = orders
        .place_order(user.id, request(teapot.id, 2, None))
        .await
        .unwrap();
    assert_eq!(stock_of(&pool, teapot.id).await, (0, false));

    let order_id = placed.detail.order.id;
    let cancelled = orders.cancel(actor, order_id).await.unwrap();
    assert!(cancelled.stock_restored);
    assert_eq!(stock_of(&pool, teapot.id).await, (2, true));

    let err = orders.cancel(actor, order_id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::OrderNotCancellable);
    assert_eq!(stock_of(&pool, teapot.id).await, (2, true));

    let stored = orders.get_order(actor, order_id).await.unwrap();
    assert!(stored.order.stock_restored);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_order_totals_must_add_up() {
    let pool = pool().await;
    let user = customer(&pool).await;
    let teapot = product(&pool, 1).await;

    let placed = service(&pool)
        .place_order(user.id, request(teapot.id, 1, None))
        .await
        .unwrap();

    let err = sqlx::query("UPDATE orders SET total = total + 1 WHERE id = $1")
        .bind(placed.detail.order.id)
        .execute(&pool)
        .await
        .unwrap_err();
    let constraint = err.as_database_error().and_then(|e| e.constraint());
    assert_eq!(constraint, Some("orders_total_check"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_sweeps_claim_disjoint_rows() {
    let pool = pool().await;
    let due_at = now_millis() + 60_000;

    let mut ours = HashSet::new();
    for i in 0..20 {
        let mut data =
            NewNotification::to_admins(NotificationKind::System, "Scheduled", format!("#{i}"));
        data.scheduled_at = Some(due_at);
        let row = db::notifications::insert(&pool, &data).await.unwrap();
        assert!(!row.is_sent);
        ours.insert(row.id);
    }

    let sweep = move |pool: PgPool| async move {
        let mut claimed = Vec::new();
        loop {
            let batch = db::notifications::claim_due(&pool, due_at, 3).await.unwrap();
            if batch.is_empty() {
                break claimed;
            }
            claimed.extend(batch.into_iter().map(|n| n.id));
        }
    };
    let first = tokio::spawn(sweep(pool.clone()));
    let second = tokio::spawn(sweep(pool.clone()));
    let (first, second) = (first.await.unwrap(), second.await.unwrap());

    let first: HashSet<i64> = first.into_iter().collect();
    let second: HashSet<i64> = second.into_iter().collect();
    assert!(first.is_disjoint(&second));
    let claimed: HashSet<i64> = first.union(&second).copied().collect();
    assert!(ours.is_subset(&claimed));

    assert!(db::notifications::claim_due(&pool, due_at, 100)
        .await
        .unwrap()
        .iter()
        .all(|n| !ours.contains(&n.id)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_cart_adds_stop_at_stock() {
    let pool = pool().await;
    let user = customer(&pool).await;
    let teapot = product(&pool, 5).await;

    let adds = (0..8).map(|_| db::cart::add_quantity(&pool, user.id, teapot.id, 1));
    let results: Vec<Option<i32>> = join_all(adds)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_some()).count(), 5);
    assert_eq!(
        db::cart::quantity_of(&pool, user.id, teapot.id).await.unwrap(),
        5
    );
    assert_eq!(
        db::cart::add_quantity(&pool, user.id, teapot.id, 1).await.unwrap(),
        None
    );
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_cart_add_accumulates_and_skips_inactive() {
    let pool = pool().await;
    let user = customer(&pool).await;
    let teapot = product(&pool, 5).await;

    assert_eq!(
        db::cart::add_quantity(&pool, user.id, teapot.id, 2).await.unwrap(),
        Some(2)
    );
    assert_eq!(
        db::cart::add_quantity(&pool, user.id, teapot.id, 3).await.unwrap(),
        Some(5)
    );
    assert_eq!(
        db::cart::add_quantity(&pool, user.id, teapot.id, 1).await.unwrap(),
        None
    );

    let lamp = product(&pool, 5).await;
    sqlx::query("UPDATE products SET is_active = FALSE WHERE id = $1")
        .bind(lamp.id)
        .execute(&pool)
        .await
        .unwrap();
    assert_eq!(
        db::cart::add_quantity(&pool, user.id, lamp.id, 1).await.unwrap(),
        None
    );
}
