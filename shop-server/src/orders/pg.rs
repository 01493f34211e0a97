//! PostgreSQL order store

use async_trait::async_trait;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Address, Coupon, Order, OrderDetail, OrderItem, OrderStatus, OrderStatusHistory,
    PaymentStatus, Product,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::{PgConnection, PgPool};

use super::pricing::PricingConfig;
use super::store::{
    DeliveryConfirmation, OrderFilter, OrderStore, PlaceOrder, PlacedOrder, ShippingAddress,
};
use super::workflow::{self, Actor, OrderSeed, Transition};
use crate::db;
use crate::error::ServiceResult;

const IDEMPOTENCY_CONSTRAINT: &str = "orders_idempotency_key_key";

#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn load_detail(conn: &mut PgConnection, order_id: i64) -> ServiceResult<Option<OrderDetail>> {
    let Some(order): Option<Order> = sqlx::query_as("SELECT * FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let items: Vec<OrderItem> =
        sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
            .bind(order_id)
            .fetch_all(&mut *conn)
            .await?;
    let history = load_history(&mut *conn, order_id).await?;
    let shipping_address: Option<Address> = match order.address_id {
        Some(address_id) => sqlx::query_as("SELECT * FROM addresses WHERE id = $1")
            .bind(address_id)
            .fetch_optional(&mut *conn)
            .await?,
        None => None,
    };

    Ok(Some(OrderDetail {
        order,
        items,
        history,
        shipping_address,
    }))
}

async fn load_history(
    conn: &mut PgConnection,
    order_id: i64,
) -> ServiceResult<Vec<OrderStatusHistory>> {
    Ok(sqlx::query_as(
        "SELECT * FROM order_status_history WHERE order_id = $1 ORDER BY created_at, id",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?)
}

async fn find_by_key(conn: &mut PgConnection, key: &str) -> ServiceResult<Option<Order>> {
    Ok(sqlx::query_as("SELECT * FROM orders WHERE idempotency_key = $1")
        .bind(key)
        .fetch_optional(conn)
        .await?)
}

/// Return an earlier order created with the same key, if it is the caller's
async fn replay(conn: &mut PgConnection, existing: Order, user_id: i64) -> ServiceResult<PlacedOrder> {
    if existing.user_id != user_id {
        return Err(AppError::new(ErrorCode::IdempotencyKeyConflict).into());
    }
    let detail = load_detail(conn, existing.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    Ok(PlacedOrder {
        detail,
        created: false,
    })
}

async fn lock_order(conn: &mut PgConnection, order_id: i64) -> ServiceResult<Order> {
    let order: Option<Order> = sqlx::query_as("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    order.ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).into())
}

async fn save_state(conn: &mut PgConnection, order: &Order) -> ServiceResult<()> {
    sqlx::query(
        "UPDATE orders SET
            status = $1, payment_status = $2,
            client_confirmed_delivery = $3, admin_confirmed_delivery = $4,
            stock_restored = $5, updated_at = $6,
            shipped_at = $7, delivered_at = $8, cancelled_at = $9, paid_at = $10
         WHERE id = $11",
    )
    .bind(order.status)
    .bind(order.payment_status)
    .bind(order.client_confirmed_delivery)
    .bind(order.admin_confirmed_delivery)
    .bind(order.stock_restored)
    .bind(order.updated_at)
    .bind(order.shipped_at)
    .bind(order.delivered_at)
    .bind(order.cancelled_at)
    .bind(order.paid_at)
    .bind(order.id)
    .execute(conn)
    .await?;
    Ok(())
}

async fn insert_history(
    conn: &mut PgConnection,
    order_id: i64,
    status: OrderStatus,
    note: Option<&str>,
    changed_by: Option<i64>,
    now: i64,
) -> ServiceResult<()> {
    sqlx::query(
        "INSERT INTO order_status_history (id, order_id, status, note, changed_by, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(snowflake_id())
    .bind(order_id)
    .bind(status)
    .bind(note)
    .bind(changed_by)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

/// Put every line's quantity back, locking products in id order
async fn restore_stock(conn: &mut PgConnection, order_id: i64, now: i64) -> ServiceResult<()> {
    let lines: Vec<(i64, i32)> = sqlx::query_as(
        "SELECT product_id, quantity FROM order_items
         WHERE order_id = $1 AND product_id IS NOT NULL
         ORDER BY product_id",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    for (product_id, quantity) in lines {
        sqlx::query(
            "UPDATE products SET stock_quantity = stock_quantity + $1, in_stock = TRUE, updated_at = $2
             WHERE id = $3",
        )
        .bind(quantity)
        .bind(now)
        .bind(product_id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Persist a transition produced by the workflow
async fn commit_transition(
    conn: &mut PgConnection,
    order: &Order,
    transition: &Transition,
    actor: Actor,
    now: i64,
) -> ServiceResult<()> {
    if transition.restore_stock {
        restore_stock(&mut *conn, order.id, now).await?;
    }
    save_state(&mut *conn, order).await?;
    insert_history(
        conn,
        order.id,
        transition.status,
        transition.note.as_deref(),
        Some(actor.user_id),
        now,
    )
    .await
}

/// Write the order aggregate, take stock, count the coupon use, clear the cart
async fn insert_draft(
    conn: &mut PgConnection,
    draft: &workflow::OrderDraft,
) -> ServiceResult<()> {
    let o = &draft.order;
    sqlx::query(
        "INSERT INTO orders (
            id, user_id, address_id, subtotal, tax, shipping_cost, discount, total,
            status, payment_status, payment_method, idempotency_key, coupon_code, note,
            created_at, updated_at
         )
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15)",
    )
    .bind(o.id)
    .bind(o.user_id)
    .bind(o.address_id)
    .bind(o.subtotal)
    .bind(o.tax)
    .bind(o.shipping_cost)
    .bind(o.discount)
    .bind(o.total)
    .bind(o.status)
    .bind(o.payment_status)
    .bind(o.payment_method)
    .bind(o.idempotency_key.as_deref())
    .bind(o.coupon_code.as_deref())
    .bind(o.note.as_deref())
    .bind(o.created_at)
    .execute(&mut *conn)
    .await?;

    for item in &draft.items {
        sqlx::query(
            "INSERT INTO order_items (id, order_id, product_id, product_name, product_image, unit_price, quantity, subtotal)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(item.id)
        .bind(item.order_id)
        .bind(item.product_id)
        .bind(&item.product_name)
        .bind(item.product_image.as_deref())
        .bind(item.unit_price)
        .bind(item.quantity)
        .bind(item.subtotal)
        .execute(&mut *conn)
        .await?;
    }

    let h = &draft.history;
    sqlx::query(
        "INSERT INTO order_status_history (id, order_id, status, note, changed_by, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(h.id)
    .bind(h.order_id)
    .bind(h.status)
    .bind(h.note.as_deref())
    .bind(h.changed_by)
    .bind(h.created_at)
    .execute(&mut *conn)
    .await?;

    for &(product_id, quantity) in &draft.stock {
        sqlx::query(
            "UPDATE products SET
                stock_quantity = stock_quantity - $1,
                in_stock = stock_quantity - $1 > 0,
                updated_at = $2
             WHERE id = $3",
        )
        .bind(quantity)
        .bind(o.created_at)
        .bind(product_id)
        .execute(&mut *conn)
        .await?;
    }

    if let Some(coupon_id) = draft.coupon_id {
        sqlx::query("UPDATE coupons SET used_count = used_count + 1, updated_at = $1 WHERE id = $2")
            .bind(o.created_at)
            .bind(coupon_id)
            .execute(&mut *conn)
            .await?;
    }

    db::cart::clear(conn, o.user_id).await?;
    Ok(())
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn place_order(
        &self,
        user_id: i64,
        request: PlaceOrder,
        pricing: &PricingConfig,
    ) -> ServiceResult<PlacedOrder> {
        let mut tx = self.pool.begin().await?;

        if let Some(key) = request.idempotency_key.as_deref()
            && let Some(existing) = find_by_key(&mut *tx, key).await?
        {
            return replay(&mut *tx, existing, user_id).await;
        }

        let address_id = match &request.address {
            ShippingAddress::Saved(id) => {
                db::addresses::find_owned(&mut *tx, user_id, *id)
                    .await?
                    .ok_or_else(|| AppError::new(ErrorCode::AddressNotFound))?
                    .id
            }
            ShippingAddress::New(data) => db::addresses::create(&mut *tx, user_id, data).await?.id,
        };

        let ids: Vec<i64> = request.lines.iter().map(|(id, _)| *id).collect();
        let products: Vec<Product> =
            sqlx::query_as("SELECT * FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE")
                .bind(&ids)
                .fetch_all(&mut *tx)
                .await?;

        let coupon: Option<Coupon> = match request.coupon_code.as_deref() {
            Some(code) => Some(
                sqlx::query_as("SELECT * FROM coupons WHERE code = UPPER($1) FOR UPDATE")
                    .bind(code.trim())
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or_else(|| AppError::new(ErrorCode::CouponNotFound))?,
            ),
            None => None,
        };

        let seed = OrderSeed {
            user_id,
            address_id: Some(address_id),
            payment_method: request.payment_method,
            idempotency_key: request.idempotency_key.clone(),
            note: request.note.clone(),
        };
        let draft = workflow::build_order(
            seed,
            &request.lines,
            &products,
            coupon.as_ref(),
            pricing,
            now_millis(),
            &mut snowflake_id,
        )?;

        if let Err(e) = insert_draft(&mut *tx, &draft).await {
            // A concurrent request with the same key committed first
            if e.is_unique_violation_on(IDEMPOTENCY_CONSTRAINT)
                && let Some(key) = request.idempotency_key.as_deref()
            {
                tx.rollback().await?;
                let mut conn = self.pool.acquire().await?;
                let existing = find_by_key(&mut *conn, key)
                    .await?
                    .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
                return replay(&mut *conn, existing, user_id).await;
            }
            return Err(e);
        }

        let detail = load_detail(&mut *tx, draft.order.id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
        tx.commit().await?;

        Ok(PlacedOrder {
            detail,
            created: true,
        })
    }

    async fn find_order(&self, order_id: i64) -> ServiceResult<Option<OrderDetail>> {
        let mut conn = self.pool.acquire().await?;
        load_detail(&mut *conn, order_id).await
    }

    async fn owner_of(&self, order_id: i64) -> ServiceResult<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT user_id FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(id,)| id))
    }

    async fn cancel_order(&self, order_id: i64, actor: Actor) -> ServiceResult<Order> {
        let mut tx = self.pool.begin().await?;
        let mut order = lock_order(&mut *tx, order_id).await?;
        let now = now_millis();
        let transition = workflow::cancel(&mut order, actor, now)?;
        commit_transition(&mut *tx, &order, &transition, actor, now).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn update_status(
        &self,
        order_id: i64,
        actor: Actor,
        status: OrderStatus,
        note: Option<String>,
    ) -> ServiceResult<Order> {
        let mut tx = self.pool.begin().await?;
        let mut order = lock_order(&mut *tx, order_id).await?;
        let now = now_millis();
        let transition = workflow::apply_status(&mut order, status, note, now);
        commit_transition(&mut *tx, &order, &transition, actor, now).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn confirm_delivery(
        &self,
        order_id: i64,
        actor: Actor,
    ) -> ServiceResult<DeliveryConfirmation> {
        let mut tx = self.pool.begin().await?;
        let mut order = lock_order(&mut *tx, order_id).await?;
        let now = now_millis();
        let completed = match workflow::confirm_delivery(&mut order, actor, now)? {
            Some(transition) => {
                commit_transition(&mut *tx, &order, &transition, actor, now).await?;
                true
            }
            None => {
                save_state(&mut *tx, &order).await?;
                false
            }
        };
        tx.commit().await?;
        Ok(DeliveryConfirmation { order, completed })
    }

    async fn set_payment_status(
        &self,
        order_id: i64,
        status: PaymentStatus,
    ) -> ServiceResult<Order> {
        let mut tx = self.pool.begin().await?;
        let mut order = lock_order(&mut *tx, order_id).await?;
        workflow::apply_payment_status(&mut order, status, now_millis());
        save_state(&mut *tx, &order).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn list_orders(&self, filter: &OrderFilter) -> ServiceResult<(Vec<Order>, i64)> {
        const WHERE: &str = "
            WHERE ($1::BIGINT IS NULL OR user_id = $1)
              AND ($2::order_status IS NULL OR status = $2)
              AND ($3::payment_status IS NULL OR payment_status = $3)
              AND ($4::BIGINT IS NULL OR created_at >= $4)
              AND ($5::BIGINT IS NULL OR created_at < $5)";

        let sql = format!("SELECT * FROM orders {WHERE} ORDER BY created_at DESC, id DESC LIMIT $6 OFFSET $7");
        let orders: Vec<Order> = sqlx::query_as(&sql)
            .bind(filter.user_id)
            .bind(filter.status)
            .bind(filter.payment_status)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM orders {WHERE}");
        let (total,): (i64,) = sqlx::query_as(&count_sql)
            .bind(filter.user_id)
            .bind(filter.status)
            .bind(filter.payment_status)
            .bind(filter.from)
            .bind(filter.to)
            .fetch_one(&self.pool)
            .await?;

        Ok((orders, total))
    }

    async fn history(&self, order_id: i64) -> ServiceResult<Vec<OrderStatusHistory>> {
        let mut conn = self.pool.acquire().await?;
        load_history(&mut *conn, order_id).await
    }
}
