//! In-memory order store
//!
//! Same semantics as the PostgreSQL store with one mutex standing in for the
//! row locks. Used by the workflow tests and local experiments.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Address, Coupon, Order, OrderDetail, OrderItem, OrderStatus, OrderStatusHistory,
    PaymentStatus, Product,
};
use shared::util::now_millis;
use std::collections::{BTreeMap, HashMap};

use super::pricing::PricingConfig;
use super::store::{
    DeliveryConfirmation, OrderFilter, OrderStore, PlaceOrder, PlacedOrder, ShippingAddress,
};
use super::workflow::{self, Actor, OrderSeed, Transition};
use crate::error::ServiceResult;

#[derive(Default)]
struct Inner {
    next_id: i64,
    products: BTreeMap<i64, Product>,
    coupons: HashMap<String, Coupon>,
    addresses: BTreeMap<i64, Address>,
    carts: HashMap<i64, BTreeMap<i64, i32>>,
    orders: BTreeMap<i64, Order>,
    items: HashMap<i64, Vec<OrderItem>>,
    history: HashMap<i64, Vec<OrderStatusHistory>>,
    keys: HashMap<String, i64>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn detail(&self, order_id: i64) -> Option<OrderDetail> {
        let order = self.orders.get(&order_id)?.clone();
        let shipping_address = order
            .address_id
            .and_then(|id| self.addresses.get(&id).cloned());
        Some(OrderDetail {
            items: self.items.get(&order_id).cloned().unwrap_or_default(),
            history: self.history.get(&order_id).cloned().unwrap_or_default(),
            shipping_address,
            order,
        })
    }

    fn replay(&self, order_id: i64, user_id: i64) -> ServiceResult<PlacedOrder> {
        let detail = self
            .detail(order_id)
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
        if detail.order.user_id != user_id {
            return Err(AppError::new(ErrorCode::IdempotencyKeyConflict).into());
        }
        Ok(PlacedOrder {
            detail,
            created: false,
        })
    }

    fn load_order(&self, order_id: i64) -> ServiceResult<Order> {
        self.orders
            .get(&order_id)
            .cloned()
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).into())
    }

    fn commit(&mut self, order: Order, transition: Option<Transition>, actor: Actor, now: i64) {
        if let Some(t) = transition {
            if t.restore_stock {
                let lines: Vec<(i64, i32)> = self
                    .items
                    .get(&order.id)
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|i| i.product_id.map(|p| (p, i.quantity)))
                            .collect()
                    })
                    .unwrap_or_default();
                for (product_id, quantity) in lines {
                    if let Some(p) = self.products.get_mut(&product_id) {
                        p.stock_quantity += quantity;
                        p.in_stock = true;
                        p.updated_at = now;
                    }
                }
            }
            let id = self.next_id();
            self.history
                .entry(order.id)
                .or_default()
                .push(OrderStatusHistory {
                    id,
                    order_id: order.id,
                    status: t.status,
                    note: t.note,
                    changed_by: Some(actor.user_id),
                    created_at: now,
                });
        }
        self.orders.insert(order.id, order);
    }
}

#[derive(Default)]
pub struct MemoryOrderStore {
    inner: Mutex<Inner>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_product(&self, product: Product) {
        self.inner.lock().products.insert(product.id, product);
    }

    pub fn product(&self, id: i64) -> Option<Product> {
        self.inner.lock().products.get(&id).cloned()
    }

    pub fn insert_coupon(&self, coupon: Coupon) {
        let mut inner = self.inner.lock();
        inner.coupons.insert(coupon.code.to_uppercase(), coupon);
    }

    pub fn coupon(&self, code: &str) -> Option<Coupon> {
        self.inner.lock().coupons.get(&code.to_uppercase()).cloned()
    }

    pub fn insert_address(&self, address: Address) {
        self.inner.lock().addresses.insert(address.id, address);
    }

    /// Addresses saved for `user_id`
    pub fn addresses_of(&self, user_id: i64) -> Vec<Address> {
        self.inner
            .lock()
            .addresses
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn set_cart(&self, user_id: i64, lines: &[(i64, i32)]) {
        self.inner
            .lock()
            .carts
            .insert(user_id, lines.iter().copied().collect());
    }

    pub fn cart(&self, user_id: i64) -> Vec<(i64, i32)> {
        self.inner
            .lock()
            .carts
            .get(&user_id)
            .map(|c| c.iter().map(|(k, v)| (*k, *v)).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn place_order(
        &self,
        user_id: i64,
        request: PlaceOrder,
        pricing: &PricingConfig,
    ) -> ServiceResult<PlacedOrder> {
        let mut inner = self.inner.lock();
        let inner = &mut *inner;

        if let Some(key) = request.idempotency_key.as_deref()
            && let Some(&existing) = inner.keys.get(key)
        {
            return inner.replay(existing, user_id);
        }

        let now = now_millis();
        let address = match &request.address {
            ShippingAddress::Saved(id) => inner
                .addresses
                .get(id)
                .filter(|a| a.user_id == user_id)
                .cloned()
                .ok_or_else(|| AppError::new(ErrorCode::AddressNotFound))?,
            ShippingAddress::New(data) => {
                let is_default = data.is_default
                    || !inner.addresses.values().any(|a| a.user_id == user_id);
                Address {
                    id: inner.next_id(),
                    user_id,
                    recipient_name: data.recipient_name.clone(),
                    phone: data.phone.clone(),
                    address_line: data.address_line.clone(),
                    ward: data.ward.clone(),
                    district: data.district.clone(),
                    city: data.city.clone(),
                    is_default,
                    created_at: now,
                    updated_at: now,
                }
            }
        };

        let products: Vec<Product> = request
            .lines
            .iter()
            .filter_map(|(id, _)| inner.products.get(id).cloned())
            .collect();
        let coupon = match request.coupon_code.as_deref() {
            Some(code) => Some(
                inner
                    .coupons
                    .get(&code.trim().to_uppercase())
                    .cloned()
                    .ok_or_else(|| AppError::new(ErrorCode::CouponNotFound))?,
            ),
            None => None,
        };

        let seed = OrderSeed {
            user_id,
            address_id: Some(address.id),
            payment_method: request.payment_method,
            idempotency_key: request.idempotency_key.clone(),
            note: request.note.clone(),
        };
        let mut next_id = inner.next_id;
        let draft = workflow::build_order(
            seed,
            &request.lines,
            &products,
            coupon.as_ref(),
            pricing,
            now,
            &mut || {
                next_id += 1;
                next_id
            },
        )?;
        inner.next_id = next_id;

        if matches!(request.address, ShippingAddress::New(_)) {
            if address.is_default {
                for a in inner.addresses.values_mut().filter(|a| a.user_id == user_id) {
                    a.is_default = false;
                }
            }
            inner.addresses.insert(address.id, address);
        }
        for &(product_id, quantity) in &draft.stock {
            if let Some(p) = inner.products.get_mut(&product_id) {
                p.stock_quantity -= quantity;
                p.in_stock = p.stock_quantity > 0;
                p.updated_at = now;
            }
        }
        if let Some(c) = coupon
            && let Some(stored) = inner.coupons.get_mut(&c.code.to_uppercase())
        {
            stored.used_count += 1;
        }
        inner.carts.remove(&user_id);

        let order_id = draft.order.id;
        if let Some(key) = draft.order.idempotency_key.clone() {
            inner.keys.insert(key, order_id);
        }
        inner.items.insert(order_id, draft.items);
        inner.history.insert(order_id, vec![draft.history]);
        inner.orders.insert(order_id, draft.order);

        let detail = inner
            .detail(order_id)
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
        Ok(PlacedOrder {
            detail,
            created: true,
        })
    }

    async fn find_order(&self, order_id: i64) -> ServiceResult<Option<OrderDetail>> {
        Ok(self.inner.lock().detail(order_id))
    }

    async fn owner_of(&self, order_id: i64) -> ServiceResult<Option<i64>> {
        Ok(self.inner.lock().orders.get(&order_id).map(|o| o.user_id))
    }

    async fn cancel_order(&self, order_id: i64, actor: Actor) -> ServiceResult<Order> {
        let mut inner = self.inner.lock();
        let mut order = inner.load_order(order_id)?;
        let now = now_millis();
        let transition = workflow::cancel(&mut order, actor, now)?;
        inner.commit(order.clone(), Some(transition), actor, now);
        Ok(order)
    }

    async fn update_status(
        &self,
        order_id: i64,
        actor: Actor,
        status: OrderStatus,
        note: Option<String>,
    ) -> ServiceResult<Order> {
        let mut inner = self.inner.lock();
        let mut order = inner.load_order(order_id)?;
        let now = now_millis();
        let transition = workflow::apply_status(&mut order, status, note, now);
        inner.commit(order.clone(), Some(transition), actor, now);
        Ok(order)
    }

    async fn confirm_delivery(
        &self,
        order_id: i64,
        actor: Actor,
    ) -> ServiceResult<DeliveryConfirmation> {
        let mut inner = self.inner.lock();
        let mut order = inner.load_order(order_id)?;
        let now = now_millis();
        let transition = workflow::confirm_delivery(&mut order, actor, now)?;
        let completed = transition.is_some();
        inner.commit(order.clone(), transition, actor, now);
        Ok(DeliveryConfirmation { order, completed })
    }

    async fn set_payment_status(
        &self,
        order_id: i64,
        status: PaymentStatus,
    ) -> ServiceResult<Order> {
        let mut inner = self.inner.lock();
        let mut order = inner.load_order(order_id)?;
        workflow::apply_payment_status(&mut order, status, now_millis());
        inner.orders.insert(order_id, order.clone());
        Ok(order)
    }

    async fn list_orders(&self, filter: &OrderFilter) -> ServiceResult<(Vec<Order>, i64)> {
        let inner = self.inner.lock();
        let mut matching: Vec<&Order> = inner.orders.values().filter(|o| filter.matches(o)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn history(&self, order_id: i64) -> ServiceResult<Vec<OrderStatusHistory>> {
        Ok(self
            .inner
            .lock()
            .history
            .get(&order_id)
            .cloned()
            .unwrap_or_default())
    }
}
