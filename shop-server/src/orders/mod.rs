//! Order workflow
//!
//! - [`pricing`]: tax, shipping and totals
//! - [`coupon`]: coupon eligibility and discounts
//! - [`workflow`]: placement and lifecycle transitions (pure)
//! - [`store`]: the transactional persistence trait, with [`pg`] and
//!   [`memory`] implementations
//! - [`service`]: access checks and realtime notification around a store

pub mod coupon;
pub mod memory;
pub mod pg;
pub mod pricing;
pub mod service;
pub mod store;
pub mod workflow;

pub use memory::MemoryOrderStore;
pub use pg::PgOrderStore;
pub use pricing::{PricingConfig, Totals};
pub use service::OrderService;
pub use store::{
    DeliveryConfirmation, OrderFilter, OrderStore, PlaceOrder, PlacedOrder, ShippingAddress,
};
pub use workflow::Actor;
