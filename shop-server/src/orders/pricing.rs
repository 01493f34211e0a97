//! Order totals

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::config::Config;

/// Tax and shipping parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingConfig {
    pub tax_rate: Decimal,
    pub shipping_fee: Decimal,
    pub free_shipping_threshold: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(8, 2),
            shipping_fee: Decimal::from(30_000),
            free_shipping_threshold: Decimal::from(500_000),
        }
    }
}

impl From<&Config> for PricingConfig {
    fn from(config: &Config) -> Self {
        Self {
            tax_rate: config.tax_rate,
            shipping_fee: config.shipping_fee,
            free_shipping_threshold: config.free_shipping_threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping_cost: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

/// Round to cents, midpoint away from zero
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl PricingConfig {
    pub fn tax_for(&self, subtotal: Decimal) -> Decimal {
        round_money(subtotal * self.tax_rate)
    }

    pub fn shipping_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal >= self.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.shipping_fee
        }
    }

    /// `total = subtotal + tax + shipping - discount`; tax is levied on the
    /// undiscounted subtotal.
    pub fn quote(&self, subtotal: Decimal, discount: Decimal) -> Totals {
        let subtotal = round_money(subtotal);
        let discount = round_money(discount);
        let tax = self.tax_for(subtotal);
        let shipping_cost = self.shipping_for(subtotal);
        Totals {
            subtotal,
            tax,
            shipping_cost,
            discount,
            total: subtotal + tax + shipping_cost - discount,
        }
    }
}
