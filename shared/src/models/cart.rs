//! Cart Models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Cart line joined with the current product state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CartLine {
    pub product_id: i64,
    pub quantity: i32,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub in_stock: bool,
    pub is_active: bool,
    pub added_at: i64,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineView {
    #[serde(flatten)]
    pub line: CartLine,
    pub subtotal: Decimal,
}

/// `GET /api/cart`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub item_count: i64,
    pub subtotal: Decimal,
}

impl CartView {
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut subtotal = Decimal::ZERO;
        let mut item_count = 0i64;
        let items = lines
            .into_iter()
            .map(|line| {
                let line_total = line.line_total();
                subtotal += line_total;
                item_count += line.quantity as i64;
                CartLineView {
                    line,
                    subtotal: line_total,
                }
            })
            .collect();
        Self {
            items,
            item_count,
            subtotal,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddCartItem {
    pub product_id: i64,
    #[validate(range(min = 1, max = 10000))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCartItem {
    /// Zero removes the line
    #[validate(range(min = 0, max = 10000))]
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;

    fn line(product_id: i64, price: i64, quantity: i32) -> CartLine {
        CartLine {
            product_id,
            quantity,
            name: format!("p{product_id}"),
            slug: format!("p{product_id}"),
            image: None,
            price: Decimal::from_i64(price).unwrap(),
            stock_quantity: 10,
            in_stock: true,
            is_active: true,
            added_at: 0,
        }
    }

    #[test]
    fn test_cart_view_totals() {
        let view = CartView::from_lines(vec![line(1, 100_000, 2), line(2, 50_000, 3)]);
        assert_eq!(view.item_count, 5);
        assert_eq!(view.subtotal, Decimal::from(350_000));
        assert_eq!(view.items[0].subtotal, Decimal::from(200_000));
    }

    #[test]
    fn test_empty_cart() {
        let view = CartView::from_lines(vec![]);
        assert_eq!(view.item_count, 0);
        assert_eq!(view.subtotal, Decimal::ZERO);
    }
}
