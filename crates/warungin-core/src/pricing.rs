//! # Order Pricing
//!
//! Line pricing and order totals for checkout.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for each line (request order):                                         │
//! │      subtotal = price × quantity                                        │
//! │      tax      = round(subtotal × tax_rate)      ← rounded per line      │
//! │                                                                         │
//! │  order:                                                                 │
//! │      subtotal = Σ line subtotal                                         │
//! │      tax      = override  if given   else Σ line tax                    │
//! │      total    = subtotal − discount + tax                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;

/// A priced order line, ready to be written as a transaction item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub line_no: i64,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
    pub tax: Money,
}

/// Prices `quantity` units of `product` at its current price and tax rate.
pub fn price_line(line_no: i64, product: &Product, quantity: i64) -> PricedLine {
    let unit_price = product.price();
    let subtotal = unit_price.multiply_quantity(quantity);
    PricedLine {
        line_no,
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        quantity,
        unit_price,
        subtotal,
        tax: subtotal.calculate_tax(product.tax_rate()),
    }
}

/// Header totals of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
}

/// Sums priced lines into order totals.
///
/// Fails when the discount is larger than the subtotal.
pub fn summarize(
    lines: &[PricedLine],
    discount: Money,
    tax_override: Option<Money>,
) -> CoreResult<OrderTotals> {
    let subtotal: Money = lines.iter().map(|l| l.subtotal).sum();
    if discount > subtotal {
        return Err(CoreError::DiscountExceedsSubtotal {
            discount: discount.cents(),
            subtotal: subtotal.cents(),
        });
    }

    let tax = tax_override.unwrap_or_else(|| lines.iter().map(|l| l.tax).sum());

    Ok(OrderTotals {
        subtotal,
        discount,
        tax,
        total: subtotal - discount + tax,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(price_cents: i64, tax_rate_bps: u32) -> Product {
        Product {
            id: "p".to_string(),
            tenant_id: "t".to_string(),
            sku: "SKU".to_string(),
            name: "Mie Ayam".to_string(),
            price_cents,
            cost_cents: 0,
            tax_rate_bps,
            stock_qty: 10,
            use_material_stock: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_price_line() {
        let line = price_line(1, &product(1_500_000, 1100), 3);
        assert_eq!(line.subtotal.cents(), 4_500_000);
        assert_eq!(line.tax.cents(), 495_000);
    }

    #[test]
    fn test_totals_identity() {
        let lines = vec![
            price_line(1, &product(1_005, 1000), 1), // tax 100.5 → 101
            price_line(2, &product(1_005, 1000), 1), // tax 101
        ];
        let totals = summarize(&lines, Money::from_cents(10), None).unwrap();
        assert_eq!(totals.subtotal.cents(), 2_010);
        assert_eq!(totals.tax.cents(), 202);
        assert_eq!(totals.total, totals.subtotal - totals.discount + totals.tax);
    }

    #[test]
    fn test_tax_override_replaces_computed() {
        let lines = vec![price_line(1, &product(10_000, 1100), 2)];
        let totals = summarize(&lines, Money::zero(), Some(Money::zero())).unwrap();
        assert!(totals.tax.is_zero());
        assert_eq!(totals.total.cents(), 20_000);
    }

    #[test]
    fn test_discount_cannot_exceed_subtotal() {
        let lines = vec![price_line(1, &product(1_000, 0), 1)];
        let err = summarize(&lines, Money::from_cents(1_001), None).unwrap_err();
        assert!(matches!(err, CoreError::DiscountExceedsSubtotal { .. }));

        // equal is fine
        let totals = summarize(&lines, Money::from_cents(1_000), None).unwrap();
        assert!(totals.total.is_zero());
    }
}
