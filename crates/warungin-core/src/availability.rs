//! # Stock Availability Calculator
//!
//! Sellable quantity of a product.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  use_material_stock = false ──► stock_qty                               │
//! │                                                                         │
//! │  use_material_stock = true:                                             │
//! │    for each linked material with usage > 0:                             │
//! │        usage    = quantity_used × conversion_rate (≤0 → 1)              │
//! │        can_make = floor(material.stock_qty / usage)                     │
//! │    available = min(can_make)   or 0 when no link qualifies              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pure; the inventory listing, summary and per-product query all call it.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::material::usage_per_unit;
use crate::money::Money;
use crate::quantity::{ConversionRate, MaterialQty};
use crate::types::{Product, RecipeComponent};

/// One material's contribution to a product's availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MaterialAvailability {
    pub material_id: String,
    pub material_name: String,
    pub stock_qty: MaterialQty,
    pub quantity_used: MaterialQty,
    /// Rate after the ≤0 → 1 default.
    pub conversion_rate: ConversionRate,
    /// Stock units consumed per product unit.
    pub actual_usage: MaterialQty,
    pub can_make: i64,
}

/// Sellable quantity with its per-material breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AvailableStock {
    pub product_id: String,
    pub use_material_stock: bool,
    pub available: i64,
    /// Empty for manual-stock products.
    pub materials: Vec<MaterialAvailability>,
}

/// Computes the available stock of `product` from its recipe.
pub fn available_stock(product: &Product, components: &[RecipeComponent]) -> AvailableStock {
    if !product.use_material_stock {
        return AvailableStock {
            product_id: product.id.clone(),
            use_material_stock: false,
            available: product.stock_qty,
            materials: Vec::new(),
        };
    }

    let materials: Vec<MaterialAvailability> = components
        .iter()
        .filter_map(|c| {
            let actual_usage = usage_per_unit(c.quantity_used, c.conversion_rate)
                .unwrap_or_else(MaterialQty::max_value);
            let can_make = c.stock_qty.whole_multiples_of(actual_usage)?;
            Some(MaterialAvailability {
                material_id: c.material_id.clone(),
                material_name: c.material_name.clone(),
                stock_qty: c.stock_qty,
                quantity_used: c.quantity_used,
                conversion_rate: c.conversion_rate.effective(),
                actual_usage,
                can_make,
            })
        })
        .collect();

    let available = materials.iter().map(|m| m.can_make).min().unwrap_or(0);

    AvailableStock {
        product_id: product.id.clone(),
        use_material_stock: true,
        available,
        materials,
    }
}

/// Cost of the materials consumed by one product unit.
pub fn material_cost_per_unit(components: &[RecipeComponent]) -> Money {
    components
        .iter()
        .map(|c| {
            usage_per_unit(c.quantity_used, c.conversion_rate)
                .unwrap_or_else(MaterialQty::max_value)
                .price_at(Money::from_cents(c.unit_price_cents))
        })
        .fold(Money::zero(), |acc, cost| acc.saturating_add(cost))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(use_material_stock: bool, stock_qty: i64) -> Product {
        Product {
            id: "p1".to_string(),
            tenant_id: "t1".to_string(),
            sku: "KOPI-SUSU".to_string(),
            name: "Kopi Susu".to_string(),
            price_cents: 1_800_000,
            cost_cents: 0,
            tax_rate_bps: 0,
            stock_qty,
            use_material_stock,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn component(id: &str, stock: &str, used: &str, rate_ppm: i64) -> RecipeComponent {
        RecipeComponent {
            material_id: id.to_string(),
            material_name: id.to_string(),
            material_unit: "unit".to_string(),
            stock_qty: stock.parse().unwrap(),
            unit_price_cents: 100,
            quantity_used: used.parse().unwrap(),
            used_unit: "unit".to_string(),
            conversion_rate: ConversionRate::from_ppm(rate_ppm),
        }
    }

    #[test]
    fn test_manual_stock_passes_through() {
        let p = product(false, 7);
        let stock = available_stock(&p, &[component("m", "100", "1", 1_000_000)]);
        assert_eq!(stock.available, 7);
        assert!(stock.materials.is_empty());
    }

    #[test]
    fn test_single_material() {
        let p = product(true, 0);
        let stock = available_stock(&p, &[component("gula", "20", "2", 1_000_000)]);
        assert_eq!(stock.available, 10);
        assert_eq!(stock.materials[0].can_make, 10);
        assert_eq!(stock.materials[0].actual_usage, MaterialQty::from_units(2));
    }

    #[test]
    fn test_minimum_over_materials_with_floor() {
        let p = product(true, 0);
        let recipe = [
            component("susu", "10", "0.3", 1_000_000),  // 33.3 → 33
            component("kopi", "1", "18", 1_000),        // 18 g → 0.018 kg: 55.5 → 55
            component("gelas", "40", "1", 0),           // rate ≤0 → 1: 40
        ];
        let stock = available_stock(&p, &recipe);
        assert_eq!(stock.available, 33);
        assert_eq!(stock.materials[2].conversion_rate, ConversionRate::one());
    }

    #[test]
    fn test_no_qualifying_links_is_zero() {
        let p = product(true, 50);
        assert_eq!(available_stock(&p, &[]).available, 0);

        let zero_usage = [component("x", "10", "0", 1_000_000)];
        let stock = available_stock(&p, &zero_usage);
        assert_eq!(stock.available, 0);
        assert!(stock.materials.is_empty());
    }

    #[test]
    fn test_material_cost_per_unit() {
        // 2 × 1.00 + 0.5 × 1.00
        let recipe = [
            component("a", "10", "2", 1_000_000),
            component("b", "10", "0.5", 1_000_000),
        ];
        assert_eq!(material_cost_per_unit(&recipe).cents(), 250);
    }

    #[test]
    fn test_usage_beyond_range_cannot_be_made() {
        let p = product(true, 0);
        let recipe = [
            component("gula", "20", "2", 1_000_000),
            component("beras", "25", "10000000", 1_000_000_000_000),
        ];
        let stock = available_stock(&p, &recipe);
        assert_eq!(stock.available, 0);
        assert_eq!(stock.materials[1].can_make, 0);
    }
}
