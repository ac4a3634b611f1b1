//! # Inventory Views
//!
//! Read models built on top of [`crate::availability`]: the inventory listing
//! with stock status, its summary, raw-material alerts and the recipe cost
//! breakdown.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::availability::{material_cost_per_unit, AvailableStock};
use crate::material::usage_per_unit;
use crate::money::Money;
use crate::quantity::{ConversionRate, MaterialQty};
use crate::types::{Product, RawMaterial, RecipeComponent};

/// Products with fewer sellable units than this are reported as low.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

// =============================================================================
// Stock Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    Ok,
    Low,
    Out,
}

impl StockStatus {
    /// `out` at or below zero, `low` below `threshold`, otherwise `ok`.
    pub fn classify(available: i64, threshold: i64) -> Self {
        if available <= 0 {
            StockStatus::Out
        } else if available < threshold {
            StockStatus::Low
        } else {
            StockStatus::Ok
        }
    }
}

// =============================================================================
// Inventory Listing
// =============================================================================

/// One row of the inventory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryItem {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub use_material_stock: bool,
    pub is_active: bool,
    pub available_stock: i64,
    pub status: StockStatus,
    pub price_cents: i64,
    /// Stored cost, or the recipe cost for material-driven products
    /// without one.
    pub unit_cost_cents: i64,
    /// `max(available, 0) × unit_cost`.
    pub stock_value_cents: i64,
}

/// Cost used for stock valuation.
///
/// Material-driven products without a stored cost fall back to the cost of
/// their recipe.
pub fn effective_unit_cost(product: &Product, components: &[RecipeComponent]) -> Money {
    if product.use_material_stock && product.cost_cents <= 0 {
        material_cost_per_unit(components)
    } else {
        product.cost()
    }
}

impl InventoryItem {
    pub fn build(
        product: &Product,
        components: &[RecipeComponent],
        availability: &AvailableStock,
        low_stock_threshold: i64,
    ) -> Self {
        let unit_cost = effective_unit_cost(product, components);
        let available = availability.available;
        InventoryItem {
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            use_material_stock: product.use_material_stock,
            is_active: product.is_active,
            available_stock: available,
            status: StockStatus::classify(available, low_stock_threshold),
            price_cents: product.price_cents,
            unit_cost_cents: unit_cost.cents(),
            stock_value_cents: unit_cost.multiply_quantity(available.max(0)).cents(),
        }
    }
}

/// Filter for the inventory listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryFilter {
    #[serde(default)]
    pub status: Option<StockStatus>,
    /// Case-insensitive substring of name or SKU.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

impl InventoryFilter {
    pub fn matches(&self, item: &InventoryItem) -> bool {
        if !self.include_inactive && !item.is_active {
            return false;
        }
        if let Some(status) = self.status {
            if item.status != status {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => {
                let q = q.to_lowercase();
                item.name.to_lowercase().contains(&q) || item.sku.to_lowercase().contains(&q)
            }
            _ => true,
        }
    }
}

/// Totals over an inventory listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventorySummary {
    pub total_products: i64,
    pub ok_count: i64,
    pub low_stock_count: i64,
    pub out_of_stock_count: i64,
    pub total_stock_value_cents: i64,
}

impl InventorySummary {
    pub fn from_items(items: &[InventoryItem]) -> Self {
        items.iter().fold(InventorySummary::default(), |mut s, item| {
            s.total_products += 1;
            match item.status {
                StockStatus::Ok => s.ok_count += 1,
                StockStatus::Low => s.low_stock_count += 1,
                StockStatus::Out => s.out_of_stock_count += 1,
            }
            s.total_stock_value_cents += item.stock_value_cents;
            s
        })
    }
}

// =============================================================================
// Material Alerts
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MaterialAlert {
    pub material_id: String,
    pub name: String,
    pub unit: String,
    pub stock_qty: MaterialQty,
    pub min_stock_level: MaterialQty,
}

/// Materials needing a restock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MaterialAlerts {
    /// `0 < stock < min_stock_level`
    pub low_stock: Vec<MaterialAlert>,
    /// `stock <= 0`
    pub out_of_stock: Vec<MaterialAlert>,
}

impl MaterialAlerts {
    pub fn from_materials(materials: &[RawMaterial]) -> Self {
        let mut alerts = MaterialAlerts::default();
        for m in materials {
            let alert = || MaterialAlert {
                material_id: m.id.clone(),
                name: m.name.clone(),
                unit: m.unit.clone(),
                stock_qty: m.stock_qty,
                min_stock_level: m.min_stock_level,
            };
            if !m.stock_qty.is_positive() {
                alerts.out_of_stock.push(alert());
            } else if m.stock_qty < m.min_stock_level {
                alerts.low_stock.push(alert());
            }
        }
        alerts
    }

    pub fn is_empty(&self) -> bool {
        self.low_stock.is_empty() && self.out_of_stock.is_empty()
    }
}

// =============================================================================
// Cost Breakdown
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CostLine {
    pub material_id: String,
    pub material_name: String,
    pub quantity_used: MaterialQty,
    pub used_unit: String,
    pub conversion_rate: ConversionRate,
    pub unit_price_cents: i64,
    /// `quantity_used × conversion_rate × unit_price`.
    pub cost_cents: i64,
}

/// What one unit of a product costs to make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CostBreakdown {
    pub product_id: String,
    pub lines: Vec<CostLine>,
    pub total_cost_cents: i64,
    pub price_cents: i64,
    pub margin_cents: i64,
}

impl CostBreakdown {
    pub fn compute(product: &Product, components: &[RecipeComponent]) -> Self {
        let lines: Vec<CostLine> = components
            .iter()
            .map(|c| {
                let cost = usage_per_unit(c.quantity_used, c.conversion_rate)
                    .unwrap_or_else(MaterialQty::max_value)
                    .price_at(Money::from_cents(c.unit_price_cents));
                CostLine {
                    material_id: c.material_id.clone(),
                    material_name: c.material_name.clone(),
                    quantity_used: c.quantity_used,
                    used_unit: c.used_unit.clone(),
                    conversion_rate: c.conversion_rate.effective(),
                    unit_price_cents: c.unit_price_cents,
                    cost_cents: cost.cents(),
                }
            })
            .collect();
        let total = lines
            .iter()
            .fold(0i64, |acc, l| acc.saturating_add(l.cost_cents));

        CostBreakdown {
            product_id: product.id.clone(),
            lines,
            total_cost_cents: total,
            price_cents: product.price_cents,
            margin_cents: product.price_cents.saturating_sub(total),
        }
    }
}
