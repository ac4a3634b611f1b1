//! # Material Deltas
//!
//! The single sign-parameterized computation shared by checkout (deduct)
//! and void (restore).
//!
//! ```text
//!   delta = sign × quantity_used × conversion_rate(≤0 → 1) × item_quantity
//!
//!   create_order ── StockDirection::Deduct  (sign −1) ──┐
//!                                                        ├─► material_deltas()
//!   void_order  ─── StockDirection::Restore (sign +1) ──┘
//! ```
//!
//! Links whose per-unit usage is not positive are skipped here exactly as
//! they are skipped by [`crate::availability::available_stock`], so what the
//! till shows as sellable and what a sale consumes never diverge.
//!
//! A delta that does not fit the stored quantity range is an error, never a
//! wrapped or truncated value.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::quantity::{ConversionRate, MaterialQty};
use crate::types::RecipeComponent;

/// Direction of a material stock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockDirection {
    /// Sale: stock goes down.
    Deduct,
    /// Void: stock goes back up.
    Restore,
}

impl StockDirection {
    #[inline]
    pub const fn sign(self) -> i64 {
        match self {
            StockDirection::Deduct => -1,
            StockDirection::Restore => 1,
        }
    }
}

/// Stock-unit consumption of one product unit, or `None` when the product
/// leaves the quantity range.
pub fn usage_per_unit(
    quantity_used: MaterialQty,
    conversion_rate: ConversionRate,
) -> Option<MaterialQty> {
    quantity_used.checked_times(conversion_rate.effective())
}

/// A signed change to one material's stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialDelta {
    pub material_id: String,
    pub material_name: String,
    pub delta: MaterialQty,
}

/// Computes the material changes for `item_quantity` units of a product.
///
/// Deltas come out in recipe order, one per qualifying link.
pub fn material_deltas(
    components: &[RecipeComponent],
    item_quantity: i64,
    direction: StockDirection,
) -> CoreResult<Vec<MaterialDelta>> {
    let mut deltas = Vec::with_capacity(components.len());
    for c in components {
        let out_of_range = || CoreError::QuantityOutOfRange {
            material: c.material_name.clone(),
        };
        let usage = usage_per_unit(c.quantity_used, c.conversion_rate).ok_or_else(out_of_range)?;
        if !usage.is_positive() {
            continue;
        }
        let count = item_quantity
            .checked_mul(direction.sign())
            .ok_or_else(out_of_range)?;
        deltas.push(MaterialDelta {
            material_id: c.material_id.clone(),
            material_name: c.material_name.clone(),
            delta: usage.checked_scale(count).ok_or_else(out_of_range)?,
        });
    }
    Ok(deltas)
}
