//! Stock movements shared by sales and voids.
//!
//! A sale calls these with [`StockDirection::Deduct`], a void with
//! [`StockDirection::Restore`]; the arithmetic is the same, only the sign
//! and the guard differ.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::{debug, warn};

use warungin_core::material::{material_deltas, MaterialDelta, StockDirection};
use warungin_core::{CoreError, Product};

use crate::error::EngineResult;
use crate::repository::{MaterialRepository, ProductRepository, RecipeRepository};

/// Moves a product's direct stock by `quantity` units in `direction`.
///
/// Manual-stock deductions are guarded; material-driven products and
/// restorations are not.
pub(crate) async fn move_product_stock(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    product: &Product,
    quantity: i64,
    direction: StockDirection,
    now: DateTime<Utc>,
) -> EngineResult<()> {
    let delta = quantity * direction.sign();
    let guarded = direction == StockDirection::Deduct && product.is_manual_stock();

    if ProductRepository::apply_stock_delta(conn, tenant_id, &product.id, delta, guarded, now)
        .await?
    {
        return Ok(());
    }

    match ProductRepository::find(conn, tenant_id, &product.id).await? {
        Some(current) if guarded => {
            warn!(
                product_id = %product.id,
                available = current.stock_qty,
                requested = quantity,
                "Insufficient product stock"
            );
            Err(CoreError::InsufficientStock {
                product: current.name,
                available: current.stock_qty,
                requested: quantity,
            }
            .into())
        }
        _ => Err(CoreError::ProductNotFound(product.id.clone()).into()),
    }
}

/// Applies a product's recipe for `quantity` units.
///
/// Deductions fail with `InsufficientMaterial` when a material would go
/// below zero, unless `allow_negative` is set. Restorations always apply.
pub(crate) async fn apply_recipe(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    product_id: &str,
    quantity: i64,
    direction: StockDirection,
    allow_negative: bool,
    now: DateTime<Utc>,
) -> EngineResult<Vec<MaterialDelta>> {
    let components = RecipeRepository::components_in(conn, tenant_id, product_id).await?;
    let deltas = material_deltas(&components, quantity, direction)?;
    let guarded = direction == StockDirection::Deduct && !allow_negative;

    for delta in &deltas {
        let applied = MaterialRepository::apply_delta(
            conn,
            tenant_id,
            &delta.material_id,
            delta.delta,
            guarded,
            now,
        )
        .await?;

        if applied {
            continue;
        }

        return match MaterialRepository::find(conn, tenant_id, &delta.material_id).await? {
            Some(material) if guarded => {
                warn!(
                    material_id = %material.id,
                    available = %material.stock_qty,
                    required = %(-delta.delta),
                    "Insufficient material stock"
                );
                Err(CoreError::InsufficientMaterial {
                    material: material.name,
                    available: material.stock_qty,
                    required: -delta.delta,
                }
                .into())
            }
            _ => Err(CoreError::MaterialNotFound(delta.material_id.clone()).into()),
        };
    }

    debug!(
        product_id = %product_id,
        materials = deltas.len(),
        direction = ?direction,
        "Applied recipe"
    );
    Ok(deltas)
}
