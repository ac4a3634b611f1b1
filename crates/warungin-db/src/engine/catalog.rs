//! # Catalog Maintenance
//!
//! Recipe links, stock adjustments and the active toggle. Every operation
//! records an activity row in the same unit of work.
//!
//! Each unit of work opens with a write (`touch`) on the row it is about to
//! change, so the old state it reads for the activity log cannot move
//! underneath it.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use warungin_core::audit::{
    ActivityDetails, EntitySnapshot, MaterialSnapshot, ProductSnapshot, RecipeLinkSnapshot,
};
use warungin_core::validation::{validate_recipe_usage, validate_uuid};
use warungin_core::{
    ConversionRate, CoreError, MaterialQty, Product, ProductMaterial, RawMaterial,
};

use super::{ActivityContext, FulfillmentEngine};
use crate::error::EngineResult;
use crate::repository::{
    AuditRepository, MaterialRepository, ProductRepository, RecipeRepository,
};

/// Request to add or replace a recipe edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkMaterialRequest {
    pub product_id: String,
    pub material_id: String,
    /// Per product unit, in `used_unit`.
    pub quantity_used: MaterialQty,
    #[serde(default)]
    pub used_unit: String,
    /// Defaults to 1 when absent or not positive.
    #[serde(default)]
    pub conversion_rate: Option<ConversionRate>,
}

impl FulfillmentEngine {
    /// Adds a material to a product's recipe, or updates the existing edge.
    pub async fn link_material(
        &self,
        tenant_id: &str,
        user_id: Option<&str>,
        request: LinkMaterialRequest,
    ) -> EngineResult<ProductMaterial> {
        validate_uuid("product_id", &request.product_id)?;
        validate_uuid("material_id", &request.material_id)?;
        let rate = request
            .conversion_rate
            .unwrap_or_default()
            .effective();
        validate_recipe_usage(request.quantity_used, rate)?;

        let now = self.now();
        let mut tx = self.db.pool().begin().await?;

        if !ProductRepository::touch(&mut *tx, tenant_id, &request.product_id, now).await? {
            return Err(CoreError::ProductNotFound(request.product_id).into());
        }
        let material = MaterialRepository::find(&mut *tx, tenant_id, &request.material_id)
            .await?
            .ok_or_else(|| CoreError::MaterialNotFound(request.material_id.clone()))?;

        let previous =
            RecipeRepository::find_link(&mut *tx, &request.product_id, &material.id).await?;
        let link = RecipeRepository::upsert_link(
            &mut *tx,
            &request.product_id,
            &material.id,
            request.quantity_used,
            &request.used_unit,
            rate,
            now,
        )
        .await?;

        let new = EntitySnapshot::RecipeLink(RecipeLinkSnapshot::from(&link));
        let (details, verb) = match previous {
            Some(old) => (
                ActivityDetails::Update {
                    old: EntitySnapshot::RecipeLink(RecipeLinkSnapshot::from(&old)),
                    new,
                },
                "Updated",
            ),
            None => (ActivityDetails::Create { new }, "Linked"),
        };
        let activity = context(tenant_id, user_id, now).entry(
            "recipe_link",
            &link.id,
            format!("{verb} {} in recipe", material.name),
            &details,
        )?;
        AuditRepository::insert_activity(&mut *tx, &activity).await?;

        tx.commit().await?;

        info!(product_id = %link.product_id, material_id = %link.material_id, "Recipe link saved");
        Ok(link)
    }

    /// Removes a material from a product's recipe.
    pub async fn unlink_material(
        &self,
        tenant_id: &str,
        user_id: Option<&str>,
        product_id: &str,
        material_id: &str,
    ) -> EngineResult<()> {
        let now = self.now();
        let mut tx = self.db.pool().begin().await?;

        if !ProductRepository::touch(&mut *tx, tenant_id, product_id, now).await? {
            return Err(CoreError::ProductNotFound(product_id.to_string()).into());
        }
        let link = RecipeRepository::find_link(&mut *tx, product_id, material_id)
            .await?
            .ok_or_else(|| CoreError::RecipeLinkNotFound {
                product_id: product_id.to_string(),
                material_id: material_id.to_string(),
            })?;
        RecipeRepository::delete_link(&mut *tx, product_id, material_id).await?;

        let activity = context(tenant_id, user_id, now).entry(
            "recipe_link",
            &link.id,
            "Removed material from recipe".to_string(),
            &ActivityDetails::Delete {
                deleted: EntitySnapshot::RecipeLink(RecipeLinkSnapshot::from(&link)),
            },
        )?;
        AuditRepository::insert_activity(&mut *tx, &activity).await?;

        tx.commit().await?;

        info!(product_id = %product_id, material_id = %material_id, "Recipe link removed");
        Ok(())
    }

    /// Adds `change` to a material's stock. The result is clamped at zero.
    pub async fn adjust_material_stock(
        &self,
        tenant_id: &str,
        user_id: Option<&str>,
        material_id: &str,
        change: MaterialQty,
    ) -> EngineResult<RawMaterial> {
        let now = self.now();
        let mut tx = self.db.pool().begin().await?;

        if !MaterialRepository::touch(&mut *tx, tenant_id, material_id, now).await? {
            return Err(CoreError::MaterialNotFound(material_id.to_string()).into());
        }
        let before = MaterialRepository::find(&mut *tx, tenant_id, material_id)
            .await?
            .ok_or_else(|| CoreError::MaterialNotFound(material_id.to_string()))?;

        let target = before
            .stock_qty
            .checked_add(change)
            .ok_or_else(|| CoreError::QuantityOutOfRange {
                material: before.name.clone(),
            })?
            .max(MaterialQty::zero());
        MaterialRepository::set_stock(&mut *tx, tenant_id, material_id, target, now).await?;
        let after = RawMaterial {
            stock_qty: target,
            updated_at: now,
            ..before.clone()
        };

        let activity = context(tenant_id, user_id, now).entry(
            "material",
            material_id,
            format!("Adjusted {} stock by {change} {}", after.name, after.unit),
            &ActivityDetails::Update {
                old: EntitySnapshot::Material(MaterialSnapshot::from(&before)),
                new: EntitySnapshot::Material(MaterialSnapshot::from(&after)),
            },
        )?;
        AuditRepository::insert_activity(&mut *tx, &activity).await?;

        tx.commit().await?;

        info!(material_id = %material_id, stock = %after.stock_qty, "Material stock adjusted");
        Ok(after)
    }

    /// Adds `change` to a product's direct stock. Refuses to go below zero.
    pub async fn adjust_product_stock(
        &self,
        tenant_id: &str,
        user_id: Option<&str>,
        product_id: &str,
        change: i64,
    ) -> EngineResult<Product> {
        let now = self.now();
        let mut tx = self.db.pool().begin().await?;

        if !ProductRepository::touch(&mut *tx, tenant_id, product_id, now).await? {
            return Err(CoreError::ProductNotFound(product_id.to_string()).into());
        }
        let before = ProductRepository::find(&mut *tx, tenant_id, product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        if !ProductRepository::apply_stock_delta(&mut *tx, tenant_id, product_id, change, true, now)
            .await?
        {
            warn!(product_id = %product_id, current = before.stock_qty, change, "Adjustment below zero");
            return Err(CoreError::NegativeStockAdjustment {
                product: before.name,
                current: before.stock_qty,
                change,
            }
            .into());
        }
        let after = Product {
            stock_qty: before.stock_qty + change,
            updated_at: now,
            ..before.clone()
        };

        let activity = context(tenant_id, user_id, now).entry(
            "product",
            product_id,
            format!("Adjusted {} stock by {change}", after.name),
            &ActivityDetails::Update {
                old: EntitySnapshot::Product(ProductSnapshot::from(&before)),
                new: EntitySnapshot::Product(ProductSnapshot::from(&after)),
            },
        )?;
        AuditRepository::insert_activity(&mut *tx, &activity).await?;

        tx.commit().await?;

        info!(product_id = %product_id, stock = after.stock_qty, "Product stock adjusted");
        Ok(after)
    }

    /// Activates or deactivates a product.
    pub async fn set_product_active(
        &self,
        tenant_id: &str,
        user_id: Option<&str>,
        product_id: &str,
        is_active: bool,
    ) -> EngineResult<Product> {
        let now = self.now();
        let mut tx = self.db.pool().begin().await?;

        if !ProductRepository::set_active(&mut *tx, tenant_id, product_id, is_active, now).await? {
            return Err(CoreError::ProductNotFound(product_id.to_string()).into());
        }
        let product = ProductRepository::find(&mut *tx, tenant_id, product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        let verb = if is_active { "Activated" } else { "Deactivated" };
        let activity = context(tenant_id, user_id, now).entry(
            "product",
            product_id,
            format!("{verb} {}", product.name),
            &ActivityDetails::Toggle {
                name: product.name.clone(),
                is_active,
            },
        )?;
        AuditRepository::insert_activity(&mut *tx, &activity).await?;

        tx.commit().await?;

        info!(product_id = %product_id, is_active, "Product toggled");
        Ok(product)
    }
}

fn context<'a>(
    tenant_id: &'a str,
    user_id: Option<&'a str>,
    at: chrono::DateTime<chrono::Utc>,
) -> ActivityContext<'a> {
    ActivityContext {
        tenant_id,
        user_id,
        ip_address: None,
        at,
    }
}
