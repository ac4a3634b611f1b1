//! # Recipe Repository
//!
//! Recipe edges (`product_materials`) and their joined view,
//! [`RecipeComponent`], which is what sales, voids and availability read.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use warungin_core::{ConversionRate, MaterialQty, ProductMaterial, RecipeComponent};

const LINK_COLUMNS: &str = "id, product_id, material_id, quantity_used, used_unit, \
     conversion_rate, created_at, updated_at";

/// Components joined with their material, scoped to the tenant that owns
/// the material. Links keep insertion order.
const COMPONENT_SELECT: &str = r#"
    SELECT pm.material_id,
           m.name             AS material_name,
           m.unit             AS material_unit,
           m.stock_qty,
           m.unit_price_cents,
           pm.quantity_used,
           pm.used_unit,
           pm.conversion_rate
      FROM product_materials pm
      JOIN raw_materials m ON m.id = pm.material_id
"#;

const ALL_COMPONENTS: &str = r#"
    SELECT pm.product_id,
           pm.material_id,
           m.name             AS material_name,
           m.unit             AS material_unit,
           m.stock_qty,
           m.unit_price_cents,
           pm.quantity_used,
           pm.used_unit,
           pm.conversion_rate
      FROM product_materials pm
      JOIN raw_materials m ON m.id = pm.material_id
     WHERE m.tenant_id = ?
     ORDER BY pm.product_id, pm.rowid
"#;

/// A component together with the product it belongs to.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductComponent {
    pub product_id: String,
    #[sqlx(flatten)]
    pub component: RecipeComponent,
}

#[derive(Debug, Clone)]
pub struct RecipeRepository {
    pool: SqlitePool,
}

impl RecipeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RecipeRepository { pool }
    }

    /// Recipe of one product, in link order.
    pub async fn components(
        &self,
        tenant_id: &str,
        product_id: &str,
    ) -> DbResult<Vec<RecipeComponent>> {
        let mut conn = self.pool.acquire().await?;
        Self::components_in(&mut conn, tenant_id, product_id).await
    }

    /// Every recipe component of a tenant, for whole-catalog views.
    pub async fn all_components(&self, tenant_id: &str) -> DbResult<Vec<ProductComponent>> {
        let rows = sqlx::query_as::<_, ProductComponent>(ALL_COMPONENTS)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Loaded tenant recipe components");
        Ok(rows)
    }

    /// Raw links of one product, scoped to the tenant that owns the product.
    pub async fn links(&self, tenant_id: &str, product_id: &str) -> DbResult<Vec<ProductMaterial>> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM product_materials \
              WHERE product_id = ?1 \
                AND EXISTS (SELECT 1 FROM products p WHERE p.id = ?1 AND p.tenant_id = ?2) \
              ORDER BY rowid"
        );
        let links = sqlx::query_as::<_, ProductMaterial>(&sql)
            .bind(product_id)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(links)
    }

    // =========================================================================
    // Connection-scoped operations
    // =========================================================================

    pub async fn components_in(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        product_id: &str,
    ) -> DbResult<Vec<RecipeComponent>> {
        let sql = format!(
            "{COMPONENT_SELECT} WHERE pm.product_id = ? AND m.tenant_id = ? ORDER BY pm.rowid"
        );
        let components = sqlx::query_as::<_, RecipeComponent>(&sql)
            .bind(product_id)
            .bind(tenant_id)
            .fetch_all(&mut *conn)
            .await?;

        debug!(product_id = %product_id, count = components.len(), "Loaded recipe");
        Ok(components)
    }

    pub async fn find_link(
        conn: &mut SqliteConnection,
        product_id: &str,
        material_id: &str,
    ) -> DbResult<Option<ProductMaterial>> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM product_materials WHERE product_id = ? AND material_id = ?"
        );
        let link = sqlx::query_as::<_, ProductMaterial>(&sql)
            .bind(product_id)
            .bind(material_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(link)
    }

    /// Creates the edge or replaces its quantity, unit and rate.
    pub async fn upsert_link(
        conn: &mut SqliteConnection,
        product_id: &str,
        material_id: &str,
        quantity_used: MaterialQty,
        used_unit: &str,
        conversion_rate: ConversionRate,
        now: DateTime<Utc>,
    ) -> DbResult<ProductMaterial> {
        debug!(product_id = %product_id, material_id = %material_id, "Upserting recipe link");

        let sql = format!(
            r#"
            INSERT INTO product_materials (
                id, product_id, material_id, quantity_used, used_unit,
                conversion_rate, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            ON CONFLICT (product_id, material_id) DO UPDATE SET
                quantity_used   = excluded.quantity_used,
                used_unit       = excluded.used_unit,
                conversion_rate = excluded.conversion_rate,
                updated_at      = excluded.updated_at
            RETURNING {LINK_COLUMNS}
            "#
        );
        let link = sqlx::query_as::<_, ProductMaterial>(&sql)
            .bind(Uuid::new_v4().to_string())
            .bind(product_id)
            .bind(material_id)
            .bind(quantity_used)
            .bind(used_unit)
            .bind(conversion_rate)
            .bind(now)
            .fetch_one(&mut *conn)
            .await?;
        Ok(link)
    }

    pub async fn delete_link(
        conn: &mut SqliteConnection,
        product_id: &str,
        material_id: &str,
    ) -> DbResult<bool> {
        let result =
            sqlx::query("DELETE FROM product_materials WHERE product_id = ? AND material_id = ?")
                .bind(product_id)
                .bind(material_id)
                .execute(&mut *conn)
                .await?;
        Ok(result.rows_affected() == 1)
    }
}
