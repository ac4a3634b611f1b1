//! # Raw Material Repository
//!
//! Material rows and their stock. Deductions can be guarded the same way
//! product stock is: `stock_qty + delta >= 0` in the WHERE clause.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use warungin_core::{MaterialQty, RawMaterial};

const COLUMNS: &str = "id, tenant_id, name, unit, stock_qty, min_stock_level, \
     unit_price_cents, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct MaterialRepository {
    pool: SqlitePool,
}

impl MaterialRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MaterialRepository { pool }
    }

    pub async fn get(&self, tenant_id: &str, id: &str) -> DbResult<Option<RawMaterial>> {
        let mut conn = self.pool.acquire().await?;
        Self::find(&mut conn, tenant_id, id).await
    }

    /// All of a tenant's materials ordered by name.
    pub async fn list(&self, tenant_id: &str) -> DbResult<Vec<RawMaterial>> {
        let sql = format!("SELECT {COLUMNS} FROM raw_materials WHERE tenant_id = ? ORDER BY name, id");
        let materials = sqlx::query_as::<_, RawMaterial>(&sql)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = materials.len(), "Listed materials");
        Ok(materials)
    }

    pub async fn insert(&self, material: &RawMaterial) -> DbResult<()> {
        debug!(name = %material.name, "Inserting material");

        sqlx::query(
            r#"
            INSERT INTO raw_materials (
                id, tenant_id, name, unit, stock_qty, min_stock_level,
                unit_price_cents, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&material.id)
        .bind(&material.tenant_id)
        .bind(&material.name)
        .bind(&material.unit)
        .bind(material.stock_qty)
        .bind(material.min_stock_level)
        .bind(material.unit_price_cents)
        .bind(material.created_at)
        .bind(material.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Connection-scoped operations
    // =========================================================================

    pub async fn find(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        id: &str,
    ) -> DbResult<Option<RawMaterial>> {
        let sql = format!("SELECT {COLUMNS} FROM raw_materials WHERE id = ? AND tenant_id = ?");
        let material = sqlx::query_as::<_, RawMaterial>(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(material)
    }

    pub async fn touch(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result =
            sqlx::query("UPDATE raw_materials SET updated_at = ? WHERE id = ? AND tenant_id = ?")
                .bind(now)
                .bind(id)
                .bind(tenant_id)
                .execute(&mut *conn)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Adds `delta` to the material's stock; returns whether a row changed.
    ///
    /// A guarded update leaves the row alone when the result would be
    /// negative.
    pub async fn apply_delta(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        id: &str,
        delta: MaterialQty,
        guarded: bool,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(material_id = %id, delta = %delta, guarded, "Applying material delta");

        let result = sqlx::query(
            r#"
            UPDATE raw_materials
               SET stock_qty = stock_qty + ?1, updated_at = ?2
             WHERE id = ?3 AND tenant_id = ?4
               AND (?5 = 0 OR stock_qty + ?1 >= 0)
            "#,
        )
        .bind(delta)
        .bind(now)
        .bind(id)
        .bind(tenant_id)
        .bind(guarded)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn set_stock(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        id: &str,
        stock: MaterialQty,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE raw_materials SET stock_qty = ?, updated_at = ? WHERE id = ? AND tenant_id = ?",
        )
        .bind(stock)
        .bind(now)
        .bind(id)
        .bind(tenant_id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
