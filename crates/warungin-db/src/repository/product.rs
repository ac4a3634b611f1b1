//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Tenant-scoped lookups and listing
//! - Guarded stock updates
//! - Active/inactive toggle
//!
//! ## Guarded Stock Update
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How the stock guard works                            │
//! │                                                                         │
//! │  UPDATE products                                                       │
//! │     SET stock_qty = stock_qty + ?delta                                 │
//! │   WHERE id = ? AND tenant_id = ?                                       │
//! │     AND stock_qty + ?delta >= 0        ← only when guarded             │
//! │       │                                                                 │
//! │       ├── 1 row  → applied                                             │
//! │       └── 0 rows → product missing OR not enough stock                 │
//! │                    (caller re-reads to tell which)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use warungin_core::Product;

const COLUMNS: &str = "id, tenant_id, sku, name, price_cents, cost_cents, tax_rate_bps, \
     stock_qty, use_material_stock, is_active, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let product = repo.get(tenant_id, "uuid-here").await?;
///
/// // Inside a unit of work
/// ProductRepository::apply_stock_delta(&mut *tx, tenant_id, id, -3, true, now).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID within a tenant.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found or owned by another tenant
    pub async fn get(&self, tenant_id: &str, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        Self::find(&mut conn, tenant_id, id).await
    }

    /// Lists a tenant's products ordered by name.
    pub async fn list(&self, tenant_id: &str, include_inactive: bool) -> DbResult<Vec<Product>> {
        let mut conn = self.pool.acquire().await?;
        Self::list_in(&mut conn, tenant_id, include_inactive).await
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, tenant_id, sku, name, price_cents, cost_cents, tax_rate_bps,
                stock_qty, use_material_stock, is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.id)
        .bind(&product.tenant_id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.tax_rate_bps)
        .bind(product.stock_qty)
        .bind(product.use_material_stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts a tenant's products (for diagnostics).
    pub async fn count(&self, tenant_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE tenant_id = ?")
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Connection-scoped operations (usable inside a transaction)
    // =========================================================================

    pub async fn find(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        id: &str,
    ) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {COLUMNS} FROM products WHERE id = ? AND tenant_id = ?");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(product)
    }

    pub async fn list_in(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        include_inactive: bool,
    ) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM products \
             WHERE tenant_id = ? AND (is_active = 1 OR ?) \
             ORDER BY name, id"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(tenant_id)
            .bind(include_inactive)
            .fetch_all(&mut *conn)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Adds `delta` to the product's direct stock.
    ///
    /// With `guarded`, the update only applies when the result stays
    /// non-negative. Returns whether a row changed.
    pub async fn apply_stock_delta(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        id: &str,
        delta: i64,
        guarded: bool,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(product_id = %id, delta, guarded, "Applying product stock delta");

        let result = sqlx::query(
            r#"
            UPDATE products
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

    /// Bumps `updated_at`. Used as the opening write of a maintenance
    /// unit of work so it holds the write lock before reading.
    pub async fn touch(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result =
            sqlx::query("UPDATE products SET updated_at = ? WHERE id = ? AND tenant_id = ?")
                .bind(now)
                .bind(id)
                .bind(tenant_id)
                .execute(&mut *conn)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn set_active(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        id: &str,
        is_active: bool,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(product_id = %id, is_active, "Setting product active flag");

        let result = sqlx::query(
            "UPDATE products SET is_active = ?, updated_at = ? WHERE id = ? AND tenant_id = ?",
        )
        .bind(is_active)
        .bind(now)
        .bind(id)
        .bind(tenant_id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn test_guarded_delta_refuses_to_go_negative() {
        let db = testing::db().await;
        let product = testing::manual_product(&db, "ES-TEH", 1_000, 3).await;
        let now = Utc::now();

        let mut conn = db.pool().acquire().await.unwrap();
        let applied = ProductRepository::apply_stock_delta(
            &mut conn,
            testing::TENANT,
            &product.id,
            -5,
            true,
            now,
        )
        .await
        .unwrap();
        assert!(!applied);

        let applied = ProductRepository::apply_stock_delta(
            &mut conn,
            testing::TENANT,
            &product.id,
            -3,
            true,
            now,
        )
        .await
        .unwrap();
        assert!(applied);
        drop(conn);

        let stored = db.products().get(testing::TENANT, &product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock_qty, 0);
    }

    #[tokio::test]
    async fn test_unguarded_delta_may_go_negative() {
        let db = testing::db().await;
        let product = testing::manual_product(&db, "NASI", 1_000, 1).await;

        let mut conn = db.pool().acquire().await.unwrap();
        let applied = ProductRepository::apply_stock_delta(
            &mut conn,
            testing::TENANT,
            &product.id,
            -4,
            false,
            Utc::now(),
        )
        .await
        .unwrap();
        assert!(applied);
        drop(conn);

        let stored = db.products().get(testing::TENANT, &product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock_qty, -3);
    }

    #[tokio::test]
    async fn test_tenant_scoping() {
        let db = testing::db().await;
        let product = testing::manual_product(&db, "KOPI", 1_000, 1).await;

        assert!(db.products().get("other-tenant", &product.id).await.unwrap().is_none());
        assert_eq!(db.products().count(testing::TENANT).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_hides_inactive_unless_asked() {
        let db = testing::db().await;
        let product = testing::manual_product(&db, "SATE", 1_000, 1).await;

        let mut conn = db.pool().acquire().await.unwrap();
        ProductRepository::set_active(&mut conn, testing::TENANT, &product.id, false, Utc::now())
            .await
            .unwrap();
        drop(conn);

        assert!(db.products().list(testing::TENANT, false).await.unwrap().is_empty());
        assert_eq!(db.products().list(testing::TENANT, true).await.unwrap().len(), 1);
    }
}
