//! # Transaction Repository
//!
//! Sale headers (`transactions`) and their lines (`transaction_items`).
//!
//! ## Transaction Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Transaction Lifecycle                                │
//! │                                                                         │
//! │  insert() + insert_item() × n         (one unit of work, with stock)   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────┐   mark_voided()    ┌─────────────┐                    │
//! │  │  completed  │ ─────────────────► │   voided    │  terminal          │
//! │  └─────────────┘  WHERE status =    └─────────────┘                    │
//! │                   'completed'                                           │
//! │                                                                         │
//! │  Items are append-only: UPDATE/DELETE are rejected by triggers.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use warungin_core::{OrderDetail, Transaction, TransactionItem};

const COLUMNS: &str = "id, tenant_id, invoice_number, order_number, business_day, user_id, \
     customer_id, subtotal_cents, discount_cents, tax_cents, total_cents, status, \
     payment_method, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, transaction_id, line_no, product_id, product_name, quantity, \
     unit_price_cents, subtotal_cents, tax_cents, created_at";

/// Repository for sale operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    pub async fn get(&self, tenant_id: &str, id: &str) -> DbResult<Option<Transaction>> {
        let mut conn = self.pool.acquire().await?;
        Self::find_in(&mut conn, tenant_id, id).await
    }

    pub async fn items(&self, transaction_id: &str) -> DbResult<Vec<TransactionItem>> {
        let mut conn = self.pool.acquire().await?;
        Self::items_in(&mut conn, transaction_id).await
    }

    /// Header plus items, or `None` when the tenant has no such sale.
    pub async fn get_detail(&self, tenant_id: &str, id: &str) -> DbResult<Option<OrderDetail>> {
        let mut conn = self.pool.acquire().await?;
        Self::detail_in(&mut conn, tenant_id, id).await
    }

    /// Most recent sales first.
    pub async fn list(&self, tenant_id: &str, limit: u32) -> DbResult<Vec<Transaction>> {
        debug!(tenant_id = %tenant_id, limit, "Listing transactions");

        let sql = format!(
            "SELECT {COLUMNS} FROM transactions WHERE tenant_id = ? \
             ORDER BY created_at DESC, rowid DESC LIMIT ?"
        );
        let transactions = sqlx::query_as::<_, Transaction>(&sql)
            .bind(tenant_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(transactions)
    }

    // =========================================================================
    // Connection-scoped operations
    // =========================================================================

    pub async fn find_in(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        id: &str,
    ) -> DbResult<Option<Transaction>> {
        let sql = format!("SELECT {COLUMNS} FROM transactions WHERE id = ? AND tenant_id = ?");
        let transaction = sqlx::query_as::<_, Transaction>(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(transaction)
    }

    pub async fn items_in(
        conn: &mut SqliteConnection,
        transaction_id: &str,
    ) -> DbResult<Vec<TransactionItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM transaction_items WHERE transaction_id = ? ORDER BY line_no"
        );
        let items = sqlx::query_as::<_, TransactionItem>(&sql)
            .bind(transaction_id)
            .fetch_all(&mut *conn)
            .await?;
        Ok(items)
    }

    pub async fn detail_in(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        id: &str,
    ) -> DbResult<Option<OrderDetail>> {
        let Some(transaction) = Self::find_in(conn, tenant_id, id).await? else {
            return Ok(None);
        };
        let items = Self::items_in(conn, &transaction.id).await?;
        Ok(Some(OrderDetail { transaction, items }))
    }

    pub async fn insert(conn: &mut SqliteConnection, tx: &Transaction) -> DbResult<()> {
        debug!(invoice = %tx.invoice_number, order_number = tx.order_number, "Inserting transaction");

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, tenant_id, invoice_number, order_number, business_day, user_id,
                customer_id, subtotal_cents, discount_cents, tax_cents, total_cents,
                status, payment_method, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&tx.id)
        .bind(&tx.tenant_id)
        .bind(&tx.invoice_number)
        .bind(tx.order_number)
        .bind(&tx.business_day)
        .bind(&tx.user_id)
        .bind(&tx.customer_id)
        .bind(tx.subtotal_cents)
        .bind(tx.discount_cents)
        .bind(tx.tax_cents)
        .bind(tx.total_cents)
        .bind(tx.status)
        .bind(tx.payment_method)
        .bind(tx.created_at)
        .bind(tx.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn insert_item(conn: &mut SqliteConnection, item: &TransactionItem) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO transaction_items (
                id, transaction_id, line_no, product_id, product_name, quantity,
                unit_price_cents, subtotal_cents, tax_cents, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.id)
        .bind(&item.transaction_id)
        .bind(item.line_no)
        .bind(&item.product_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.subtotal_cents)
        .bind(item.tax_cents)
        .bind(item.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Flips `completed → voided`. Returns false when no completed sale
    /// with this id exists for the tenant.
    pub async fn mark_voided(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
               SET status = 'voided', updated_at = ?
             WHERE id = ? AND tenant_id = ? AND status = 'completed'
            "#,
        )
        .bind(now)
        .bind(id)
        .bind(tenant_id)
        .execute(&mut *conn)
        .await?;

        debug!(transaction_id = %id, flipped = result.rows_affected(), "Marking transaction voided");
        Ok(result.rows_affected() == 1)
    }
}
