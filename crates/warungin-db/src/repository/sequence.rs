//! # Sequence Counters
//!
//! Atomic upsert-and-return counters. Each call is a single statement, so
//! two concurrent callers can never observe the same value.
//!
//! ```text
//! INSERT INTO order_sequences (tenant_id, business_day, last_value)
//!      VALUES (?, ?, 1)
//! ON CONFLICT DO UPDATE SET last_value = last_value + 1
//! RETURNING last_value
//! ```

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;

/// Next daily order number for the tenant, starting at 1.
pub async fn next_order_number(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    business_day: &str,
) -> DbResult<i64> {
    let value: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO order_sequences (tenant_id, business_day, last_value)
        VALUES (?, ?, 1)
        ON CONFLICT (tenant_id, business_day)
            DO UPDATE SET last_value = order_sequences.last_value + 1
        RETURNING last_value
        "#,
    )
    .bind(tenant_id)
    .bind(business_day)
    .fetch_one(&mut *conn)
    .await?;

    debug!(tenant_id = %tenant_id, business_day = %business_day, value, "Allocated order number");
    Ok(value)
}

/// Next invoice sequence for the day, shared by all tenants.
pub async fn next_invoice_seq(conn: &mut SqliteConnection, business_day: &str) -> DbResult<i64> {
    let value: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO invoice_sequences (business_day, last_value)
        VALUES (?, 1)
        ON CONFLICT (business_day)
            DO UPDATE SET last_value = invoice_sequences.last_value + 1
        RETURNING last_value
        "#,
    )
    .bind(business_day)
    .fetch_one(&mut *conn)
    .await?;

    debug!(business_day = %business_day, value, "Allocated invoice sequence");
    Ok(value)
}
