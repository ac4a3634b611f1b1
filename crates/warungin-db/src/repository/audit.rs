//! # Audit Repository
//!
//! Writes and reads the two append-only logs. Insert only; triggers reject
//! UPDATE and DELETE on both tables.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use warungin_core::audit::{ActivityLog, TransactionAuditLog};

const TRAIL_COLUMNS: &str = "id, tenant_id, transaction_id, action, reason, old_values, \
     new_values, user_id, ip_address, created_at";

const ACTIVITY_COLUMNS: &str = "id, tenant_id, user_id, action, entity_type, entity_id, \
     description, details, ip_address, created_at";

#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AuditRepository { pool }
    }

    /// Tenant activity, newest first.
    pub async fn activity(&self, tenant_id: &str, limit: u32) -> DbResult<Vec<ActivityLog>> {
        let sql = format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activity_logs WHERE tenant_id = ? \
             ORDER BY created_at DESC, rowid DESC LIMIT ?"
        );
        let rows = sqlx::query_as::<_, ActivityLog>(&sql)
            .bind(tenant_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Audit rows of one transaction, oldest first.
    pub async fn transaction_trail(
        &self,
        tenant_id: &str,
        transaction_id: &str,
    ) -> DbResult<Vec<TransactionAuditLog>> {
        let sql = format!(
            "SELECT {TRAIL_COLUMNS} FROM transaction_audit_logs \
             WHERE tenant_id = ? AND transaction_id = ? ORDER BY created_at, rowid"
        );
        let rows = sqlx::query_as::<_, TransactionAuditLog>(&sql)
            .bind(tenant_id)
            .bind(transaction_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn insert_transaction_log(
        conn: &mut SqliteConnection,
        log: &TransactionAuditLog,
    ) -> DbResult<()> {
        debug!(transaction_id = %log.transaction_id, action = ?log.action, "Recording transaction audit");

        sqlx::query(
            r#"
            INSERT INTO transaction_audit_logs (
                id, tenant_id, transaction_id, action, reason, old_values,
                new_values, user_id, ip_address, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&log.id)
        .bind(&log.tenant_id)
        .bind(&log.transaction_id)
        .bind(log.action)
        .bind(&log.reason)
        .bind(&log.old_values)
        .bind(&log.new_values)
        .bind(&log.user_id)
        .bind(&log.ip_address)
        .bind(log.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn insert_activity(conn: &mut SqliteConnection, log: &ActivityLog) -> DbResult<()> {
        debug!(
            entity_type = %log.entity_type,
            entity_id = %log.entity_id,
            action = ?log.action,
            "Recording activity"
        );

        sqlx::query(
            r#"
            INSERT INTO activity_logs (
                id, tenant_id, user_id, action, entity_type, entity_id,
                description, details, ip_address, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&log.id)
        .bind(&log.tenant_id)
        .bind(&log.user_id)
        .bind(log.action)
        .bind(&log.entity_type)
        .bind(&log.entity_id)
        .bind(&log.description)
        .bind(&log.details)
        .bind(&log.ip_address)
        .bind(log.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::testing;
    use chrono::{Duration, Utc};
    use uuid::Uuid;
    use warungin_core::audit::{ActivityAction, ActivityDetails};

    fn toggle(at: chrono::DateTime<Utc>, name: &str) -> ActivityLog {
        let details = ActivityDetails::Toggle {
            name: name.to_string(),
            is_active: false,
        };
        ActivityLog {
            id: Uuid::new_v4().to_string(),
            tenant_id: testing::TENANT.to_string(),
            user_id: None,
            action: ActivityAction::Toggle,
            entity_type: "product".to_string(),
            entity_id: Uuid::new_v4().to_string(),
            description: format!("Deactivated {name}"),
            details: serde_json::to_string(&details).unwrap(),
            ip_address: None,
            created_at: at,
        }
    }

    #[tokio::test]
    async fn test_activity_newest_first() {
        let db = testing::db().await;
        let now = Utc::now();
        let mut conn = db.pool().acquire().await.unwrap();
        AuditRepository::insert_activity(&mut conn, &toggle(now - Duration::minutes(1), "old"))
            .await
            .unwrap();
        AuditRepository::insert_activity(&mut conn, &toggle(now, "new"))
            .await
            .unwrap();
        drop(conn);

        let rows = db.audit().activity(testing::TENANT, 10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].description, "Deactivated new");
        assert!(matches!(
            rows[0].parsed_details().unwrap(),
            ActivityDetails::Toggle { is_active: false, .. }
        ));

        assert_eq!(db.audit().activity(testing::TENANT, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_activity_rows_cannot_change() {
        let db = testing::db().await;
        let row = toggle(Utc::now(), "x");
        let mut conn = db.pool().acquire().await.unwrap();
        AuditRepository::insert_activity(&mut conn, &row).await.unwrap();

        let update = sqlx::query("UPDATE activity_logs SET description = 'edited' WHERE id = ?")
            .bind(&row.id)
            .execute(&mut *conn)
            .await
            .unwrap_err();
        assert!(matches!(DbError::from(update), DbError::Rejected(_)));

        let delete = sqlx::query("DELETE FROM activity_logs WHERE id = ?")
            .bind(&row.id)
            .execute(&mut *conn)
            .await
            .unwrap_err();
        assert!(matches!(DbError::from(delete), DbError::Rejected(_)));
    }
}
