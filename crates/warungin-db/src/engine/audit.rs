//! Audit trail queries.

use warungin_core::audit::{ActivityLog, TransactionAuditLog};

use super::FulfillmentEngine;
use crate::error::EngineResult;

impl FulfillmentEngine {
    /// Tenant-wide activity, newest first.
    pub async fn activity_log(&self, tenant_id: &str, limit: u32) -> EngineResult<Vec<ActivityLog>> {
        Ok(self.db.audit().activity(tenant_id, limit).await?)
    }

    /// Every audit row of one transaction, oldest first.
    ///
    /// An unknown transaction yields an empty trail.
    pub async fn transaction_audit_trail(
        &self,
        tenant_id: &str,
        transaction_id: &str,
    ) -> EngineResult<Vec<TransactionAuditLog>> {
        Ok(self
            .db
            .audit()
            .transaction_trail(tenant_id, transaction_id)
            .await?)
    }
}
