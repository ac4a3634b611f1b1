//! # Audit Trail Types
//!
//! Typed snapshots written to the two append-only logs.
//!
//! ## Logs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  transaction_audit_logs            activity_logs                        │
//! │  ─────────────────────             ─────────────                        │
//! │  one row per void/correction/      one row per create/update/delete/    │
//! │  refund of a transaction           toggle/void, tenant-wide             │
//! │                                                                         │
//! │  old_values: AuditSnapshot         details: ActivityDetails             │
//! │  new_values: AuditSnapshot                                              │
//! │                                                                         │
//! │  Stored as opaque JSON text. Rows are never updated or deleted          │
//! │  (enforced by triggers).                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A void writes `old_values` = full [`TransactionSnapshot`] and
//! `new_values` = `{"status":"voided"}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::quantity::{ConversionRate, MaterialQty};
use crate::types::{
    OrderDetail, PaymentMethod, Product, ProductMaterial, RawMaterial, TransactionStatus,
};

// =============================================================================
// Actions
// =============================================================================

/// Kind of change recorded against a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Void,
    Correction,
    Refund,
}

/// Kind of tenant-wide activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Create,
    Update,
    Delete,
    Toggle,
    Void,
}

// =============================================================================
// Transaction Snapshots
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemSnapshot {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
}

/// Full pre-change state of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionSnapshot {
    pub status: TransactionStatus,
    pub invoice_number: String,
    pub order_number: i64,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub items: Vec<ItemSnapshot>,
}

impl From<&OrderDetail> for TransactionSnapshot {
    fn from(order: &OrderDetail) -> Self {
        let tx = &order.transaction;
        TransactionSnapshot {
            status: tx.status,
            invoice_number: tx.invoice_number.clone(),
            order_number: tx.order_number,
            subtotal_cents: tx.subtotal_cents,
            discount_cents: tx.discount_cents,
            tax_cents: tx.tax_cents,
            total_cents: tx.total_cents,
            payment_method: tx.payment_method,
            items: order
                .items
                .iter()
                .map(|i| ItemSnapshot {
                    product_id: i.product_id.clone(),
                    product_name: i.product_name.clone(),
                    quantity: i.quantity,
                    unit_price_cents: i.unit_price_cents,
                    subtotal_cents: i.subtotal_cents,
                    tax_cents: i.tax_cents,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StatusSnapshot {
    pub status: TransactionStatus,
}

/// Either side of a transaction audit row.
///
/// Untagged so that a status-only snapshot serializes as exactly
/// `{"status":"voided"}`. `Transaction` is listed first: deserialization
/// tries it before falling back to the status-only shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(untagged)]
pub enum AuditSnapshot {
    Transaction(TransactionSnapshot),
    Status(StatusSnapshot),
}

impl AuditSnapshot {
    pub fn status(status: TransactionStatus) -> Self {
        AuditSnapshot::Status(StatusSnapshot { status })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

// =============================================================================
// Entity Snapshots
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductSnapshot {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub stock_qty: i64,
    pub use_material_stock: bool,
    pub is_active: bool,
}

impl From<&Product> for ProductSnapshot {
    fn from(p: &Product) -> Self {
        ProductSnapshot {
            id: p.id.clone(),
            sku: p.sku.clone(),
            name: p.name.clone(),
            stock_qty: p.stock_qty,
            use_material_stock: p.use_material_stock,
            is_active: p.is_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MaterialSnapshot {
    pub id: String,
    pub name: String,
    pub unit: String,
    pub stock_qty: MaterialQty,
}

impl From<&RawMaterial> for MaterialSnapshot {
    fn from(m: &RawMaterial) -> Self {
        MaterialSnapshot {
            id: m.id.clone(),
            name: m.name.clone(),
            unit: m.unit.clone(),
            stock_qty: m.stock_qty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RecipeLinkSnapshot {
    pub product_id: String,
    pub material_id: String,
    pub quantity_used: MaterialQty,
    pub used_unit: String,
    pub conversion_rate: ConversionRate,
}

impl From<&ProductMaterial> for RecipeLinkSnapshot {
    fn from(l: &ProductMaterial) -> Self {
        RecipeLinkSnapshot {
            product_id: l.product_id.clone(),
            material_id: l.material_id.clone(),
            quantity_used: l.quantity_used,
            used_unit: l.used_unit.clone(),
            conversion_rate: l.conversion_rate,
        }
    }
}

/// State of one logged entity, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum EntitySnapshot {
    Product(ProductSnapshot),
    Material(MaterialSnapshot),
    RecipeLink(RecipeLinkSnapshot),
    Transaction(TransactionSnapshot),
}

impl EntitySnapshot {
    pub fn entity_type(&self) -> &'static str {
        match self {
            EntitySnapshot::Product(_) => "product",
            EntitySnapshot::Material(_) => "material",
            EntitySnapshot::RecipeLink(_) => "recipe_link",
            EntitySnapshot::Transaction(_) => "transaction",
        }
    }
}

// =============================================================================
// Activity Details
// =============================================================================

/// Typed payload of an activity log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityDetails {
    Create {
        new: EntitySnapshot,
    },
    Update {
        old: EntitySnapshot,
        new: EntitySnapshot,
    },
    Delete {
        deleted: EntitySnapshot,
    },
    Toggle {
        name: String,
        is_active: bool,
    },
    Void {
        reason: String,
        snapshot: TransactionSnapshot,
    },
}

impl ActivityDetails {
    pub fn action(&self) -> ActivityAction {
        match self {
            ActivityDetails::Create { .. } => ActivityAction::Create,
            ActivityDetails::Update { .. } => ActivityAction::Update,
            ActivityDetails::Delete { .. } => ActivityAction::Delete,
            ActivityDetails::Toggle { .. } => ActivityAction::Toggle,
            ActivityDetails::Void { .. } => ActivityAction::Void,
        }
    }
}

// =============================================================================
// Log Rows
// =============================================================================

/// A row of `transaction_audit_logs`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransactionAuditLog {
    pub id: String,
    pub tenant_id: String,
    pub transaction_id: String,
    pub action: AuditAction,
    pub reason: String,
    /// JSON of an [`AuditSnapshot`].
    pub old_values: String,
    /// JSON of an [`AuditSnapshot`].
    pub new_values: String,
    pub user_id: String,
    pub ip_address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl TransactionAuditLog {
    pub fn old_snapshot(&self) -> serde_json::Result<AuditSnapshot> {
        AuditSnapshot::from_json(&self.old_values)
    }

    pub fn new_snapshot(&self) -> serde_json::Result<AuditSnapshot> {
        AuditSnapshot::from_json(&self.new_values)
    }
}

/// A row of `activity_logs`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ActivityLog {
    pub id: String,
    pub tenant_id: String,
    pub user_id: Option<String>,
    pub action: ActivityAction,
    pub entity_type: String,
    pub entity_id: String,
    pub description: String,
    /// JSON of [`ActivityDetails`].
    pub details: String,
    pub ip_address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    pub fn parsed_details(&self) -> serde_json::Result<ActivityDetails> {
        serde_json::from_str(&self.details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> TransactionSnapshot {
        TransactionSnapshot {
            status: TransactionStatus::Completed,
            invoice_number: "INV-20261019-000001".to_string(),
            order_number: 1,
            subtotal_cents: 3_000,
            discount_cents: 0,
            tax_cents: 0,
            total_cents: 3_000,
            payment_method: PaymentMethod::Cash,
            items: vec![ItemSnapshot {
                product_id: "p".to_string(),
                product_name: "Es Teh".to_string(),
                quantity: 3,
                unit_price_cents: 1_000,
                subtotal_cents: 3_000,
                tax_cents: 0,
            }],
        }
    }

    #[test]
    fn test_status_snapshot_is_exact() {
        let json = AuditSnapshot::status(TransactionStatus::Voided)
            .to_json()
            .unwrap();
        assert_eq!(json, r#"{"status":"voided"}"#);
    }

    #[test]
    fn test_untagged_snapshot_reads_back_its_shape() {
        let full = AuditSnapshot::Transaction(snapshot());
        let back = AuditSnapshot::from_json(&full.to_json().unwrap()).unwrap();
        assert_eq!(back, full);

        let status = AuditSnapshot::from_json(r#"{"status":"voided"}"#).unwrap();
        assert_eq!(status, AuditSnapshot::status(TransactionStatus::Voided));
    }

    #[test]
    fn test_activity_details_tagging() {
        let details = ActivityDetails::Toggle {
            name: "Es Teh".to_string(),
            is_active: false,
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["kind"], "toggle");
        assert_eq!(details.action(), ActivityAction::Toggle);

        let update = ActivityDetails::Update {
            old: EntitySnapshot::Transaction(snapshot()),
            new: EntitySnapshot::Transaction(snapshot()),
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["old"]["entity"], "transaction");
    }
}
