//! # Domain Types
//!
//! Entities and request DTOs of the fulfillment engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌─────────────────┐      │
//! │  │    Product      │◄──│ ProductMaterial  │──►│  RawMaterial    │      │
//! │  │  ─────────────  │   │  ──────────────  │   │  ─────────────  │      │
//! │  │  price_cents    │   │  quantity_used   │   │  stock_qty      │      │
//! │  │  stock_qty      │   │  conversion_rate │   │  unit_price     │      │
//! │  │  use_material_  │   └──────────────────┘   │  min_stock_level│      │
//! │  │    stock        │                          └─────────────────┘      │
//! │  └────────┬────────┘                                                    │
//! │           │ sold as                                                     │
//! │  ┌────────▼────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ TransactionItem │──►│  Transaction    │   │ Actor / Role    │       │
//! │  │  line_no        │   │  invoice_number │   │  cashier        │       │
//! │  │  quantity       │   │  order_number   │   │  manager        │       │
//! │  │  subtotal       │   │  status         │   │  owner          │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every entity is scoped by `tenant_id`; ids are UUID v4 strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::quantity::{ConversionRate, MaterialQty};

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so Indonesian PPN at 11% is 1100 bps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Product
// =============================================================================

/// A sellable product.
///
/// Two stock modes:
/// - manual (`use_material_stock = false`): `stock_qty` is the sellable
///   quantity and never goes negative
/// - material-driven: sellable quantity is derived from the recipe, see
///   [`crate::availability`]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub tenant_id: String,
    pub sku: String,
    pub name: String,
    /// Price in minor units.
    pub price_cents: i64,
    /// Cost in minor units. Zero means "not set".
    pub cost_cents: i64,
    /// Tax rate in basis points (1100 = 11%).
    pub tax_rate_bps: u32,
    /// Direct stock, whole units.
    pub stock_qty: i64,
    pub use_material_stock: bool,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    /// True when `stock_qty` is the authoritative, guarded stock.
    #[inline]
    pub fn is_manual_stock(&self) -> bool {
        !self.use_material_stock
    }
}

// =============================================================================
// Raw Material
// =============================================================================

/// A raw material consumed by recipes (flour, milk, cups...).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RawMaterial {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    /// Stock unit, e.g. "kg".
    pub unit: String,
    pub stock_qty: MaterialQty,
    pub min_stock_level: MaterialQty,
    /// Price of one stock unit in minor units.
    pub unit_price_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl RawMaterial {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }
}

// =============================================================================
// Recipe
// =============================================================================

/// Recipe edge: one product unit consumes `quantity_used` of a material.
///
/// At most one edge exists per (product, material) pair.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductMaterial {
    pub id: String,
    pub product_id: String,
    pub material_id: String,
    /// Quantity per product unit, in `used_unit`.
    pub quantity_used: MaterialQty,
    pub used_unit: String,
    /// Converts `used_unit` into the material's stock unit.
    pub conversion_rate: ConversionRate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A recipe edge joined with the material it points to.
///
/// This is what the availability calculator, the material subroutine and the
/// cost breakdown all read.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RecipeComponent {
    pub material_id: String,
    pub material_name: String,
    pub material_unit: String,
    /// Current material stock, in the material's unit.
    pub stock_qty: MaterialQty,
    pub unit_price_cents: i64,
    pub quantity_used: MaterialQty,
    pub used_unit: String,
    pub conversion_rate: ConversionRate,
}

// =============================================================================
// Transaction Status
// =============================================================================

/// Lifecycle of a sale: `completed → voided`, nothing else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[default]
    Completed,
    /// Terminal.
    Voided,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "completed",
            TransactionStatus::Voided => "voided",
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Qris,
    BankTransfer,
    EWallet,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Qris,
        PaymentMethod::BankTransfer,
        PaymentMethod::EWallet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Qris => "qris",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::EWallet => "e_wallet",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: PaymentMethod::ALL
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A committed sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    pub tenant_id: String,
    /// Globally unique, `INV-yyyymmdd-NNNNNN`.
    pub invoice_number: String,
    /// Per tenant, per business day, starting at 1.
    pub order_number: i64,
    /// `yyyy-mm-dd` in the configured business offset.
    pub business_day: String,
    /// Cashier who rang the sale.
    pub user_id: String,
    pub customer_id: Option<String>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub status: TransactionStatus,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn is_voided(&self) -> bool {
        self.status == TransactionStatus::Voided
    }
}

/// A line of a sale. Immutable once written.
///
/// Name and price are frozen at the time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransactionItem {
    pub id: String,
    pub transaction_id: String,
    /// 1-based position in the original request.
    pub line_no: i64,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// `unit_price × quantity`.
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A transaction with its items in line order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDetail {
    pub transaction: Transaction,
    pub items: Vec<TransactionItem>,
}

// =============================================================================
// Requests
// =============================================================================

/// One requested order line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLineRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// Checkout request from the till.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderLineRequest>,
    /// Flat discount in minor units.
    #[serde(default)]
    pub discount_cents: i64,
    /// Replaces the computed tax when present (zero included).
    #[serde(default)]
    pub tax_override_cents: Option<i64>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub customer_id: Option<String>,
}

/// Void request carrying the already-resolved actor.
#[derive(Debug, Clone)]
pub struct VoidRequest {
    pub transaction_id: String,
    pub reason: String,
    pub actor: Actor,
}

// =============================================================================
// Roles and Actors
// =============================================================================

/// Role of an acting user.
///
/// Unrecognised role strings are kept verbatim in `Other` so that a denial
/// can still name them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Cashier,
    Manager,
    Owner,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Cashier => "cashier",
            Role::Manager => "manager",
            Role::Owner => "owner",
            Role::Other(name) => name,
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "cashier" => Role::Cashier,
            "manager" => Role::Manager,
            "owner" => Role::Owner,
            _ => Role::Other(s.to_string()),
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        Role::from(s.as_str())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is performing an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
    pub ip_address: Option<String>,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Actor {
            user_id: user_id.into(),
            role,
            ip_address: None,
        }
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }
}

/// A user directory entry. Read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(1100);
        assert_eq!(rate.bps(), 1100);
        assert!(TaxRate::default().is_zero());
    }

    #[test]
    fn test_status_default_and_str() {
        assert_eq!(TransactionStatus::default(), TransactionStatus::Completed);
        assert_eq!(TransactionStatus::Voided.as_str(), "voided");
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!(
            "QRIS".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::Qris
        );
        assert_eq!(
            "bank_transfer".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::BankTransfer
        );
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_role_parse_keeps_unknown() {
        assert_eq!(Role::from("Manager"), Role::Manager);
        assert_eq!(Role::from("barista"), Role::Other("barista".to_string()));
        assert_eq!(Role::from("barista").to_string(), "barista");
    }

    #[test]
    fn test_role_serde_as_string() {
        let json = serde_json::to_string(&Role::Owner).unwrap();
        assert_eq!(json, "\"owner\"");
        let back: Role = serde_json::from_str("\"cashier\"").unwrap();
        assert_eq!(back, Role::Cashier);
    }

    #[test]
    fn test_create_order_request_defaults() {
        let req: CreateOrderRequest =
            serde_json::from_str(r#"{"items":[{"product_id":"p","quantity":2}]}"#).unwrap();
        assert_eq!(req.discount_cents, 0);
        assert_eq!(req.tax_override_cents, None);
        assert_eq!(req.payment_method, PaymentMethod::Cash);
    }
}
