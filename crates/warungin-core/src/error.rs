//! # Error Types
//!
//! Domain errors for warungin-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  warungin-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Malformed requests                             │
//! │                                                                         │
//! │  warungin-db errors (separate crate)                                   │
//! │  ├── DbError          - Store failures                                 │
//! │  └── EngineError      - CoreError | DbError + ErrorCode                │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → API layer           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every [`CoreError`] belongs to one [`ErrorKind`]; the API layer maps kinds
//! to status codes without matching on individual variants.

use thiserror::Error;

use crate::quantity::MaterialQty;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification of domain errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed request. Detected before any mutation.
    Validation,
    /// Entity absent or owned by another tenant.
    NotFound,
    /// Role or time gate failure. Detected before any mutation.
    Permission,
    /// State conflict: double void, not enough stock.
    Conflict,
}

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the fulfillment engine.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found for this tenant.
    ///
    /// ## When This Occurs
    /// - Product ID doesn't exist
    /// - Product belongs to another tenant
    #[error("Product {0} not found")]
    ProductNotFound(String),

    /// Raw material cannot be found for this tenant.
    #[error("Material {0} not found")]
    MaterialNotFound(String),

    /// Transaction cannot be found for this tenant.
    #[error("Transaction {0} not found")]
    TransactionNotFound(String),

    /// No recipe edge between the product and the material.
    #[error("Material {material_id} is not linked to product {product_id}")]
    RecipeLinkNotFound {
        product_id: String,
        material_id: String,
    },

    /// Not enough direct stock on a manual-stock product.
    ///
    /// ## User Workflow
    /// ```text
    /// Order line: 5 × Es Teh
    ///      │
    ///      ▼
    /// Guarded UPDATE: stock_qty (3) + (-5) >= 0 ?  ── no
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Es Teh", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Whole order rolls back
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// A deduction would take a raw material below zero.
    #[error("Insufficient {material}: available {available}, required {required}")]
    InsufficientMaterial {
        material: String,
        available: MaterialQty,
        required: MaterialQty,
    },

    /// A material quantity left the range stock can hold.
    #[error("Quantity of {material} is out of range")]
    QuantityOutOfRange { material: String },

    /// The transaction has already been voided.
    #[error("Transaction {0} is already voided")]
    AlreadyVoided(String),

    /// The acting role may not void a transaction of this age.
    #[error("{role} cannot void a transaction {elapsed_secs}s old: requires {approver} approval")]
    VoidNotPermitted {
        role: String,
        elapsed_secs: i64,
        approver: String,
    },

    /// Acting user is not in the directory for this tenant.
    #[error("User {0} is not known to this tenant")]
    UnknownActor(String),

    /// Acting user exists but is deactivated.
    #[error("User {0} is inactive")]
    InactiveActor(String),

    /// Flat discount larger than the order subtotal.
    #[error("Discount {discount} exceeds subtotal {subtotal}")]
    DiscountExceedsSubtotal { discount: i64, subtotal: i64 },

    /// Manual stock adjustment would go below zero.
    #[error("Stock for {product} cannot go below zero (current {current}, change {change})")]
    NegativeStockAdjustment {
        product: String,
        current: i64,
        change: i64,
    },

    /// Failure attributed to one order line (1-based).
    #[error("line {line}: {source}")]
    OrderLine {
        line: usize,
        #[source]
        source: Box<CoreError>,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Attributes this error to a 1-based order line.
    pub fn at_line(self, line: usize) -> Self {
        CoreError::OrderLine {
            line,
            source: Box::new(self),
        }
    }

    /// Classifies the error. Line-wrapped errors report their cause's kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ProductNotFound(_)
            | CoreError::MaterialNotFound(_)
            | CoreError::TransactionNotFound(_)
            | CoreError::RecipeLinkNotFound { .. } => ErrorKind::NotFound,
            CoreError::InsufficientStock { .. }
            | CoreError::InsufficientMaterial { .. }
            | CoreError::AlreadyVoided(_) => ErrorKind::Conflict,
            CoreError::VoidNotPermitted { .. }
            | CoreError::UnknownActor(_)
            | CoreError::InactiveActor(_) => ErrorKind::Permission,
            CoreError::DiscountExceedsSubtotal { .. }
            | CoreError::NegativeStockAdjustment { .. }
            | CoreError::QuantityOutOfRange { .. }
            | CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::OrderLine { source, .. } => source.kind(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised by [`crate::validation`] before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, unparseable quantity).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "Es Teh".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Es Teh: available 3, requested 5"
        );
    }

    #[test]
    fn test_order_line_prefix() {
        let err = CoreError::ProductNotFound("p-42".to_string()).at_line(2);
        assert_eq!(err.to_string(), "line 2: Product p-42 not found");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_void_denial_names_approver() {
        let err = CoreError::VoidNotPermitted {
            role: "cashier".to_string(),
            elapsed_secs: 301,
            approver: "manager".to_string(),
        };
        assert!(err.to_string().contains("requires manager approval"));
        assert_eq!(err.kind(), ErrorKind::Permission);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            CoreError::AlreadyVoided("t".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            CoreError::DiscountExceedsSubtotal {
                discount: 10,
                subtotal: 5
            }
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            CoreError::InactiveActor("u".into()).kind(),
            ErrorKind::Permission
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "items".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::Validation);
    }
}
