//! # Validation Module
//!
//! Request validation run before any unit of work opens a database
//! transaction.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: API layer (outside this workspace)                           │
//! │  └── Deserialization, auth                                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Cart shape (non-empty, ≤ MAX_CART_ITEMS)                          │
//! │  ├── Quantities, discount, tax override                                │
//! │  └── Ids and void reasons                                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK / UNIQUE / FOREIGN KEY constraints                          │
//! │  └── Guarded stock UPDATEs                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Failures here have no side effects.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::material::usage_per_unit;
use crate::quantity::{ConversionRate, MaterialQty};
use crate::types::CreateOrderRequest;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_REASON_LENGTH, MAX_RECIPE_USAGE_UNITS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an order line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a recipe link's quantity and conversion rate.
///
/// ## Rules
/// - `quantity_used` must be positive
/// - `quantity_used × rate` must not exceed MAX_RECIPE_USAGE_UNITS
pub fn validate_recipe_usage(
    quantity_used: MaterialQty,
    conversion_rate: ConversionRate,
) -> ValidationResult<()> {
    if !quantity_used.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "quantity_used".to_string(),
        });
    }

    match usage_per_unit(quantity_used, conversion_rate) {
        Some(usage) if usage <= MaterialQty::from_units(MAX_RECIPE_USAGE_UNITS) => Ok(()),
        _ => Err(ValidationError::OutOfRange {
            field: "quantity_used".to_string(),
            min: 0,
            max: MAX_RECIPE_USAGE_UNITS,
        }),
    }
}

/// Validates a money amount that may be zero but not negative.
pub fn validate_non_negative_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines in a cart.
pub fn validate_cart_size(lines: usize) -> ValidationResult<()> {
    if lines == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if lines > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Identifier and Text Validators
// =============================================================================

/// Validates a UUID string.
///
/// ## Example
/// ```rust
/// use warungin_core::validation::validate_uuid;
///
/// assert!(validate_uuid("product_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("product_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

/// Validates a void reason and returns it trimmed.
pub fn validate_reason(reason: &str) -> ValidationResult<String> {
    let reason = reason.trim();

    if reason.is_empty() {
        return Err(ValidationError::Required {
            field: "reason".to_string(),
        });
    }

    if reason.chars().count() > MAX_REASON_LENGTH {
        return Err(ValidationError::TooLong {
            field: "reason".to_string(),
            max: MAX_REASON_LENGTH,
        });
    }

    Ok(reason.to_string())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a checkout request.
///
/// Line errors are attributed to their 1-based position.
pub fn validate_order_request(req: &CreateOrderRequest) -> CoreResult<()> {
    validate_cart_size(req.items.len())?;

    for (idx, line) in req.items.iter().enumerate() {
        validate_uuid("product_id", &line.product_id)
            .and_then(|_| validate_quantity(line.quantity))
            .map_err(|e| CoreError::from(e).at_line(idx + 1))?;
    }

    validate_non_negative_cents("discount", req.discount_cents)?;
    if let Some(tax) = req.tax_override_cents {
        validate_non_negative_cents("tax", tax)?;
    }
    if let Some(customer_id) = &req.customer_id {
        validate_uuid("customer_id", customer_id)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
