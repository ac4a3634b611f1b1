//! # warungin-core: Pure Business Logic for the Fulfillment Engine
//!
//! Everything the order processor and the void engine *decide* lives here;
//! everything they *store* lives in `warungin-db`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Warungin Fulfillment Engine                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          API layer (HTTP handlers, auth) - external             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │      warungin-db: FulfillmentEngine (units of work, SQLite)     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ pure calls                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ warungin-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  pricing      availability   material     void_policy   audit   │   │
//! │  │  line totals  can_make       ±deltas      role→window   snapshots│  │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities (Product, RawMaterial, Transaction, ...)
//! - [`money`] - Integer money
//! - [`quantity`] - Fixed-point material quantities and conversion rates
//! - [`availability`] - Stock availability calculator
//! - [`material`] - Sign-parameterized material stock deltas
//! - [`pricing`] - Order line pricing and totals
//! - [`void_policy`] - Role × elapsed-time void authorization
//! - [`audit`] - Typed audit snapshots and log entries
//! - [`inventory`] - Inventory listing and cost breakdown types
//! - [`sequence`] - Business days and invoice numbers
//! - [`clock`] - Time source abstraction
//! - [`validation`] - Request validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use warungin_core::money::Money;
//! use warungin_core::types::TaxRate;
//!
//! let line = Money::from_cents(15_000).multiply_quantity(3);
//! let tax = line.calculate_tax(TaxRate::from_bps(1100)); // PPN 11%
//! assert_eq!(tax.cents(), 4_950);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod audit;
pub mod availability;
pub mod clock;
pub mod error;
pub mod inventory;
pub mod material;
pub mod money;
pub mod pricing;
pub mod quantity;
pub mod sequence;
pub mod types;
pub mod validation;
pub mod void_policy;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use quantity::{ConversionRate, MaterialQty};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single order.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity on a single order line.
///
/// Catches fat-fingered entries (1000 instead of 10) at the till.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum length of a void reason.
pub const MAX_REASON_LENGTH: usize = 500;

/// Maximum stock-unit usage of one recipe link per product unit.
///
/// Keeps a full order line (`MAX_ITEM_QUANTITY` units) within the stored
/// quantity range.
pub const MAX_RECIPE_USAGE_UNITS: i64 = 1_000_000;
