//! # warungin-db: Storage and Fulfillment Engine
//!
//! SQLite persistence for the Warungin POS and the engine that turns an
//! order into stock movements, a transaction record and an audit trail.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Warungin Data Flow                               │
//! │                                                                         │
//! │  API handler (create order / void / inventory)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   warungin-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────────┐   ┌───────────────┐   ┌─────────────┐  │   │
//! │  │   │ FulfillmentEngine │──►│ Repositories  │──►│  Database   │  │   │
//! │  │   │   (engine/)       │   │ product       │   │  (pool.rs)  │  │   │
//! │  │   │ order / void      │   │ material      │   │ SqlitePool  │  │   │
//! │  │   │ inventory / audit │   │ recipe        │   │ WAL + busy  │  │   │
//! │  │   │ catalog           │   │ transaction   │   │ timeout     │  │   │
//! │  │   └─────────┬─────────┘   │ audit, user   │   └─────────────┘  │   │
//! │  │             │             └───────────────┘                     │   │
//! │  │             ▼                                                   │   │
//! │  │      warungin-core (pricing, recipe math, void policy)          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Storage and engine error types
//! - [`config`] - Environment-driven configuration
//! - [`repository`] - One repository per table family
//! - [`engine`] - The operations the API layer calls
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warungin_db::{EngineConfig, FulfillmentEngine};
//! use warungin_core::{CreateOrderRequest, OrderLineRequest};
//!
//! let engine = FulfillmentEngine::connect(EngineConfig::from_env()?).await?;
//!
//! let order = engine
//!     .create_order(tenant_id, cashier_id, CreateOrderRequest {
//!         items: vec![OrderLineRequest { product_id, quantity: 2 }],
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("{}", order.transaction.invoice_number);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, EngineConfig, EngineSettings};
pub use engine::{FulfillmentEngine, LinkMaterialRequest};
pub use error::{DbError, EngineError, EngineResult, ErrorCode};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{
    AuditRepository, MaterialRepository, ProductRepository, RecipeRepository,
    TransactionRepository, UserRepository,
};
