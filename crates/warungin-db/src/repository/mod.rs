//! # Repository Module
//!
//! Database repository implementations for the fulfillment engine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two ways into a repository                           │
//! │                                                                         │
//! │  Pool reads (own connection)        Unit-of-work steps (borrowed conn)  │
//! │  ───────────────────────────        ──────────────────────────────────  │
//! │  db.products().get(t, id)           let mut tx = pool.begin().await?;   │
//! │  db.transactions().list(t, 50)      ProductRepository::find(&mut *tx…)  │
//! │  db.audit().activity(t, 50)         MaterialRepository::apply_delta(…)  │
//! │                                     tx.commit().await?;                 │
//! │       │                                   │                             │
//! │       └───────────────┬───────────────────┘                             │
//! │                       ▼                                                 │
//! │                SQLite Database                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The connection-scoped functions take `&mut SqliteConnection`, so the
//! same code runs inside a transaction or on a plain pooled connection.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - products and guarded stock
//! - [`MaterialRepository`] - raw materials and guarded stock
//! - [`RecipeRepository`] - recipe edges and joined components
//! - [`TransactionRepository`] - sale headers and items
//! - [`AuditRepository`] - append-only audit and activity logs
//! - [`UserRepository`] - user directory
//! - [`sequence`] - order number and invoice counters

pub mod audit;
pub mod material;
pub mod product;
pub mod recipe;
pub mod sequence;
pub mod transaction;
pub mod user;

pub use audit::AuditRepository;
pub use material::MaterialRepository;
pub use product::ProductRepository;
pub use recipe::{ProductComponent, RecipeRepository};
pub use transaction::TransactionRepository;
pub use user::UserRepository;
