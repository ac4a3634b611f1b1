//! # Fulfillment Engine
//!
//! Every operation the API layer calls. Each mutating call is one sqlx
//! transaction; any error drops it and SQLite rolls the whole unit back.
//!
//! ## Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  create_order / void_order                              │
//! │                                                                         │
//! │  validate (no I/O)                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  pool.begin()                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  first statement is a WRITE ─────► takes SQLite's write lock;           │
//! │  (counter upsert / status flip)    other writers wait (busy_timeout)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  reads + guarded stock updates  (stock_qty + delta >= 0)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  inserts (transaction, items, audit rows)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  commit ─── or any Err ──► rollback, nothing visible                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine never takes a second pool connection while a unit of work is
//! open: in-memory databases run on a single connection.

mod audit;
mod catalog;
mod inventory;
mod order;
mod stock;
mod void;

pub use catalog::LinkMaterialRequest;

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

use warungin_core::audit::{ActivityDetails, ActivityLog};
use warungin_core::clock::{Clock, SystemClock};
use warungin_core::sequence;

use crate::config::{EngineConfig, EngineSettings};
use crate::error::EngineResult;
use crate::pool::Database;

/// Order fulfillment and inventory consistency engine.
///
/// Cheap to clone; clones share the pool, settings and clock.
#[derive(Debug, Clone)]
pub struct FulfillmentEngine {
    db: Database,
    settings: Arc<EngineSettings>,
    clock: Arc<dyn Clock>,
}

impl FulfillmentEngine {
    pub fn new(db: Database, settings: EngineSettings) -> Self {
        Self::with_clock(db, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(db: Database, settings: EngineSettings, clock: Arc<dyn Clock>) -> Self {
        FulfillmentEngine {
            db,
            settings: Arc::new(settings),
            clock,
        }
    }

    /// Opens the database described by `config` and builds an engine on it.
    pub async fn connect(config: EngineConfig) -> EngineResult<Self> {
        let db = Database::new(config.db).await?;
        Ok(Self::new(db, config.settings))
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn business_day(&self, at: DateTime<Utc>) -> NaiveDate {
        sequence::business_day(at, self.settings.business_offset)
    }
}

/// Who did something, where and when. Stamps activity rows.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ActivityContext<'a> {
    pub tenant_id: &'a str,
    pub user_id: Option<&'a str>,
    pub ip_address: Option<&'a str>,
    pub at: DateTime<Utc>,
}

impl ActivityContext<'_> {
    pub fn entry(
        &self,
        entity_type: &str,
        entity_id: &str,
        description: String,
        details: &ActivityDetails,
    ) -> EngineResult<ActivityLog> {
        Ok(ActivityLog {
            id: Uuid::new_v4().to_string(),
            tenant_id: self.tenant_id.to_string(),
            user_id: self.user_id.map(str::to_string),
            action: details.action(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            description,
            details: serde_json::to_string(details)?,
            ip_address: self.ip_address.map(str::to_string),
            created_at: self.at,
        })
    }
}
