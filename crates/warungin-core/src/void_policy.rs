//! # Void Authorization
//!
//! Role × elapsed-time capability table for voiding a completed sale.
//!
//! ## Default Table
//! ```text
//! ┌──────────────┬──────────────────────┐
//! │ Role         │ May void if age is   │
//! ├──────────────┼──────────────────────┤
//! │ cashier      │ ≤ 5 minutes          │
//! │ manager      │ ≤ 24 hours           │
//! │ owner        │ any                  │
//! │ anyone else  │ never                │
//! └──────────────┴──────────────────────┘
//! ```
//!
//! Tiers are ordered from lowest to highest authority. A denial names the
//! lowest tier whose window covers the transaction's age.

use chrono::{DateTime, Duration, Utc};

use crate::error::{CoreError, CoreResult};
use crate::types::Role;

/// How far back a tier may void.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoidWindow {
    /// Up to and including this age.
    Within(Duration),
    Unrestricted,
}

impl VoidWindow {
    pub fn covers(&self, elapsed: Duration) -> bool {
        match self {
            VoidWindow::Within(max) => elapsed <= *max,
            VoidWindow::Unrestricted => true,
        }
    }
}

/// One row of the capability table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoidTier {
    pub role: Role,
    pub window: VoidWindow,
}

/// The capability table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoidPolicy {
    tiers: Vec<VoidTier>,
}

impl Default for VoidPolicy {
    fn default() -> Self {
        VoidPolicy::with_windows(Duration::minutes(5), Duration::hours(24))
    }
}

impl VoidPolicy {
    /// Cashier and manager windows as given, owner unrestricted.
    pub fn with_windows(cashier: Duration, manager: Duration) -> Self {
        VoidPolicy::from_tiers(vec![
            VoidTier {
                role: Role::Cashier,
                window: VoidWindow::Within(cashier),
            },
            VoidTier {
                role: Role::Manager,
                window: VoidWindow::Within(manager),
            },
            VoidTier {
                role: Role::Owner,
                window: VoidWindow::Unrestricted,
            },
        ])
    }

    /// Builds a table from tiers ordered lowest authority first.
    pub fn from_tiers(tiers: Vec<VoidTier>) -> Self {
        VoidPolicy { tiers }
    }

    pub fn tiers(&self) -> &[VoidTier] {
        &self.tiers
    }

    /// The window granted to `role`, if it is in the table at all.
    pub fn window_for(&self, role: &Role) -> Option<VoidWindow> {
        self.tiers
            .iter()
            .find(|t| &t.role == role)
            .map(|t| t.window)
    }

    /// Lowest tier whose window covers `elapsed`.
    ///
    /// Falls back to the highest tier when no window is wide enough.
    pub fn approver_for(&self, elapsed: Duration) -> Role {
        self.tiers
            .iter()
            .find(|t| t.window.covers(elapsed))
            .or_else(|| self.tiers.last())
            .map(|t| t.role.clone())
            .unwrap_or(Role::Owner)
    }

    /// Checks whether `role` may void a transaction created at `created_at`.
    ///
    /// A `created_at` in the future counts as zero elapsed time.
    pub fn authorize(
        &self,
        role: &Role,
        created_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        let elapsed = (now - created_at).max(Duration::zero());
        match self.window_for(role) {
            Some(window) if window.covers(elapsed) => Ok(()),
            _ => Err(CoreError::VoidNotPermitted {
                role: role.to_string(),
                elapsed_secs: elapsed.num_seconds(),
                approver: self.approver_for(elapsed).to_string(),
            }),
        }
    }
}
