//! Engine configuration.
//!
//! Loaded from `WARUNGIN_*` environment variables with fallback to defaults.

use chrono::{Duration, FixedOffset, Offset, Utc};
use std::env;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use warungin_core::inventory::DEFAULT_LOW_STOCK_THRESHOLD;
use warungin_core::sequence::DEFAULT_UTC_OFFSET_MINUTES;
use warungin_core::void_policy::VoidPolicy;

use crate::pool::DbConfig;

/// Business rules the engine applies at runtime.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Offset used to compute business days.
    pub business_offset: FixedOffset,

    /// Let sales drive raw-material stock below zero.
    /// Default: false (deduction fails with InsufficientMaterial)
    pub allow_negative_material_stock: bool,

    /// Products with fewer sellable units are listed as low.
    pub low_stock_threshold: i64,

    pub void_policy: VoidPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            business_offset: offset_from_minutes(DEFAULT_UTC_OFFSET_MINUTES)
                .unwrap_or_else(|| Utc.fix()),
            allow_negative_material_stock: false,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            void_policy: VoidPolicy::default(),
        }
    }
}

/// Full configuration: storage plus business rules.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub db: DbConfig,
    pub settings: EngineSettings,
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `WARUNGIN_DATABASE_PATH` | `./warungin.db` |
    /// | `WARUNGIN_MAX_CONNECTIONS` | `5` |
    /// | `WARUNGIN_BUSY_TIMEOUT_MS` | `5000` |
    /// | `WARUNGIN_UTC_OFFSET_MINUTES` | `420` |
    /// | `WARUNGIN_ALLOW_NEGATIVE_MATERIAL_STOCK` | `false` |
    /// | `WARUNGIN_LOW_STOCK_THRESHOLD` | `10` |
    /// | `WARUNGIN_CASHIER_VOID_WINDOW_SECS` | `300` |
    /// | `WARUNGIN_MANAGER_VOID_WINDOW_SECS` | `86400` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_path =
            env::var("WARUNGIN_DATABASE_PATH").unwrap_or_else(|_| "./warungin.db".to_string());

        let max_connections: u32 = parse_var("WARUNGIN_MAX_CONNECTIONS", 5)?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "WARUNGIN_MAX_CONNECTIONS".to_string(),
            ));
        }
        let busy_timeout_ms: u64 = parse_var("WARUNGIN_BUSY_TIMEOUT_MS", 5_000)?;

        let offset_minutes: i32 =
            parse_var("WARUNGIN_UTC_OFFSET_MINUTES", DEFAULT_UTC_OFFSET_MINUTES)?;
        let business_offset = offset_from_minutes(offset_minutes)
            .ok_or_else(|| ConfigError::InvalidValue("WARUNGIN_UTC_OFFSET_MINUTES".to_string()))?;

        let cashier_secs: i64 = parse_var("WARUNGIN_CASHIER_VOID_WINDOW_SECS", 300)?;
        let manager_secs: i64 = parse_var("WARUNGIN_MANAGER_VOID_WINDOW_SECS", 86_400)?;
        if cashier_secs < 0 || manager_secs < 0 {
            return Err(ConfigError::InvalidValue(
                "WARUNGIN_*_VOID_WINDOW_SECS".to_string(),
            ));
        }

        Ok(EngineConfig {
            db: DbConfig::new(database_path)
                .max_connections(max_connections)
                .busy_timeout(StdDuration::from_millis(busy_timeout_ms)),
            settings: EngineSettings {
                business_offset,
                allow_negative_material_stock: parse_var(
                    "WARUNGIN_ALLOW_NEGATIVE_MATERIAL_STOCK",
                    false,
                )?,
                low_stock_threshold: parse_var(
                    "WARUNGIN_LOW_STOCK_THRESHOLD",
                    DEFAULT_LOW_STOCK_THRESHOLD,
                )?,
                void_policy: VoidPolicy::with_windows(
                    Duration::seconds(cashier_secs),
                    Duration::seconds(manager_secs),
                ),
            },
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(_) => Ok(default),
    }
}

fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = EngineSettings::default();
        assert_eq!(settings.business_offset.local_minus_utc(), 7 * 3600);
        assert!(!settings.allow_negative_material_stock);
        assert_eq!(settings.low_stock_threshold, 10);
    }

    #[test]
    fn test_parse_var_default_when_unset() {
        let v: u32 = parse_var("WARUNGIN_TEST_SURELY_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(v, 7);
    }

    #[test]
    fn test_offset_bounds() {
        assert!(offset_from_minutes(420).is_some());
        assert!(offset_from_minutes(-300).is_some());
        assert!(offset_from_minutes(24 * 60).is_none());
    }
}
