//! Configuration management for the Stockflow backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with STOCKFLOW_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::MAX_WINDOW_MONTHS;

use crate::error::{AppError, AppResult};

/// Longest day span accepted for demand lookback and target cover
const MAX_PLANNING_DAYS: i64 = 3650;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Planning engine parameters
    pub planning: PlanningConfig,

    /// Log output configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlanningConfig {
    /// Months of history shown before the current month in PSI tables
    pub psi_past_months: u32,

    /// Months of projection shown after the current month in PSI tables
    pub psi_future_months: u32,

    /// Months averaged into the computed demand forecast
    pub forecast_window_months: usize,

    /// Days of cover ordered when a product has no EOQ or target days
    pub default_target_days: i64,

    /// Days of outbound history used to estimate average daily demand
    pub demand_lookback_days: i64,

    /// Seconds between replenishment scans
    pub scan_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("STOCKFLOW_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("planning.psi_past_months", 6)?
            .set_default("planning.psi_future_months", 6)?
            .set_default("planning.forecast_window_months", 3)?
            .set_default("planning.default_target_days", 30)?
            .set_default("planning.demand_lookback_days", 90)?
            .set_default("planning.scan_interval_secs", 3600)?
            .set_default("logging.format", "pretty")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (STOCKFLOW_ prefix)
            .add_source(
                Environment::with_prefix("STOCKFLOW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Reject values the planning engine cannot work with
    pub fn validate(&self) -> AppResult<()> {
        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::Configuration(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }
        self.planning.validate()
    }
}

impl PlanningConfig {
    pub fn validate(&self) -> AppResult<()> {
        if self.scan_interval_secs == 0 {
            return Err(invalid("scan_interval_secs", "must be at least 1"));
        }
        if self.psi_past_months > MAX_WINDOW_MONTHS || self.psi_future_months > MAX_WINDOW_MONTHS {
            return Err(invalid(
                "psi_past_months/psi_future_months",
                &format!("must not exceed {}", MAX_WINDOW_MONTHS),
            ));
        }
        if self.forecast_window_months == 0 {
            return Err(invalid("forecast_window_months", "must be at least 1"));
        }
        if !(0..=MAX_PLANNING_DAYS).contains(&self.default_target_days) {
            return Err(invalid(
                "default_target_days",
                &format!("must be between 0 and {}", MAX_PLANNING_DAYS),
            ));
        }
        if !(1..=MAX_PLANNING_DAYS).contains(&self.demand_lookback_days) {
            return Err(invalid(
                "demand_lookback_days",
                &format!("must be between 1 and {}", MAX_PLANNING_DAYS),
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> AppError {
    AppError::Configuration(format!("planning.{} {}", field, reason))
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            psi_past_months: 6,
            psi_future_months: 6,
            forecast_window_months: 3,
            default_target_days: 30,
            demand_lookback_days: 90,
            scan_interval_secs: 3600,
        }
    }
}
