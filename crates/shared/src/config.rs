//! Application configuration management.

use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::AppError;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Engine configuration.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Statement/installment reconciliation tolerances.
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,
    /// Recurring payment matching.
    #[serde(default)]
    pub recurring: RecurringConfig,
}

/// Engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// IANA timezone used for calendar bucketing when the caller gives none.
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_timezone: default_timezone(),
        }
    }
}

impl EngineConfig {
    /// Parses the configured timezone.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Configuration` for an unknown IANA name.
    pub fn timezone(&self) -> Result<Tz, AppError> {
        self.default_timezone.parse::<Tz>().map_err(|_| {
            AppError::Configuration(format!("unknown timezone: {}", self.default_timezone))
        })
    }
}

/// Tolerances used when matching a statement to an expected installment.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconciliationConfig {
    /// Maximum absolute difference between paid and expected amounts.
    #[serde(default = "default_amount_tolerance")]
    pub amount_tolerance: Decimal,
    /// Maximum distance in days between paid and due dates.
    #[serde(default = "default_date_tolerance_days")]
    pub date_tolerance_days: i64,
}

fn default_amount_tolerance() -> Decimal {
    Decimal::TEN
}

fn default_date_tolerance_days() -> i64 {
    3
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            amount_tolerance: default_amount_tolerance(),
            date_tolerance_days: default_date_tolerance_days(),
        }
    }
}

/// Recurring payment matching configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RecurringConfig {
    /// Days either side of a due date within which a payment counts as matching.
    #[serde(default = "default_match_window_days")]
    pub match_window_days: i64,
}

fn default_match_window_days() -> i64 {
    3
}

impl Default for RecurringConfig {
    fn default() -> Self {
        Self {
            match_window_days: default_match_window_days(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("LEDGERLINE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
