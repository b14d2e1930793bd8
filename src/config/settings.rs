//! User settings for Circle Wallet
//!
//! Defaults applied to newly created groups, the negative-balance policy, and
//! the log level.

use serde::{Deserialize, Serialize};

use super::paths::CirclePaths;
use crate::engine::BalancePolicy;
use crate::error::CircleError;
use crate::models::Money;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Symbol printed in front of amounts
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// ISO code stored on new groups
    #[serde(default = "default_currency_code")]
    pub currency_code: String,

    /// Threshold given to new groups; payments at or above it wait for approval
    #[serde(default = "default_threshold")]
    pub default_large_payment_threshold: Money,

    #[serde(default = "default_require_approval")]
    pub default_require_approval: bool,

    /// What a payment may do to a balance that would go below zero
    #[serde(default)]
    pub balance_policy: BalancePolicy,

    /// `tracing` filter directive; `RUST_LOG` wins when set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

fn default_currency_code() -> String {
    "INR".to_string()
}

fn default_threshold() -> Money {
    Money::from_major(50_000)
}

fn default_require_approval() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            currency_symbol: default_currency_symbol(),
            currency_code: default_currency_code(),
            default_large_payment_threshold: default_threshold(),
            default_require_approval: default_require_approval(),
            balance_policy: BalancePolicy::default(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or defaults if the file doesn't exist
    pub fn load_or_create(paths: &CirclePaths) -> Result<Self, CircleError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            // not persisted until the caller saves
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| CircleError::Io(format!("Failed to read settings file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| CircleError::Config(format!("Failed to parse settings file: {}", e)))
    }

    pub fn save(&self, paths: &CirclePaths) -> Result<(), CircleError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| CircleError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| CircleError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Format an amount with the configured symbol
    pub fn format_money(&self, amount: Money) -> String {
        amount.format_with_symbol(&self.currency_symbol)
    }

    /// Symbol for a group's currency code
    ///
    /// The configured symbol wins for the configured code; other codes use a
    /// well-known symbol, or the code itself followed by a space.
    pub fn symbol_for(&self, currency: &str) -> String {
        let code = currency.trim().to_uppercase();
        if code == self.currency_code {
            return self.currency_symbol.clone();
        }
        match code.as_str() {
            "INR" => "₹".to_string(),
            "USD" | "AUD" | "CAD" | "NZD" | "SGD" | "HKD" => "$".to_string(),
            "EUR" => "€".to_string(),
            "GBP" => "£".to_string(),
            "JPY" | "CNY" => "¥".to_string(),
            "THB" => "฿".to_string(),
            _ => format!("{} ", code),
        }
    }

    /// Apply a `key=value` pair from `circle config set`
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), CircleError> {
        match key {
            "currency_symbol" => self.currency_symbol = value.to_string(),
            "currency_code" => self.currency_code = value.to_uppercase(),
            "default_large_payment_threshold" => {
                let amount = Money::parse(value).map_err(|e| {
                    CircleError::Config(format!("Invalid threshold '{}': {}", value, e))
                })?;
                if amount.is_negative() {
                    return Err(CircleError::Config("Threshold cannot be negative".into()));
                }
                self.default_large_payment_threshold = amount;
            }
            "default_require_approval" => {
                self.default_require_approval = value.parse().map_err(|_| {
                    CircleError::Config(format!("Expected true or false, got '{}'", value))
                })?;
            }
            "balance_policy" => {
                self.balance_policy = BalancePolicy::parse(value).ok_or_else(|| {
                    CircleError::Config(format!(
                        "Unknown balance policy '{}' (use allow_negative or reject_negative)",
                        value
                    ))
                })?;
            }
            "log_level" => self.log_level = value.to_string(),
            other => {
                return Err(CircleError::Config(format!("Unknown setting '{}'", other)));
            }
        }
        Ok(())
    }
}
