//! Engine configuration — every tunable constant, loadable from TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Tradable symbol labels offered when no catalog is configured.
#[rustfmt::skip]
pub const DEFAULT_INSTRUMENTS: &[&str] = &[
    "BTC/USD OTC", "ETH/USD OTC", "EUR/USD OTC", "EUR/GBP OTC", "USD/CHF OTC", "EUR/JPY OTC",
    "GBP/USD OTC", "GBP/JPY OTC", "AUD/CAD OTC", "USD/ZAR OTC", "USD/SGD OTC", "USD/HKD OTC",
    "USD/INR OTC", "AUD/USD OTC", "USD/CAD OTC", "AUD/JPY OTC", "GBP/CAD OTC", "GBP/CHF OTC",
    "GBP/AUD OTC", "EUR/CAD OTC", "CHF/JPY OTC", "CAD/CHF OTC", "EUR/AUD OTC", "EUR/NZD OTC",
    "USD/NOK OTC", "USD/SEK OTC", "USD/TRY OTC", "USD/PLN OTC", "AUD/CHF OTC", "AUD/NZD OTC",
    "EUR/CHF OTC", "GBP/NZD OTC", "CAD/JPY OTC", "NZD/CAD OTC", "NZD/JPY OTC", "EUR/THB OTC",
    "USD/THB OTC", "JPY/THB OTC", "CHF/NOK OTC", "NOK/JPY OTC", "USD/BRL OTC", "USD/COP OTC",
    "PEN/USD OTC", "ONDO OTC", "SHIB/USD OTC", "SNAP INC OTC", "USD/MXN OTC", "RAYDIUM OTC",
    "SUI OTC", "HBAR OTC", "RENDER OTC", "GOLD", "AMAZON OTC", "GOOGLE OTC", "TESLA OTC",
    "META OTC", "BONK OTC", "PEPE OTC", "IOTA OTC",
];

/// Engine configuration.
///
/// Every field has a default, so a TOML file only needs the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Signals an unsubscribed user may request before being denied.
    pub free_signal_limit: u32,

    /// Number of most recent signals whose instruments are excluded from the next draw.
    pub non_repetition_window: usize,

    /// Minutes between "now" and the earliest execution slot.
    pub base_offset_minutes: i64,

    /// Subscription length used when a grant does not name one.
    pub default_subscription_days: i64,

    /// History entries retained per user (must cover the non-repetition window).
    pub history_retention: usize,

    /// Admin username, without the leading `@`.
    pub admin_contact: String,

    /// Path of the persisted user table.
    pub data_file: PathBuf,

    /// Full instrument catalog.
    pub instruments: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            free_signal_limit: 20,
            non_repetition_window: 6,
            base_offset_minutes: 3,
            default_subscription_days: 30,
            history_retention: 10,
            admin_contact: "admin".to_string(),
            data_file: PathBuf::from("users_data.json"),
            instruments: DEFAULT_INSTRUMENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Like [`EngineConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Reject configurations the engine cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instruments.is_empty() {
            return Err(ConfigError::Invalid("instrument catalog is empty".into()));
        }
        if self.instruments.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::Invalid("instrument labels must not be blank".into()));
        }
        if self.base_offset_minutes < 0 {
            return Err(ConfigError::Invalid(format!(
                "base_offset_minutes must be >= 0, got {}",
                self.base_offset_minutes
            )));
        }
        if self.default_subscription_days <= 0 {
            return Err(ConfigError::Invalid(format!(
                "default_subscription_days must be > 0, got {}",
                self.default_subscription_days
            )));
        }
        if self.history_retention < self.non_repetition_window {
            return Err(ConfigError::Invalid(format!(
                "history_retention ({}) must be at least non_repetition_window ({})",
                self.history_retention, self.non_repetition_window
            )));
        }
        Ok(())
    }

    /// Admin username with any leading `@` removed.
    pub fn admin_handle(&self) -> &str {
        self.admin_contact.trim_start_matches('@')
    }
}
