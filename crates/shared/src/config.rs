//! Application configuration management.

use serde::Deserialize;

use crate::types::Currency;

/// Maximum number of aging brackets accepted from configuration.
const MAX_AGING_BRACKETS: usize = 12;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Payment number sequence configuration.
    #[serde(default)]
    pub sequence: SequenceConfig,
    /// Aging report configuration.
    #[serde(default)]
    pub aging: AgingConfig,
    /// Report configuration.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Report configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Currency stamped on generated reports.
    #[serde(default = "default_currency")]
    pub currency: Currency,
}

fn default_currency() -> Currency {
    Currency::Idr
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
        }
    }
}

/// Payment number sequence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SequenceConfig {
    /// Prefix for payment numbers (e.g. "RCV" produces "RCV-2026-0001").
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Minimum digit width of the sequence part, zero-padded.
    #[serde(default = "default_pad_width")]
    pub pad_width: usize,
}

fn default_prefix() -> String {
    "RCV".to_string()
}

fn default_pad_width() -> usize {
    4
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            pad_width: default_pad_width(),
        }
    }
}

/// Aging report configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AgingConfig {
    /// Ascending day thresholds for overdue sub-buckets (e.g. [30, 60, 90]).
    #[serde(default = "default_brackets")]
    pub brackets: Vec<u32>,
}

fn default_brackets() -> Vec<u32> {
    vec![30, 60, 90]
}

impl Default for AgingConfig {
    fn default() -> Self {
        Self {
            brackets: default_brackets(),
        }
    }
}

impl AgingConfig {
    /// Returns the brackets normalized: sorted ascending, deduplicated,
    /// zero removed, truncated to the maximum bracket count.
    #[must_use]
    pub fn normalized_brackets(&self) -> Vec<u32> {
        let mut brackets: Vec<u32> = self.brackets.iter().copied().filter(|d| *d > 0).collect();
        brackets.sort_unstable();
        brackets.dedup();
        brackets.truncate(MAX_AGING_BRACKETS);
        brackets
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("KASIRA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
