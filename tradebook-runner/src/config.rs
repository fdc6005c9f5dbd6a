//! Serializable metrics configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;
pub const DEFAULT_PRICE_TOLERANCE_PERCENT: f64 = 0.1;

/// Errors from loading or validating a [`MetricsConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("initial_capital must be finite and positive, got {0}")]
    InitialCapital(f64),
    #[error("price_tolerance_percent must be finite and non-negative, got {0}")]
    Tolerance(f64),
    #[error("current_price must be finite, got {0}")]
    CurrentPrice(f64),
}

/// Inputs to the metrics aggregator besides the trade actions themselves.
///
/// One tolerance governs both entry matching and TP/SL classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Seed of the equity curve and base of `totalPnLPercentage`.
    pub initial_capital: f64,
    /// Percent, e.g. 0.1 means 0.1%.
    pub price_tolerance_percent: f64,
    /// Mark price for positions that are still open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            price_tolerance_percent: DEFAULT_PRICE_TOLERANCE_PERCENT,
            current_price: None,
        }
    }
}

impl MetricsConfig {
    pub fn with_initial_capital(mut self, initial_capital: f64) -> Self {
        self.initial_capital = initial_capital;
        self
    }

    pub fn with_tolerance_percent(mut self, price_tolerance_percent: f64) -> Self {
        self.price_tolerance_percent = price_tolerance_percent;
        self
    }

    pub fn with_current_price(mut self, current_price: f64) -> Self {
        self.current_price = Some(current_price);
        self
    }

    /// Tolerance as a fraction (0.1% → 0.001).
    pub fn tolerance_fraction(&self) -> f64 {
        self.price_tolerance_percent / 100.0
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Reject values that would make every derived percentage meaningless.
    ///
    /// The aggregator itself never calls this; it accepts any input.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(ConfigError::InitialCapital(self.initial_capital));
        }
        if !self.price_tolerance_percent.is_finite() || self.price_tolerance_percent < 0.0 {
            return Err(ConfigError::Tolerance(self.price_tolerance_percent));
        }
        if let Some(price) = self.current_price {
            if !price.is_finite() {
                return Err(ConfigError::CurrentPrice(price));
            }
        }
        Ok(())
    }
}
