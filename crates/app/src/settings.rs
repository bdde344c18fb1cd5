//! Handles settings for the application. Configuration is written in
//! `settings.toml`; every section is optional and falls back to the
//! defaults below.

use std::time::Duration;

use config::{Config, ConfigError, File};
use engine::{Money, WalletConfig};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    /// Log level filter (`error`, `warn`, `info`, `debug`, `trace`).
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Store {
    /// Base URL of the record store. Absent means the seeded in-memory
    /// demo store.
    pub url: Option<String>,
}

/// Optional overrides for the engine's business rules. Monetary values
/// are in major units, delays in milliseconds.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Wallet {
    pub fee_percentage: Option<f64>,
    pub min_transfer: Option<f64>,
    pub max_transfer: Option<f64>,
    pub min_deposit: Option<f64>,
    pub max_deposit: Option<f64>,
    pub items_per_page: Option<usize>,
    pub network_timeout_ms: Option<u64>,
    pub deposit_resolve_delay_ms: Option<u64>,
    pub transfer_resolve_delay_ms: Option<u64>,
    pub retry_resolve_delay_ms: Option<u64>,
    pub transfer_failure_probability: Option<f64>,
    pub retry_success_probability: Option<f64>,
}

impl Wallet {
    /// Applies the overrides on top of the engine defaults.
    pub fn into_config(self) -> WalletConfig {
        let mut config = WalletConfig::default();
        if let Some(pct) = self.fee_percentage {
            config.fee_percentage = pct;
        }
        if let Some(v) = self.min_transfer {
            config.min_transfer = Money::from_major(v);
        }
        if let Some(v) = self.max_transfer {
            config.max_transfer = Money::from_major(v);
        }
        if let Some(v) = self.min_deposit {
            config.min_deposit = Money::from_major(v);
        }
        if let Some(v) = self.max_deposit {
            config.max_deposit = Money::from_major(v);
        }
        if let Some(v) = self.items_per_page {
            config.items_per_page = v;
        }
        if let Some(ms) = self.network_timeout_ms {
            config.network_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.deposit_resolve_delay_ms {
            config.deposit_resolve_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.transfer_resolve_delay_ms {
            config.transfer_resolve_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.retry_resolve_delay_ms {
            config.retry_resolve_delay = Duration::from_millis(ms);
        }
        if let Some(p) = self.transfer_failure_probability {
            config.transfer_failure_probability = p;
        }
        if let Some(p) = self.retry_success_probability {
            config.retry_success_probability = p;
        }
        config
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub store: Store,
    pub wallet: Wallet,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(config::Environment::with_prefix("BATUA").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_apply_on_top_of_defaults() {
        let overrides = Wallet {
            fee_percentage: Some(1.5),
            transfer_resolve_delay_ms: Some(50),
            ..Default::default()
        };

        let config = overrides.into_config();
        assert_eq!(config.fee_percentage, 1.5);
        assert_eq!(config.transfer_resolve_delay, Duration::from_millis(50));
        // Untouched knobs keep the engine defaults.
        assert_eq!(config.items_per_page, 10);
        assert_eq!(config.max_transfer, Money::from_major(10_000.0));
    }
}
