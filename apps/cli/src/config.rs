use anyhow::{Context, Result};
use capgains_core::EngineConfig;

pub const ENV_REPORTING_CURRENCY: &str = "CAPGAINS_REPORTING_CURRENCY";
pub const ENV_MAX_CONVERSION_ATTEMPTS: &str = "CAPGAINS_MAX_CONVERSION_ATTEMPTS";
pub const ENV_ALIAS_WINDOW_DAYS: &str = "CAPGAINS_ALIAS_WINDOW_DAYS";
pub const ENV_LOG_FORMAT: &str = "CAPGAINS_LOG_FORMAT";

/// Engine settings given explicitly, by flag or environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub reporting_currency: Option<String>,
    pub max_conversion_attempts: Option<u32>,
    pub alias_window_days: Option<i64>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_conversion_attempts = get(ENV_MAX_CONVERSION_ATTEMPTS)
            .map(|v| {
                v.trim()
                    .parse::<u32>()
                    .with_context(|| format!("{} must be a positive integer, got '{}'", ENV_MAX_CONVERSION_ATTEMPTS, v))
            })
            .transpose()?;
        let alias_window_days = get(ENV_ALIAS_WINDOW_DAYS)
            .map(|v| {
                v.trim()
                    .parse::<i64>()
                    .with_context(|| format!("{} must be a number of days, got '{}'", ENV_ALIAS_WINDOW_DAYS, v))
            })
            .transpose()?;

        Ok(Settings {
            reporting_currency: get(ENV_REPORTING_CURRENCY),
            max_conversion_attempts,
            alias_window_days,
        })
    }

    /// Fields set in `overrides` win over `self`.
    pub fn overridden_by(self, overrides: Settings) -> Settings {
        Settings {
            reporting_currency: overrides.reporting_currency.or(self.reporting_currency),
            max_conversion_attempts: overrides
                .max_conversion_attempts
                .or(self.max_conversion_attempts),
            alias_window_days: overrides.alias_window_days.or(self.alias_window_days),
        }
    }

    /// Engine configuration for a run. The request's currency applies only
    /// when no flag or variable fixed one.
    pub fn engine_config(&self, request_currency: Option<&str>) -> Result<EngineConfig> {
        let mut config = EngineConfig::default();

        if let Some(currency) = self.reporting_currency.as_deref().or(request_currency) {
            config = config.with_reporting_currency(currency);
        }
        if let Some(attempts) = self.max_conversion_attempts {
            config.max_conversion_attempts = attempts;
        }
        if let Some(days) = self.alias_window_days {
            config.alias_window_days = days;
        }

        config.validate().context("Invalid engine configuration")?;
        Ok(config)
    }
}
