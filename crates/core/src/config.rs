//! Engine configuration shared by the settlement engine and the rate resolver.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::{
    DEFAULT_ALIAS_WINDOW_DAYS, DEFAULT_MAX_CONVERSION_ATTEMPTS, DEFAULT_REPORTING_CURRENCY,
    DISPLAY_DECIMAL_PRECISION, QUANTITY_EPSILON,
};
use crate::errors::{Error, Result};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Currency every realized cost and proceed is expressed in (e.g., "USD", "CZK").
    pub reporting_currency: String,
    pub max_conversion_attempts: u32,
    pub quantity_epsilon: Decimal,
    pub alias_window_days: i64,
    pub display_precision: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            reporting_currency: DEFAULT_REPORTING_CURRENCY.to_string(),
            max_conversion_attempts: DEFAULT_MAX_CONVERSION_ATTEMPTS,
            quantity_epsilon: Decimal::from_str(QUANTITY_EPSILON)
                .unwrap_or_else(|_| Decimal::new(1, 6)),
            alias_window_days: DEFAULT_ALIAS_WINDOW_DAYS,
            display_precision: DISPLAY_DECIMAL_PRECISION,
        }
    }
}

impl EngineConfig {
    pub fn with_reporting_currency(mut self, currency: &str) -> Self {
        self.reporting_currency = currency.trim().to_uppercase();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.reporting_currency.trim().is_empty() {
            return Err(Error::Config("reporting currency must not be empty".to_string()));
        }
        if self.max_conversion_attempts == 0 {
            return Err(Error::Config(
                "max conversion attempts must be at least 1".to_string(),
            ));
        }
        if !self.quantity_epsilon.is_sign_positive() || self.quantity_epsilon.is_zero() {
            return Err(Error::Config(format!(
                "quantity epsilon must be positive, got {}",
                self.quantity_epsilon
            )));
        }
        if self.alias_window_days < 0 {
            return Err(Error::Config(format!(
                "alias window must not be negative, got {} days",
                self.alias_window_days
            )));
        }
        Ok(())
    }
}
