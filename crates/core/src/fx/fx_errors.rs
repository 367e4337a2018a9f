use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FxError {
    #[error("No exchange rate for {currency} on or before {date}")]
    RateUnresolved { currency: String, date: NaiveDate },

    #[error("Invalid exchange rate: {0}")]
    InvalidRate(String),

    #[error("Rate source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Rate cache error: {0}")]
    CacheError(String),
}
