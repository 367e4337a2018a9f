use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A rate as the upstream publishes it: `rate` units of the reporting
/// currency buy `amount` units of `currency` (e.g., 100 JPY = 16.243 CZK).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublishedRate {
    pub currency: String,
    pub date: NaiveDate,
    pub rate: Decimal,
    #[serde(default = "default_amount")]
    pub amount: Decimal,
}

fn default_amount() -> Decimal {
    Decimal::ONE
}

impl PublishedRate {
    pub fn new(currency: &str, date: NaiveDate, rate: Decimal) -> Self {
        PublishedRate {
            currency: currency.to_string(),
            date,
            rate,
            amount: Decimal::ONE,
        }
    }

    pub fn per_amount(mut self, amount: Decimal) -> Self {
        self.amount = amount;
        self
    }

    /// Reporting-currency value of a single unit. `None` for unusable publications.
    pub fn unit_rate(&self) -> Option<Decimal> {
        if self.amount.is_zero() || !self.rate.is_sign_positive() || self.rate.is_zero() {
            return None;
        }
        Some(self.rate / self.amount)
    }
}

/// Outcome of a successful rate lookup.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRate {
    #[serde(serialize_with = "serialize_decimal_6")]
    pub unit_rate: Decimal,
    /// Date of the publication the rate came from.
    pub rate_date: NaiveDate,
    /// True when the publication is dated exactly on the requested date.
    pub exact: bool,
}

impl ResolvedRate {
    pub fn identity(date: NaiveDate) -> Self {
        ResolvedRate {
            unit_rate: Decimal::ONE,
            rate_date: date,
            exact: true,
        }
    }
}

fn serialize_decimal_6<S>(decimal: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let rounded = decimal.round_dp(6);
    serializer.serialize_str(&rounded.to_string())
}
