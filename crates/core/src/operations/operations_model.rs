//! Operation domain models.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};

/// Parses a decimal string, with support for scientific notation.
/// Returns `None` when neither form parses.
pub fn parse_decimal_tolerant(value_str: &str) -> Option<Decimal> {
    let trimmed = value_str.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// Parses the timestamp layouts broker exports use.
/// Date-only values resolve to midnight UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let s = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for layout in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d;%H%M%S",
        "%Y%m%d;%H%M%S",
        "%Y-%m-%d, %H:%M:%S",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    for layout in ["%Y-%m-%d", "%Y%m%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, layout) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));
        }
    }

    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
    InitialHolding,
    Buy,
    Sell,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        use crate::operations::operations_constants::*;
        match self {
            OperationKind::InitialHolding => OPERATION_KIND_INITIAL_HOLDING,
            OperationKind::Buy => OPERATION_KIND_BUY,
            OperationKind::Sell => OPERATION_KIND_SELL,
        }
    }

    pub fn is_acquisition(&self) -> bool {
        matches!(self, OperationKind::InitialHolding | OperationKind::Buy)
    }

    /// Tie-break rank among operations sharing a timestamp.
    fn rank(&self) -> u8 {
        match self {
            OperationKind::InitialHolding => 0,
            OperationKind::Buy => 1,
            OperationKind::Sell => 2,
        }
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        use crate::operations::operations_constants::*;
        match s.trim().to_uppercase().as_str() {
            OPERATION_KIND_INITIAL_HOLDING => Ok(OperationKind::InitialHolding),
            OPERATION_KIND_BUY => Ok(OperationKind::Buy),
            OPERATION_KIND_SELL => Ok(OperationKind::Sell),
            _ => Err(format!("Unknown operation kind: {}", s)),
        }
    }
}

/// One normalized trade record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Unique within a run. Used as the lot origin id and the sale result key.
    pub id: String,
    pub kind: OperationKind,
    pub instrument_id: String,
    pub timestamp: DateTime<Utc>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub commission: Decimal,
    /// Trade currency (e.g., "USD", "EUR").
    pub currency: String,
    /// Currency the commission was charged in, when it differs from the trade currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_currency: Option<String>,
    /// Reporting-currency value of one unit of `currency`, when the statement already provides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<Decimal>,
    /// Statement the record came from. Display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

impl Operation {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: &str,
        kind: OperationKind,
        instrument_id: &str,
        timestamp: DateTime<Utc>,
        quantity: Decimal,
        unit_price: Decimal,
        commission: Decimal,
        currency: &str,
    ) -> Self {
        Operation {
            id: id.to_string(),
            kind,
            instrument_id: instrument_id.to_string(),
            timestamp,
            quantity,
            unit_price,
            commission,
            currency: currency.to_string(),
            commission_currency: None,
            exchange_rate: None,
            source_id: None,
        }
    }

    pub fn with_exchange_rate(mut self, rate: Decimal) -> Self {
        self.exchange_rate = Some(rate);
        self
    }

    pub fn with_commission_currency(mut self, currency: &str) -> Self {
        self.commission_currency = Some(currency.to_string());
        self
    }

    pub fn with_source(mut self, source_id: &str) -> Self {
        self.source_id = Some(source_id.to_string());
        self
    }

    pub fn trade_date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// Quantity times unit price, in the trade currency.
    pub fn gross_amount(&self) -> Decimal {
        self.quantity * self.unit_price
    }

    pub fn commission_currency(&self) -> &str {
        self.commission_currency.as_deref().unwrap_or(&self.currency)
    }
}

/// Orders operations by timestamp, then acquisitions before sales, then id.
/// The engine relies on the caller for a deterministic total order; this is that order.
pub fn sort_chronologically(operations: &mut [Operation]) {
    operations.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.kind.rank().cmp(&b.kind.rank()))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Checks the ordering the engine assumes. Returns the index of the first
/// operation that is earlier than its predecessor.
pub fn first_out_of_order(operations: &[Operation]) -> Option<usize> {
    operations
        .windows(2)
        .position(|pair| pair[1].timestamp < pair[0].timestamp)
        .map(|i| i + 1)
}

/// A monetary or quantity field as it arrives from an extractor: text or a JSON number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDecimal {
    Text(String),
    Number(serde_json::Number),
}

impl RawDecimal {
    pub fn parse(&self) -> Option<Decimal> {
        match self {
            RawDecimal::Text(s) => parse_decimal_tolerant(s),
            RawDecimal::Number(n) => parse_decimal_tolerant(&n.to_string()),
        }
    }

    pub fn display(&self) -> String {
        match self {
            RawDecimal::Text(s) => s.clone(),
            RawDecimal::Number(n) => n.to_string(),
        }
    }
}

/// An operation record before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOperation {
    #[serde(default)]
    pub id: Option<String>,
    pub kind: String,
    pub instrument_id: String,
    pub timestamp: String,
    #[serde(default)]
    pub quantity: Option<RawDecimal>,
    #[serde(default)]
    pub unit_price: Option<RawDecimal>,
    #[serde(default)]
    pub commission: Option<RawDecimal>,
    pub currency: String,
    #[serde(default)]
    pub commission_currency: Option<String>,
    #[serde(default)]
    pub exchange_rate: Option<RawDecimal>,
    #[serde(default)]
    pub source_id: Option<String>,
}

impl RawOperation {
    /// Validates the record into an [`Operation`].
    ///
    /// Records that cannot be settled (unknown kind, missing instrument, bad
    /// timestamp, non-numeric or non-positive quantity) are skipped. Non-numeric
    /// price or commission default to zero. Every problem is pushed to `diagnostics`.
    /// `position` is used to build an id when the record carries none.
    pub fn normalize(&self, position: usize, diagnostics: &mut Diagnostics) -> Option<Operation> {
        let id = self
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("op-{}", position + 1));

        let malformed = |message: String| {
            Diagnostic::error(DiagnosticKind::MalformedOperation, message).for_operation(&id)
        };

        let kind = match OperationKind::from_str(&self.kind) {
            Ok(kind) => kind,
            Err(e) => {
                diagnostics.push(malformed(format!("{}. Skipped.", e)));
                return None;
            }
        };

        let instrument_id = self.instrument_id.trim();
        if instrument_id.is_empty() {
            diagnostics.push(malformed("Missing instrument id. Skipped.".to_string()));
            return None;
        }

        let Some(timestamp) = parse_timestamp(&self.timestamp) else {
            diagnostics.push(
                malformed(format!("Invalid timestamp '{}'. Skipped.", self.timestamp))
                    .for_instrument(instrument_id),
            );
            return None;
        };

        let quantity = match self.quantity.as_ref().map(|q| (q, q.parse())) {
            Some((_, Some(quantity))) => quantity,
            Some((raw, None)) => {
                diagnostics.push(
                    malformed(format!("Non-numeric quantity '{}'. Skipped.", raw.display()))
                        .for_instrument(instrument_id),
                );
                return None;
            }
            None => {
                diagnostics.push(
                    malformed("Missing quantity. Skipped.".to_string())
                        .for_instrument(instrument_id),
                );
                return None;
            }
        };

        if !quantity.is_sign_positive() || quantity.is_zero() {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::MalformedOperation,
                    format!("Non-positive quantity {}. Skipped.", quantity),
                )
                .for_operation(&id)
                .for_instrument(instrument_id),
            );
            return None;
        }

        let mut monetary = |field: &str, raw: &Option<RawDecimal>| -> Decimal {
            match raw {
                None => Decimal::ZERO,
                Some(value) => match value.parse() {
                    Some(parsed) => parsed,
                    None => {
                        diagnostics.push(
                            malformed(format!(
                                "Non-numeric {} '{}'. Using zero.",
                                field,
                                value.display()
                            ))
                            .for_instrument(instrument_id),
                        );
                        Decimal::ZERO
                    }
                },
            }
        };

        let unit_price = monetary("unit price", &self.unit_price);
        // Brokers report commissions with either sign; the cost is its magnitude.
        let commission = monetary("commission", &self.commission).abs();
        let exchange_rate = match &self.exchange_rate {
            None => None,
            Some(raw) => match raw.parse() {
                Some(rate) if rate.is_sign_positive() && !rate.is_zero() => Some(rate),
                _ => {
                    diagnostics.push(
                        malformed(format!(
                            "Unusable exchange rate '{}'. Resolving from rate source instead.",
                            raw.display()
                        ))
                        .for_instrument(instrument_id),
                    );
                    None
                }
            },
        };

        let unit_price = if unit_price.is_sign_negative() {
            diagnostics.push(
                malformed(format!("Negative unit price {}. Using zero.", unit_price))
                    .for_instrument(instrument_id),
            );
            Decimal::ZERO
        } else {
            unit_price
        };

        Some(Operation {
            id,
            kind,
            instrument_id: instrument_id.to_string(),
            timestamp,
            quantity,
            unit_price,
            commission,
            currency: self.currency.trim().to_uppercase(),
            commission_currency: self
                .commission_currency
                .as_ref()
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty()),
            exchange_rate,
            source_id: self.source_id.clone(),
        })
    }
}
