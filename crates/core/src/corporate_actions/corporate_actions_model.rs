//! Corporate action domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::operations::RawDecimal;

/// One corporate action record from a broker statement.
///
/// A conversion arrives as two nodes sharing `action_id`: a debit of the old
/// instrument (negative quantity) and a credit of the new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionNode {
    pub action_id: String,
    #[serde(rename = "type")]
    pub action_type: String,
    pub asset_class: String,
    pub instrument_id: String,
    pub quantity: RawDecimal,
    pub date: String,
    #[serde(default)]
    pub comment: String,
}

/// Corporate action nodes extracted from one statement file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDataset {
    pub source_id: String,
    #[serde(default)]
    pub actions: Vec<ActionNode>,
}

/// A validated conversion of one instrument's holdings into another's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionEvent {
    pub action_id: String,
    pub old_instrument_id: String,
    pub new_instrument_id: String,
    /// Nominal quantity debited from the old instrument.
    pub removed_quantity: Decimal,
    /// Quantity of the new instrument credited in exchange.
    pub credited_quantity: Decimal,
    pub effective_date: DateTime<Utc>,
    pub comment: String,
}

/// Result of validating a credit node.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionOutcome {
    Applicable(ConversionEvent),
    /// Not a security conversion into this node's instrument.
    NotRelevant,
    /// Looks like a conversion but cannot be trusted. Never applied.
    ParseError(String),
}

impl ConversionOutcome {
    pub fn event(&self) -> Option<&ConversionEvent> {
        match self {
            ConversionOutcome::Applicable(event) => Some(event),
            _ => None,
        }
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(self, ConversionOutcome::ParseError(_))
    }
}
