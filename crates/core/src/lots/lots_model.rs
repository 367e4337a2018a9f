use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// True when `quantity` is larger in magnitude than `epsilon`.
pub fn is_quantity_significant(quantity: &Decimal, epsilon: &Decimal) -> bool {
    quantity.abs() > *epsilon
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    /// Operation (or corporate action) that created the lot.
    pub origin_id: String,
    pub acquisition_date: DateTime<Utc>,
    pub quantity: Decimal,
    /// Remaining cost of the whole lot in the reporting currency, acquisition commission included.
    pub cost_basis: Decimal,
}

impl Lot {
    pub fn new(
        origin_id: &str,
        acquisition_date: DateTime<Utc>,
        quantity: Decimal,
        cost_basis: Decimal,
    ) -> Self {
        Lot {
            origin_id: origin_id.to_string(),
            acquisition_date,
            quantity,
            cost_basis,
        }
    }

    /// Creates a lot from a per-unit cost.
    pub fn at_unit_cost(
        origin_id: &str,
        acquisition_date: DateTime<Utc>,
        quantity: Decimal,
        unit_cost: Decimal,
    ) -> Self {
        Self::new(origin_id, acquisition_date, quantity, quantity * unit_cost)
    }

    pub fn unit_cost(&self) -> Decimal {
        if self.quantity.is_zero() {
            Decimal::ZERO
        } else {
            self.cost_basis / self.quantity
        }
    }
}

/// Part of a lot used to cover a sale.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LotConsumption {
    pub origin_id: String,
    pub acquisition_date: DateTime<Utc>,
    pub quantity: Decimal,
    pub cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConsumeResult {
    pub quantity: Decimal,
    pub cost: Decimal,
    pub lineage: Vec<LotConsumption>,
}

impl ConsumeResult {
    pub fn is_empty(&self) -> bool {
        self.lineage.is_empty()
    }
}

/// Everything removed from an instrument's queue in one go.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrainResult {
    pub quantity: Decimal,
    pub cost: Decimal,
    pub lots: Vec<Lot>,
}

/// Open lots of one instrument, for display.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentHoldings {
    pub instrument_id: String,
    pub quantity: Decimal,
    pub cost_basis: Decimal,
    pub lots: Vec<Lot>,
}
