use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostics;
use crate::lots::{InstrumentHoldings, LotConsumption};
use crate::shorts::ShortEntry;

/// Coverage state of a sale.
///
/// `Pending` only exists while the sale is being settled. `FullyCoveredRetroactively`
/// is reached from `PartiallyCoveredOpen` or `OpenShort` when later purchases
/// cover the rest.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoverageStatus {
    Pending,
    FullyCoveredByPast,
    FullyCoveredByConversion,
    PartiallyCoveredOpen,
    OpenShort,
    FullyCoveredRetroactively,
}

impl CoverageStatus {
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            CoverageStatus::PartiallyCoveredOpen | CoverageStatus::OpenShort
        )
    }
}

/// One contribution to a sale's realized cost.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CostSource {
    /// Lot origin, or the purchase that covered the short.
    pub origin_id: String,
    pub acquired_at: DateTime<Utc>,
    pub quantity: Decimal,
    pub cost: Decimal,
    /// Set when a later purchase covered the sale.
    #[serde(default)]
    pub retroactive: bool,
}

impl From<LotConsumption> for CostSource {
    fn from(consumption: LotConsumption) -> Self {
        CostSource {
            origin_id: consumption.origin_id,
            acquired_at: consumption.acquisition_date,
            quantity: consumption.quantity,
            cost: consumption.cost,
            retroactive: false,
        }
    }
}

/// Settlement of one sale. Every amount is in the reporting currency.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaleResult {
    pub sale_id: String,
    pub instrument_id: String,
    pub sold_at: DateTime<Utc>,
    pub quantity: Decimal,
    /// `None` when the sale's exchange rate could not be resolved.
    pub proceeds: Option<Decimal>,
    /// Commission of the sale itself; always part of `realized_cost`.
    pub commission: Decimal,
    pub realized_cost: Decimal,
    /// `None` whenever `proceeds` is.
    pub profit: Option<Decimal>,
    pub uncovered_quantity: Decimal,
    pub status: CoverageStatus,
    pub rate_resolved: bool,
    pub lineage: Vec<CostSource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conversions_applied: Vec<String>,
}

impl SaleResult {
    pub fn pending(
        sale_id: &str,
        instrument_id: &str,
        sold_at: DateTime<Utc>,
        quantity: Decimal,
    ) -> Self {
        SaleResult {
            sale_id: sale_id.to_string(),
            instrument_id: instrument_id.to_string(),
            sold_at,
            quantity,
            proceeds: None,
            commission: Decimal::ZERO,
            realized_cost: Decimal::ZERO,
            profit: None,
            uncovered_quantity: quantity,
            status: CoverageStatus::Pending,
            rate_resolved: true,
            lineage: Vec::new(),
            conversions_applied: Vec::new(),
        }
    }

    pub fn set_proceeds(&mut self, proceeds: Option<Decimal>) {
        self.proceeds = proceeds;
        self.refresh_profit();
    }

    /// Adds cost and keeps `profit` in step.
    pub fn add_cost(&mut self, cost: Decimal) {
        self.realized_cost += cost;
        self.refresh_profit();
    }

    fn refresh_profit(&mut self) {
        self.profit = self.proceeds.map(|p| p - self.realized_cost);
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }
}

/// Everything one call to the settlement engine produced.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SettlementOutcome {
    pub sales: Vec<SaleResult>,
    pub diagnostics: Diagnostics,
    /// Open lots left at the end of the run.
    pub holdings: Vec<InstrumentHoldings>,
    /// Short entries still open at the end of the run.
    pub open_shorts: Vec<ShortEntry>,
}

impl SettlementOutcome {
    pub fn had_error(&self) -> bool {
        self.diagnostics.had_error()
    }

    pub fn sale(&self, sale_id: &str) -> Option<&SaleResult> {
        self.sales.iter().find(|s| s.sale_id == sale_id)
    }
}
